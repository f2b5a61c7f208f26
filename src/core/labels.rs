//! PI and sprint label parsing.
//!
//! PI labels have the form `PI-<n>_<ART>`: the split is on the last
//! underscore, the prefix must be `PI-` followed by digits, and the suffix
//! is the ART name. Anything else is malformed; the owning feature is kept
//! but attributed to no ART.

use serde::{Deserialize, Serialize};

/// Parsed PI label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiTag {
    pub ordinal: u32,
    pub art: String,
}

/// Parse a `PI-<n>_<ART>` label. Returns None for malformed labels.
pub fn parse_pi_label(label: &str) -> Option<PiTag> {
    let (prefix, art) = label.rsplit_once('_')?;
    if art.is_empty() {
        return None;
    }
    let digits = prefix.strip_prefix("PI-")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let ordinal = digits.parse().ok()?;
    Some(PiTag {
        ordinal,
        art: art.to_string(),
    })
}

/// Extract a sprint ordinal from a sprint label: the last run of digits in
/// the label ("Sprint 14" -> 14, "2024-S3" -> 3). Returns None when the
/// label carries no digits.
pub fn parse_sprint_ordinal(label: &str) -> Option<u32> {
    let bytes = label.as_bytes();
    let mut end = bytes.len();
    while end > 0 && !bytes[end - 1].is_ascii_digit() {
        end -= 1;
    }
    if end == 0 {
        return None;
    }
    let mut start = end;
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    label[start..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pi_label_canonical() {
        let tag = parse_pi_label("PI-4_Grading").unwrap();
        assert_eq!(tag.ordinal, 4);
        assert_eq!(tag.art, "Grading");
    }

    #[test]
    fn test_parse_pi_label_reversed_is_malformed() {
        assert_eq!(parse_pi_label("Grading_PI4"), None);
    }

    #[test]
    fn test_parse_pi_label_splits_on_last_underscore() {
        // An underscored ART name is not representable: the prefix is no
        // longer PI-<digits>.
        assert_eq!(parse_pi_label("PI-12_Core_Platform"), None);
    }

    #[test]
    fn test_parse_pi_label_rejects_empty_parts() {
        assert_eq!(parse_pi_label("PI-4_"), None);
        assert_eq!(parse_pi_label("PI-_Grading"), None);
        assert_eq!(parse_pi_label("PI-4"), None);
        assert_eq!(parse_pi_label(""), None);
    }

    #[test]
    fn test_parse_pi_label_large_ordinal() {
        let tag = parse_pi_label("PI-2024_Reporting").unwrap();
        assert_eq!(tag.ordinal, 2024);
    }

    #[test]
    fn test_parse_sprint_ordinal() {
        assert_eq!(parse_sprint_ordinal("Sprint 14"), Some(14));
        assert_eq!(parse_sprint_ordinal("2024-S3"), Some(3));
        assert_eq!(parse_sprint_ordinal("Iteration 7 (carry)"), Some(7));
        assert_eq!(parse_sprint_ordinal("Backlog"), None);
        assert_eq!(parse_sprint_ordinal(""), None);
    }
}

//! Issue normalizer: raw tracker records into typed features and stories.
//!
//! A raw record is a flat JSON object of field-id to value. Only `key` and
//! `type` are mandatory; everything else defaults per field semantics.
//! Custom field ids come from the injected [`FieldMap`](crate::config::FieldMap),
//! so the normalizer has no knowledge of any particular tracker instance.

use crate::config::TrainmapConfig;
use crate::core::{parse_pi_label, parse_sprint_ordinal, Diagnostics, Feature, Story};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

const FEATURE_TYPE: &str = "Feature";
const STORY_TYPE: &str = "Story";

/// Typed output of one normalization pass over a raw record batch.
#[derive(Clone, Debug, Default)]
pub struct NormalizedIssues {
    pub features: Vec<Feature>,
    pub stories: Vec<Story>,
    pub diagnostics: Diagnostics,
}

/// Structurally valid view over a raw record.
struct RecordView<'a> {
    key: &'a str,
    issue_type: &'a str,
    fields: &'a Map<String, Value>,
}

impl<'a> RecordView<'a> {
    /// A record without a non-empty `key` and `type` is rejected; nothing
    /// else is mandatory.
    fn try_from_value(record: &'a Value) -> Option<Self> {
        let fields = record.as_object()?;
        let key = fields.get("key")?.as_str().filter(|s| !s.is_empty())?;
        let issue_type = fields.get("type")?.as_str().filter(|s| !s.is_empty())?;
        Some(Self {
            key,
            issue_type,
            fields,
        })
    }
}

/// Normalize a batch of raw records into features and stories.
///
/// Never fails: structurally invalid records are skipped and counted, and
/// every data-quality anomaly lands in the returned diagnostics. The
/// feature and story passes are independent and run in parallel.
pub fn normalize(records: &[Value], config: &TrainmapConfig) -> NormalizedIssues {
    let mut diagnostics = Diagnostics {
        records_seen: records.len(),
        ..Diagnostics::default()
    };

    let mut valid = Vec::with_capacity(records.len());
    for record in records {
        match RecordView::try_from_value(record) {
            Some(view) => valid.push(view),
            None => diagnostics.skipped_structural += 1,
        }
    }

    let ((seeds, feature_diag), (stories, story_diag)) = rayon::join(
        || extract_features(&valid, config),
        || extract_stories(&valid, config),
    );
    diagnostics.merge(&feature_diag);
    diagnostics.merge(&story_diag);

    let (features, dangling_links) = link_stories(seeds, &stories);
    diagnostics.dangling_links = dangling_links;
    diagnostics.features = features.len();
    diagnostics.stories = stories.len();
    diagnostics.ignored = valid.len() - features.len() - stories.len();

    log::debug!(
        "normalized {} records: {} features, {} stories, {} skipped, {} ignored",
        diagnostics.records_seen,
        diagnostics.features,
        diagnostics.stories,
        diagnostics.skipped_structural,
        diagnostics.ignored
    );

    NormalizedIssues {
        features,
        stories,
        diagnostics,
    }
}

/// PI labels present in a raw record batch.
///
/// With labels configured, returns the configured ones that occur, in
/// configured order. With none configured, returns every label on a feature
/// record that parses as a PI label, sorted; a discovery aid for building
/// the config in the first place.
pub fn pi_labels_in(records: &[Value], config: &TrainmapConfig) -> Vec<String> {
    let mut present: Vec<String> = Vec::new();
    for record in records {
        let Some(view) = RecordView::try_from_value(record) else {
            continue;
        };
        if view.issue_type != FEATURE_TYPE {
            continue;
        }
        let Some(labels) = view.fields.get("labels").and_then(Value::as_array) else {
            continue;
        };
        for label in labels.iter().filter_map(Value::as_str) {
            let accepted = if config.pi.labels.is_empty() {
                parse_pi_label(label).is_some()
            } else {
                config.pi.labels.iter().any(|a| a == label)
            };
            if accepted && !present.iter().any(|p| p == label) {
                present.push(label.to_string());
            }
        }
    }

    if config.pi.labels.is_empty() {
        present.sort();
    } else {
        let order = |l: &str| config.pi.labels.iter().position(|a| a == l);
        present.sort_by_key(|l| order(l));
    }
    present
}

/// Feature plus whether its committed points came from its own estimate
/// field; without one, committed falls back to the linked-story sum.
struct FeatureSeed {
    feature: Feature,
    has_estimate: bool,
}

fn extract_features(records: &[RecordView], config: &TrainmapConfig) -> (Vec<FeatureSeed>, Diagnostics) {
    let mut diag = Diagnostics::default();
    let mut seeds = Vec::new();

    for record in records {
        if record.issue_type != FEATURE_TYPE {
            continue;
        }
        // Tie-break for records carrying several accepted labels: the
        // first match in the record's own label order wins.
        let Some(pi_label) = first_matching_label(record.fields, &config.pi.labels) else {
            continue;
        };

        let tag = parse_pi_label(&pi_label);
        if tag.is_none() {
            diag.malformed_pi_labels += 1;
        }

        let raw_status = str_field(record.fields, "status").unwrap_or_default();
        let points = points_field(record.fields, &config.fields.story_points);

        seeds.push(FeatureSeed {
            feature: Feature {
                key: record.key.to_string(),
                title: str_field(record.fields, "summary").unwrap_or_default(),
                status: config.statuses.classify(&raw_status),
                raw_status,
                pi_label,
                pi_ordinal: tag.as_ref().map(|t| t.ordinal),
                art: tag.map(|t| t.art),
                workstream: str_field(record.fields, &config.fields.workstream),
                business_benefit: str_field(record.fields, &config.fields.business_benefit),
                committed_points: points.unwrap_or(0.0),
                delivered_points: 0.0,
                story_count: 0,
                done_story_count: 0,
                due_date: date_field(record.fields, "duedate", &mut diag),
                created: timestamp_field(record.fields, "created", &mut diag),
                updated: timestamp_field(record.fields, "updated", &mut diag),
            },
            has_estimate: points.is_some(),
        });
    }

    (seeds, diag)
}

fn extract_stories(records: &[RecordView], config: &TrainmapConfig) -> (Vec<Story>, Diagnostics) {
    let mut diag = Diagnostics::default();
    let mut stories = Vec::new();

    for record in records {
        if record.issue_type != STORY_TYPE {
            continue;
        }

        let raw_status = str_field(record.fields, "status").unwrap_or_default();
        let sprint = str_field(record.fields, &config.fields.sprint);
        let sprint_ordinal = sprint.as_deref().and_then(parse_sprint_ordinal);
        if sprint.is_some() && sprint_ordinal.is_none() {
            diag.unparsed_sprints += 1;
        }

        let points = points_field(record.fields, &config.fields.story_points);
        if points.is_none() {
            diag.unestimated_stories += 1;
        }

        // Two spellings of one semantic field; an unparseable value in
        // either counts once per story, not once per spelling.
        let mut resolution_diag = Diagnostics::default();
        let resolved = timestamp_field(record.fields, "resolved", &mut resolution_diag)
            .or_else(|| timestamp_field(record.fields, "resolutiondate", &mut resolution_diag));
        diag.unparsed_timestamps += resolution_diag.unparsed_timestamps.min(1);

        stories.push(Story {
            key: record.key.to_string(),
            title: str_field(record.fields, "summary").unwrap_or_default(),
            status: config.statuses.classify(&raw_status),
            raw_status,
            feature_key: str_field(record.fields, &config.fields.feature_link),
            team: str_field(record.fields, &config.fields.workstream),
            sprint,
            sprint_ordinal,
            points,
            assignee: str_field(record.fields, "assignee"),
            created: timestamp_field(record.fields, "created", &mut diag),
            resolved,
            updated: timestamp_field(record.fields, "updated", &mut diag),
        });
    }

    (stories, diag)
}

/// Roll linked stories up into their parent features. Stories pointing at a
/// key outside the feature set are left dangling and counted; they still
/// carry their team metrics elsewhere.
fn link_stories(seeds: Vec<FeatureSeed>, stories: &[Story]) -> (Vec<Feature>, usize) {
    let mut by_key: HashMap<&str, usize> = HashMap::with_capacity(seeds.len());
    for (slot, seed) in seeds.iter().enumerate() {
        by_key.insert(seed.feature.key.as_str(), slot);
    }

    let mut planned = vec![0.0f64; seeds.len()];
    let mut delivered = vec![0.0f64; seeds.len()];
    let mut counts = vec![0usize; seeds.len()];
    let mut done_counts = vec![0usize; seeds.len()];
    let mut dangling = 0usize;

    for story in stories {
        let Some(parent) = story.feature_key.as_deref() else {
            continue;
        };
        match by_key.get(parent) {
            Some(&slot) => {
                planned[slot] += story.points_or_zero();
                counts[slot] += 1;
                if story.status.is_done() {
                    delivered[slot] += story.points_or_zero();
                    done_counts[slot] += 1;
                }
            }
            None => dangling += 1,
        }
    }

    let features = seeds
        .into_iter()
        .enumerate()
        .map(|(slot, seed)| {
            let mut feature = seed.feature;
            if !seed.has_estimate {
                feature.committed_points = planned[slot];
            }
            feature.delivered_points = delivered[slot];
            feature.story_count = counts[slot];
            feature.done_story_count = done_counts[slot];
            feature
        })
        .collect();

    (features, dangling)
}

fn first_matching_label(fields: &Map<String, Value>, accepted: &[String]) -> Option<String> {
    let labels = fields.get("labels")?.as_array()?;
    labels
        .iter()
        .filter_map(Value::as_str)
        .find(|label| accepted.iter().any(|a| a == label))
        .map(ToString::to_string)
}

/// Read a string field; absent, null, or empty all mean "unset".
fn str_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Read a story-point field: a JSON number, or a numeric string (some
/// trackers export estimates as strings). Negative estimates are garbage
/// and read as unset.
fn points_field(fields: &Map<String, Value>, name: &str) -> Option<f64> {
    let value = fields.get(name)?;
    let points = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    points.filter(|p| *p >= 0.0)
}

fn timestamp_field(
    fields: &Map<String, Value>,
    name: &str,
    diag: &mut Diagnostics,
) -> Option<DateTime<Utc>> {
    let raw = fields.get(name)?.as_str()?;
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        diag.unparsed_timestamps += 1;
        log::debug!("unparseable timestamp in field {}: {:?}", name, raw);
    }
    parsed
}

fn date_field(fields: &Map<String, Value>, name: &str, diag: &mut Diagnostics) -> Option<NaiveDate> {
    let raw = fields.get(name)?.as_str()?;
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_date(raw);
    if parsed.is_none() {
        diag.unparsed_timestamps += 1;
    }
    parsed
}

/// Parse a timestamp leniently: RFC 3339, the tracker's millisecond-offset
/// form (`2024-01-15T10:30:00.000+0000`), or a bare date taken as midnight
/// UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

/// Parse a date, accepting either a bare date or a full timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    parse_timestamp(raw).map(|ts| ts.date_naive())
}

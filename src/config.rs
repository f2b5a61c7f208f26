use crate::core::{HealthBand, Status};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Root configuration structure for trainmap
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrainmapConfig {
    /// Accepted PI labels and the PI window
    #[serde(default)]
    pub pi: PiConfig,

    /// Tracker custom-field ids mapped to their semantic roles
    #[serde(default)]
    pub fields: FieldMap,

    /// Tracker status names mapped to workflow states
    #[serde(default)]
    pub statuses: StatusMap,

    /// Health score weights and bands
    #[serde(default)]
    pub health: HealthWeights,

    /// Velocity series configuration
    #[serde(default)]
    pub velocity: VelocityConfig,

    /// Cycle-time statistics configuration
    #[serde(default)]
    pub cycle_time: CycleTimeConfig,
}

/// PI selection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PiConfig {
    /// Accepted PI labels. A record carrying several of these is attributed
    /// to the first match in the record's own label order; this list's
    /// order only drives discovery listings.
    #[serde(default)]
    pub labels: Vec<String>,

    /// PI end date; enables the on-track health sub-score for features
    /// carrying a due date.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Custom field ids for the tracker instance being analyzed. Injected into
/// the normalizer rather than looked up globally, so one process can serve
/// differently-configured trackers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMap {
    #[serde(default = "default_story_points_field")]
    pub story_points: String,

    #[serde(default = "default_workstream_field")]
    pub workstream: String,

    #[serde(default = "default_business_benefit_field")]
    pub business_benefit: String,

    #[serde(default = "default_sprint_field")]
    pub sprint: String,

    #[serde(default = "default_feature_link_field")]
    pub feature_link: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            story_points: default_story_points_field(),
            workstream: default_workstream_field(),
            business_benefit: default_business_benefit_field(),
            sprint: default_sprint_field(),
            feature_link: default_feature_link_field(),
        }
    }
}

fn default_story_points_field() -> String {
    "customfield_10003".to_string()
}
fn default_workstream_field() -> String {
    "customfield_20403".to_string()
}
fn default_business_benefit_field() -> String {
    "customfield_11800".to_string()
}
fn default_sprint_field() -> String {
    "customfield_11701".to_string()
}
fn default_feature_link_field() -> String {
    "customfield_11702".to_string()
}

/// Status name sets for collapsing tracker statuses into workflow states.
/// Matching is exact: trackers are case-exact about status names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMap {
    #[serde(default = "default_done_statuses")]
    pub done: Vec<String>,

    #[serde(default = "default_in_progress_statuses")]
    pub in_progress: Vec<String>,
}

impl Default for StatusMap {
    fn default() -> Self {
        Self {
            done: default_done_statuses(),
            in_progress: default_in_progress_statuses(),
        }
    }
}

impl StatusMap {
    pub fn classify(&self, raw: &str) -> Status {
        if self.done.iter().any(|s| s == raw) {
            Status::Done
        } else if self.in_progress.iter().any(|s| s == raw) {
            Status::InProgress
        } else {
            Status::Open
        }
    }
}

fn default_done_statuses() -> Vec<String> {
    vec!["Done".to_string(), "Closed".to_string()]
}
fn default_in_progress_statuses() -> Vec<String> {
    vec!["In Progress".to_string()]
}

/// Health score weights configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthWeights {
    /// Weight for the capped predictability sub-score (0.0-1.0)
    #[serde(default = "default_predictability_weight")]
    pub predictability: f64,

    /// Weight for the feature completion sub-score (0.0-1.0)
    #[serde(default = "default_completion_weight")]
    pub completion: f64,

    /// Weight for the on-track sub-score (0.0-1.0)
    #[serde(default = "default_on_track_weight")]
    pub on_track: f64,

    /// Score thresholds for the health bands
    #[serde(default)]
    pub bands: HealthBands,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            predictability: default_predictability_weight(),
            completion: default_completion_weight(),
            on_track: default_on_track_weight(),
            bands: HealthBands::default(),
        }
    }
}

impl HealthWeights {
    fn is_valid_weight(weight: f64) -> bool {
        (0.0..=1.0).contains(&weight)
    }

    fn validate_weight(weight: f64, name: &str) -> Result<(), String> {
        if Self::is_valid_weight(weight) {
            Ok(())
        } else {
            Err(format!("{} weight must be between 0.0 and 1.0", name))
        }
    }

    /// Validate that weights are in range and sum to 1.0 (with a small
    /// tolerance for floating point).
    pub fn validate(&self) -> Result<(), String> {
        Self::validate_weight(self.predictability, "Predictability")?;
        Self::validate_weight(self.completion, "Completion")?;
        Self::validate_weight(self.on_track, "On-track")?;

        let sum = self.predictability + self.completion + self.on_track;
        if (sum - 1.0).abs() > 0.001 {
            return Err(format!(
                "Health weights must sum to 1.0, but sum to {:.3}",
                sum
            ));
        }
        self.bands.validate()
    }

    /// Normalize weights to ensure they sum to exactly 1.0
    pub fn normalize(&mut self) {
        let sum = self.predictability + self.completion + self.on_track;
        if sum > 0.0 && (sum - 1.0).abs() > 0.001 {
            self.predictability /= sum;
            self.completion /= sum;
            self.on_track /= sum;
        }
    }
}

// Default weights for the composite health score
fn default_predictability_weight() -> f64 {
    0.50 // delivery against commitment dominates
}
fn default_completion_weight() -> f64 {
    0.30 // finished features over partially-burned scope
}
fn default_on_track_weight() -> f64 {
    0.20 // due-date outlook, when due dates exist
}

/// Health band thresholds on the 0-100 composite score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthBands {
    /// Scores at or above this are Healthy
    #[serde(default = "default_healthy_min")]
    pub healthy_min: f64,

    /// Scores at or above this (and below healthy_min) are AtRisk
    #[serde(default = "default_at_risk_min")]
    pub at_risk_min: f64,
}

impl Default for HealthBands {
    fn default() -> Self {
        Self {
            healthy_min: default_healthy_min(),
            at_risk_min: default_at_risk_min(),
        }
    }
}

impl HealthBands {
    pub fn classify(&self, score: f64) -> HealthBand {
        if score >= self.healthy_min {
            HealthBand::Healthy
        } else if score >= self.at_risk_min {
            HealthBand::AtRisk
        } else {
            HealthBand::OffTrack
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.healthy_min)
            || !(0.0..=100.0).contains(&self.at_risk_min)
        {
            return Err("Health band thresholds must be between 0 and 100".to_string());
        }
        if self.at_risk_min >= self.healthy_min {
            return Err(format!(
                "at_risk_min ({}) must be below healthy_min ({})",
                self.at_risk_min, self.healthy_min
            ));
        }
        Ok(())
    }
}

fn default_healthy_min() -> f64 {
    80.0
}
fn default_at_risk_min() -> f64 {
    50.0
}

/// Velocity series configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VelocityConfig {
    /// Window for the trailing rolling velocity average
    #[serde(default = "default_rolling_window")]
    pub rolling_window: usize,

    /// Stories whose sprint ordinal is further than this from the team's
    /// median ordinal are excluded from the series as data-quality
    /// outliers. Keeps one date-like sprint label ("Sprint 20240115") from
    /// stretching the contiguous series across millions of empty sprints.
    #[serde(default = "default_max_ordinal_distance")]
    pub max_ordinal_distance: u32,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            rolling_window: default_rolling_window(),
            max_ordinal_distance: default_max_ordinal_distance(),
        }
    }
}

fn default_rolling_window() -> usize {
    3
}
fn default_max_ordinal_distance() -> u32 {
    100
}

/// Cycle-time statistics configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CycleTimeConfig {
    /// Upper percentile reported next to the median (1-100)
    #[serde(default = "default_percentile")]
    pub percentile: u8,
}

impl Default for CycleTimeConfig {
    fn default() -> Self {
        Self {
            percentile: default_percentile(),
        }
    }
}

fn default_percentile() -> u8 {
    85
}

pub const CONFIG_FILE_NAME: &str = ".trainmap.toml";
const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config from TOML contents
pub fn parse_and_validate_config(contents: &str) -> Result<TrainmapConfig, String> {
    let mut config = toml::from_str::<TrainmapConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;

    if let Err(e) = config.health.validate() {
        eprintln!(
            "Warning: Invalid health configuration: {}. Using defaults.",
            e
        );
        config.health = HealthWeights::default();
    } else {
        config.health.normalize(); // Ensure exact sum of 1.0
    }

    if config.velocity.rolling_window == 0 {
        eprintln!("Warning: velocity.rolling_window must be at least 1. Using default.");
        config.velocity.rolling_window = default_rolling_window();
    }

    if config.cycle_time.percentile == 0 || config.cycle_time.percentile > 100 {
        eprintln!("Warning: cycle_time.percentile must be in 1-100. Using default.");
        config.cycle_time = CycleTimeConfig::default();
    }

    Ok(config)
}

fn try_load_config_from_path(config_path: &Path) -> Option<TrainmapConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
            }
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            eprintln!("Warning: {}. Using defaults.", e);
            None
        }
    }
}

/// Load config from an explicit path; unlike the ancestor search, a missing
/// or malformed file here is an error, since the user asked for this file.
pub fn load_config_from(path: &Path) -> Result<TrainmapConfig, crate::core::TrainmapError> {
    let contents = read_config_file(path)?;
    parse_and_validate_config(&contents).map_err(crate::core::TrainmapError::Config)
}

/// Load configuration from `.trainmap.toml`, searching the current
/// directory and its ancestors; falls back to defaults.
pub fn load_config() -> TrainmapConfig {
    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            return TrainmapConfig::default();
        }
    };

    directory_ancestors(current, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            TrainmapConfig::default()
        })
}

fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        let weights = HealthWeights::default();
        assert!(weights.validate().is_ok());
        assert_eq!(weights.predictability, 0.5);
        assert_eq!(weights.completion, 0.3);
        assert_eq!(weights.on_track, 0.2);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = HealthWeights {
            predictability: 0.5,
            completion: 0.5,
            on_track: 0.5,
            bands: HealthBands::default(),
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_normalize_rescales_weights() {
        let mut weights = HealthWeights {
            predictability: 1.0,
            completion: 1.0,
            on_track: 2.0,
            bands: HealthBands::default(),
        };
        weights.normalize();
        assert!((weights.predictability - 0.25).abs() < 1e-9);
        assert!((weights.on_track - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_band_classification_defaults() {
        let bands = HealthBands::default();
        assert_eq!(bands.classify(92.0), HealthBand::Healthy);
        assert_eq!(bands.classify(80.0), HealthBand::Healthy);
        assert_eq!(bands.classify(79.9), HealthBand::AtRisk);
        assert_eq!(bands.classify(50.0), HealthBand::AtRisk);
        assert_eq!(bands.classify(49.9), HealthBand::OffTrack);
    }

    #[test]
    fn test_band_threshold_ordering_validated() {
        let bands = HealthBands {
            healthy_min: 40.0,
            at_risk_min: 60.0,
        };
        assert!(bands.validate().is_err());
    }

    #[test]
    fn test_status_map_classification() {
        let statuses = StatusMap::default();
        assert_eq!(statuses.classify("Done"), Status::Done);
        assert_eq!(statuses.classify("Closed"), Status::Done);
        assert_eq!(statuses.classify("In Progress"), Status::InProgress);
        assert_eq!(statuses.classify("To Do"), Status::Open);
        assert_eq!(statuses.classify("done"), Status::Open); // exact match
    }

    #[test]
    fn test_parse_config_overrides() {
        let config = parse_and_validate_config(
            r#"
            [pi]
            labels = ["PI-4_Grading", "PI-4_Reporting"]
            end_date = "2024-03-29"

            [fields]
            story_points = "customfield_999"

            [health]
            predictability = 0.6
            completion = 0.2
            on_track = 0.2

            [velocity]
            rolling_window = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.pi.labels.len(), 2);
        assert_eq!(
            config.pi.end_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 29).unwrap())
        );
        assert_eq!(config.fields.story_points, "customfield_999");
        assert_eq!(config.fields.sprint, "customfield_11701"); // default kept
        assert_eq!(config.health.predictability, 0.6);
        assert_eq!(config.velocity.rolling_window, 5);
        assert_eq!(config.velocity.max_ordinal_distance, 100); // default kept
        assert_eq!(config.cycle_time.percentile, 85);
    }

    #[test]
    fn test_invalid_weights_fall_back_to_defaults() {
        let config = parse_and_validate_config(
            r#"
            [health]
            predictability = 2.0
            completion = 0.3
            on_track = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(config.health.predictability, 0.5);
    }
}

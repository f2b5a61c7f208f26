//! Domain model shared by the normalizer and both analytics engines.

pub mod labels;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use labels::{parse_pi_label, parse_sprint_ordinal, PiTag};

/// Group name used for features whose PI label carries no parseable ART.
pub const UNASSIGNED_ART: &str = "unassigned";

/// Workflow status collapsed from tracker-specific status names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Open,
    InProgress,
    Done,
}

impl Status {
    pub fn is_done(self) -> bool {
        matches!(self, Status::Done)
    }

    /// Display name for reports
    pub fn display_name(&self) -> &str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }
}

/// A ratio or statistic that may lack the data to be computed.
///
/// `Insufficient` is distinct from zero: a team that delivered nothing has a
/// predictability of 0.0, a team with no commitment has no predictability at
/// all. Serializes untagged, so `Defined(v)` is the bare value and
/// `Insufficient` is `null`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measure<T = f64> {
    Defined(T),
    Insufficient,
}

impl<T> Measure<T> {
    pub fn is_defined(&self) -> bool {
        matches!(self, Measure::Defined(_))
    }

    pub fn defined(self) -> Option<T> {
        match self {
            Measure::Defined(v) => Some(v),
            Measure::Insufficient => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Measure<U> {
        match self {
            Measure::Defined(v) => Measure::Defined(f(v)),
            Measure::Insufficient => Measure::Insufficient,
        }
    }
}

impl Measure<f64> {
    /// Ratio with an explicit undefined result for a zero denominator.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 {
            Measure::Defined(numerator / denominator)
        } else {
            Measure::Insufficient
        }
    }
}

/// A PI feature: a tracker "Feature" issue carrying one of the configured
/// PI labels.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Feature {
    pub key: String,
    pub title: String,
    pub status: Status,
    /// Tracker status name before collapsing, kept for display.
    pub raw_status: String,
    /// The PI label that matched, e.g. `PI-4_Grading`.
    pub pi_label: String,
    /// Ordinal parsed from the label; None when the label is malformed.
    pub pi_ordinal: Option<u32>,
    /// ART parsed from the label suffix; None when the label is malformed.
    pub art: Option<String>,
    pub workstream: Option<String>,
    pub business_benefit: Option<String>,
    /// Points committed at PI planning: the feature's own points field when
    /// set, otherwise the sum of linked story points.
    pub committed_points: f64,
    /// Sum of points over linked stories in a done status.
    pub delivered_points: f64,
    pub story_count: usize,
    pub done_story_count: usize,
    pub due_date: Option<NaiveDate>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Feature {
    /// ART group name, with malformed labels collected under "unassigned".
    pub fn art_name(&self) -> &str {
        self.art.as_deref().unwrap_or(UNASSIGNED_ART)
    }
}

/// A story belonging to a team's sprint, optionally linked to a feature.
///
/// A dangling `feature_key` (parent absent from the fetched feature set) is
/// valid: the story is excluded from feature rollups but still feeds
/// team-level scrum metrics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Story {
    pub key: String,
    pub title: String,
    pub status: Status,
    pub raw_status: String,
    pub feature_key: Option<String>,
    pub team: Option<String>,
    /// Raw sprint label, e.g. "Sprint 14".
    pub sprint: Option<String>,
    /// Ordinal parsed from the sprint label; None when unparseable.
    pub sprint_ordinal: Option<u32>,
    /// None means unestimated; sums treat it as zero.
    pub points: Option<f64>,
    pub assignee: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub resolved: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Story {
    pub fn points_or_zero(&self) -> f64 {
        self.points.unwrap_or(0.0)
    }
}

/// Health classification bands for an ART scorecard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthBand {
    Healthy,
    AtRisk,
    OffTrack,
}

impl HealthBand {
    pub fn display_name(&self) -> &str {
        match self {
            HealthBand::Healthy => "healthy",
            HealthBand::AtRisk => "at risk",
            HealthBand::OffTrack => "off track",
        }
    }
}

/// Composite health score for one ART or workstream group.
///
/// The sub-scores are kept so a report can show what moved the needle.
/// Predictability is capped at 1.0 here, for scoring only; the uncapped
/// ratio lives on the scorecard.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    /// 0-100 weighted composite; Insufficient when no sub-score had data.
    pub score: Measure<f64>,
    pub band: Option<HealthBand>,
    pub predictability: Measure<f64>,
    pub completion: Measure<f64>,
    pub on_track: Measure<f64>,
}

/// Commitment-vs-delivery scorecard for one ART, or one workstream within
/// an ART in the unrolled view.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtScorecard {
    pub art: String,
    /// Set in the per-workstream unrolled view, None in the ART rollup.
    pub workstream: Option<String>,
    pub feature_count: usize,
    pub done_feature_count: usize,
    pub workstream_count: usize,
    pub committed_points: f64,
    pub delivered_points: f64,
    /// delivered / committed, deliberately not clamped: over-delivery
    /// (>1.0) signals mis-scoped commitments and is reported as-is.
    pub predictability: Measure<f64>,
    pub health: HealthScore,
}

/// Program-level totals across every ART of one PI.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub pi_label: String,
    pub art_count: usize,
    pub feature_count: usize,
    pub done_feature_count: usize,
    pub committed_points: f64,
    pub delivered_points: f64,
    pub predictability: Measure<f64>,
}

/// Feature/story/point completion counts for one PI, optionally narrowed to
/// a workstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PiSummary {
    pub pi_label: String,
    pub workstream: Option<String>,
    pub total_features: usize,
    pub completed_features: usize,
    pub total_stories: usize,
    pub completed_stories: usize,
    pub total_points: f64,
    pub completed_points: f64,
    pub feature_completion: Measure<f64>,
    pub story_completion: Measure<f64>,
    pub point_completion: Measure<f64>,
}

/// One sprint's delivery for one team.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VelocityPoint {
    pub team: String,
    pub sprint: u32,
    /// Velocity: points of done stories in this sprint.
    pub completed_points: f64,
    pub planned_points: f64,
    pub stories_planned: usize,
    pub stories_done: usize,
    pub completion_rate: Measure<f64>,
}

/// Raw per-sprint series plus the trailing rolling average.
///
/// The series is contiguous over [first..last] sprint ordinal: a sprint
/// with no done stories contributes a zero-velocity point, not a gap.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VelocitySeries {
    pub team: String,
    pub points: Vec<VelocityPoint>,
    /// rolling[i] = mean of the up-to-`window` velocities ending at i.
    pub rolling: Vec<f64>,
    pub window: usize,
    /// Stories excluded because their sprint ordinal sits implausibly far
    /// from the team's median ordinal (a date-like sprint label, usually).
    pub outlier_stories: usize,
    pub summary: VelocitySummary,
}

/// Aggregates over a velocity series.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VelocitySummary {
    pub average_velocity: Measure<f64>,
    pub last_velocity: Measure<f64>,
    pub completion_rate_mean: Measure<f64>,
    /// Sample standard deviation of per-sprint completion rates; a
    /// consistency signal, lower is steadier.
    pub completion_rate_stddev: Measure<f64>,
}

/// One completed story's elapsed calendar time, in fractional days.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleTimeSample {
    pub key: String,
    pub days: f64,
    pub status: Status,
}

/// Cycle-time distribution for one team.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleTimeStats {
    pub team: String,
    pub samples: Vec<CycleTimeSample>,
    /// Stories not yet resolved, excluded from the samples.
    pub in_flight: usize,
    /// Stories resolved before they were created; a data-quality anomaly,
    /// excluded from statistics and counted here.
    pub negative_anomalies: usize,
    /// Resolved stories with no created timestamp, not computable.
    pub missing_created: usize,
    pub mean_days: Measure<f64>,
    pub median_days: Measure<f64>,
    /// Which percentile `percentile_days` reports, e.g. 85.
    pub percentile: u8,
    pub percentile_days: Measure<f64>,
}

/// One day of a reconstructed sprint burndown.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BurndownPoint {
    /// Day offset from sprint start, 0 = first day.
    pub day: u32,
    pub date: NaiveDate,
    pub remaining_points: f64,
    /// Linear scope decay over the sprint window.
    pub ideal_remaining: f64,
}

/// Reconstructed burndown trajectory; a non-increasing step series by
/// construction. A final remaining value above zero is a valid outcome and
/// signals an incomplete sprint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BurndownSeries {
    pub team: String,
    pub sprint: String,
    pub start: NaiveDate,
    pub days: u32,
    pub scope_points: f64,
    pub points: Vec<BurndownPoint>,
}

impl BurndownSeries {
    pub fn final_remaining(&self) -> f64 {
        self.points.last().map_or(self.scope_points, |p| p.remaining_points)
    }
}

/// Skip and anomaly counters accumulated while normalizing a batch.
///
/// Nothing is dropped silently: every record the normalizer does not turn
/// into a feature or story lands in one of these counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub records_seen: usize,
    pub features: usize,
    pub stories: usize,
    /// Records missing a key or type, rejected.
    pub skipped_structural: usize,
    /// Records that are neither a PI feature nor a linked story.
    pub ignored: usize,
    /// Features kept with ART "unassigned" because the label did not parse.
    pub malformed_pi_labels: usize,
    /// Stories whose feature link points outside the fetched feature set.
    pub dangling_links: usize,
    /// Stories with no story-point estimate, summed as zero.
    pub unestimated_stories: usize,
    /// Stories with a sprint label carrying no ordinal.
    pub unparsed_sprints: usize,
    /// Timestamp fields present but unparseable.
    pub unparsed_timestamps: usize,
}

impl Diagnostics {
    pub fn merge(&mut self, other: &Diagnostics) {
        self.records_seen += other.records_seen;
        self.features += other.features;
        self.stories += other.stories;
        self.skipped_structural += other.skipped_structural;
        self.ignored += other.ignored;
        self.malformed_pi_labels += other.malformed_pi_labels;
        self.dangling_links += other.dangling_links;
        self.unestimated_stories += other.unestimated_stories;
        self.unparsed_sprints += other.unparsed_sprints;
        self.unparsed_timestamps += other.unparsed_timestamps;
    }
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum TrainmapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid issue export: {0}")]
    InvalidExport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias
pub type TrainmapResult<T> = Result<T, TrainmapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_defined() {
        assert_eq!(Measure::ratio(45.0, 60.0), Measure::Defined(0.75));
    }

    #[test]
    fn test_ratio_zero_denominator_is_insufficient() {
        assert_eq!(Measure::ratio(10.0, 0.0), Measure::Insufficient);
    }

    #[test]
    fn test_ratio_over_delivery_not_clamped() {
        assert_eq!(Measure::ratio(90.0, 60.0), Measure::Defined(1.5));
    }

    #[test]
    fn test_measure_serializes_untagged() {
        let defined: Measure<f64> = Measure::Defined(0.75);
        let insufficient: Measure<f64> = Measure::Insufficient;
        assert_eq!(serde_json::to_string(&defined).unwrap(), "0.75");
        assert_eq!(serde_json::to_string(&insufficient).unwrap(), "null");
    }

    #[test]
    fn test_measure_deserializes_null_as_insufficient() {
        let m: Measure<f64> = serde_json::from_str("null").unwrap();
        assert_eq!(m, Measure::Insufficient);
        let m: Measure<f64> = serde_json::from_str("1.25").unwrap();
        assert_eq!(m, Measure::Defined(1.25));
    }
}

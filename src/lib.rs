// Export modules for library usage
pub mod aggregate;
pub mod analytics;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod normalize;

// Re-export commonly used types
pub use crate::core::{
    ArtScorecard, BurndownPoint, BurndownSeries, CycleTimeSample, CycleTimeStats, Diagnostics,
    Feature, HealthBand, HealthScore, Measure, PiSummary, ProgramSummary, Status, Story,
    TrainmapError, TrainmapResult, VelocityPoint, VelocitySeries, VelocitySummary,
};

pub use crate::analytics::pi::{
    art_scorecards, pi_summary, program_summary, workstream_scorecards, ScorecardOrder,
};
pub use crate::analytics::scrum::{burndown, cycle_time_stats, team_velocity, teams};

pub use crate::config::{load_config, load_config_from, TrainmapConfig};
pub use crate::normalize::{normalize, NormalizedIssues};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter, Report};

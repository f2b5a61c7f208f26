//! CLI command implementations.
//!
//! Each submodule owns one subcommand: its configuration struct and the
//! load -> normalize -> engine -> writer pipeline. The engines themselves
//! never touch files or stdout; everything effectful happens here.

pub mod burndown;
pub mod cycle_time;
pub mod discover;
pub mod features;
pub mod init;
pub mod pi;
pub mod velocity;

pub use burndown::{burndown_report, BurndownReportConfig};
pub use cycle_time::{cycle_time_report, CycleTimeReportConfig};
pub use discover::{list_pis, list_teams, DiscoverConfig};
pub use features::{features_report, FeaturesReportConfig};
pub use init::init_config;
pub use pi::{pi_report, PiReportConfig};
pub use velocity::{velocity_report, VelocityReportConfig};

use crate::config::{self, TrainmapConfig};
use crate::io::load_records;
use crate::normalize::{normalize, NormalizedIssues};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from an explicit path, or via the ancestor search
/// when none was given.
fn load_config(config_path: Option<&PathBuf>) -> Result<TrainmapConfig> {
    match config_path {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(config::load_config()),
    }
}

/// Read and normalize an issue export, shared by every report command.
fn normalize_export(input: &Path, config: &TrainmapConfig) -> Result<NormalizedIssues> {
    let records = load_records(input)
        .with_context(|| format!("failed to load issue export {}", input.display()))?;
    let issues = normalize(&records, config);

    if issues.diagnostics.skipped_structural > 0 {
        log::warn!(
            "skipped {} structurally invalid records",
            issues.diagnostics.skipped_structural
        );
    }

    Ok(issues)
}

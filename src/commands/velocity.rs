use crate::aggregate::matches_filter;
use crate::analytics::scrum::team_velocity;
use crate::core::Story;
use crate::io::output::{create_writer, OutputFormat, Report};
use anyhow::Result;
use std::path::PathBuf;

pub struct VelocityReportConfig {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub team: Vec<String>,
    pub window: Option<usize>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn velocity_report(cfg: VelocityReportConfig) -> Result<()> {
    let mut config = super::load_config(cfg.config.as_ref())?;
    if let Some(window) = cfg.window {
        anyhow::ensure!(window >= 1, "--window must be at least 1");
        config.velocity.rolling_window = window;
    }

    let issues = super::normalize_export(&cfg.input, &config)?;
    let stories: Vec<Story> = issues
        .stories
        .into_iter()
        .filter(|s| matches_filter(s.team.as_deref(), &cfg.team))
        .collect();

    let report = Report::Velocity {
        series: team_velocity(&stories, &config),
        diagnostics: issues.diagnostics,
    };
    create_writer(cfg.format, cfg.output)?.write_report(&report)
}

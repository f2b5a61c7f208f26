use crate::analytics::scrum::{burndown, teams};
use crate::io::output::{create_writer, OutputFormat, Report};
use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;

pub struct BurndownReportConfig {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub team: String,
    pub sprint: String,
    pub start: NaiveDate,
    pub days: u32,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn burndown_report(cfg: BurndownReportConfig) -> Result<()> {
    let config = super::load_config(cfg.config.as_ref())?;
    let issues = super::normalize_export(&cfg.input, &config)?;

    let series = burndown(&issues.stories, &cfg.team, &cfg.sprint, cfg.start, cfg.days);
    if series.scope_points == 0.0 {
        let known = teams(&issues.stories);
        log::warn!(
            "no estimated stories for team {:?} in sprint {:?}; known teams: {}",
            cfg.team,
            cfg.sprint,
            known.join(", ")
        );
    }

    let report = Report::Burndown {
        series,
        diagnostics: issues.diagnostics,
    };
    create_writer(cfg.format, cfg.output)?.write_report(&report)
}

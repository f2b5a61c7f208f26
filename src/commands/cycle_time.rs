use crate::aggregate::{in_range, matches_filter};
use crate::analytics::scrum::cycle_time_stats;
use crate::core::Story;
use crate::io::output::{create_writer, OutputFormat, Report};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::path::PathBuf;

pub struct CycleTimeReportConfig {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub team: Vec<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub percentile: Option<u8>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn cycle_time_report(cfg: CycleTimeReportConfig) -> Result<()> {
    let mut config = super::load_config(cfg.config.as_ref())?;
    if let Some(percentile) = cfg.percentile {
        anyhow::ensure!(
            (1..=100).contains(&percentile),
            "--percentile must be in 1-100"
        );
        config.cycle_time.percentile = percentile;
    }

    // Inclusive date bounds on the creation timestamp: --from means
    // midnight, --to means the end of that day.
    let from = cfg.from.map(start_of_day);
    let to = cfg.to.map(end_of_day);
    let bounded = from.is_some() || to.is_some();

    let issues = super::normalize_export(&cfg.input, &config)?;
    let stories: Vec<Story> = issues
        .stories
        .into_iter()
        .filter(|s| matches_filter(s.team.as_deref(), &cfg.team))
        .filter(|s| !bounded || s.created.is_some_and(|c| in_range(c, from, to)))
        .collect();

    let report = Report::CycleTime {
        stats: cycle_time_stats(&stories, &config),
        diagnostics: issues.diagnostics,
    };
    create_writer(cfg.format, cfg.output)?.write_report(&report)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(23, 59, 59).unwrap_or_default())
}

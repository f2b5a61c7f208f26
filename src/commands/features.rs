use crate::aggregate::matches_filter;
use crate::io::output::{create_writer, OutputFormat, Report};
use anyhow::Result;
use std::path::PathBuf;

pub struct FeaturesReportConfig {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub art: Vec<String>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn features_report(cfg: FeaturesReportConfig) -> Result<()> {
    let config = super::load_config(cfg.config.as_ref())?;
    let issues = super::normalize_export(&cfg.input, &config)?;

    let features = issues
        .features
        .into_iter()
        .filter(|f| matches_filter(Some(f.art_name()), &cfg.art))
        .collect();

    let report = Report::Features {
        features,
        diagnostics: issues.diagnostics,
    };
    create_writer(cfg.format, cfg.output)?.write_report(&report)
}

//! Discovery listings: which PIs and teams an export actually contains.
//! Feeds the selection flags of the report commands (and the config file
//! itself, when starting from scratch).

use crate::analytics::scrum::teams;
use crate::io::load_records;
use crate::io::output::{create_writer, OutputFormat, Report};
use crate::normalize::pi_labels_in;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct DiscoverConfig {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

pub fn list_pis(cfg: DiscoverConfig) -> Result<()> {
    let config = super::load_config(cfg.config.as_ref())?;
    let records = load_records(&cfg.input)
        .with_context(|| format!("failed to load issue export {}", cfg.input.display()))?;

    let report = Report::Listing {
        title: "PI labels".to_string(),
        values: pi_labels_in(&records, &config),
    };
    create_writer(cfg.format, None)?.write_report(&report)
}

pub fn list_teams(cfg: DiscoverConfig) -> Result<()> {
    let config = super::load_config(cfg.config.as_ref())?;
    let issues = super::normalize_export(&cfg.input, &config)?;

    let report = Report::Listing {
        title: "Teams".to_string(),
        values: teams(&issues.stories),
    };
    create_writer(cfg.format, None)?.write_report(&report)
}

use crate::aggregate::matches_filter;
use crate::analytics::pi::{
    art_scorecards, pi_summary, program_summary, workstream_scorecards, ScorecardOrder,
};
use crate::core::Feature;
use crate::io::output::{create_writer, OutputFormat, Report};
use anyhow::Result;
use std::path::PathBuf;

pub struct PiReportConfig {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub pi: Option<String>,
    pub art: Vec<String>,
    pub workstream: Vec<String>,
    pub by_workstream: bool,
    pub sort_by_health: bool,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn pi_report(cfg: PiReportConfig) -> Result<()> {
    let mut config = super::load_config(cfg.config.as_ref())?;

    // --pi narrows the accepted label set to exactly one label; the config
    // file's list is the default selection.
    if let Some(label) = &cfg.pi {
        config.pi.labels = vec![label.clone()];
    }
    if config.pi.labels.is_empty() {
        log::warn!("no PI labels configured; no features will match (set [pi] labels or pass --pi)");
    }

    let issues = super::normalize_export(&cfg.input, &config)?;
    let features: Vec<Feature> = issues
        .features
        .into_iter()
        .filter(|f| matches_filter(Some(f.art_name()), &cfg.art))
        .filter(|f| matches_filter(f.workstream.as_deref(), &cfg.workstream))
        .collect();

    let order = if cfg.sort_by_health {
        ScorecardOrder::Health
    } else {
        ScorecardOrder::ArtName
    };

    let scorecards = if cfg.by_workstream {
        workstream_scorecards(&features, &config, order)
    } else {
        art_scorecards(&features, &config, order)
    };

    // The program summary rolls up by ART regardless of the card view, so
    // the ART count stays meaningful in the unrolled output.
    let rolled = art_scorecards(&features, &config, ScorecardOrder::ArtName);
    let label = cfg
        .pi
        .clone()
        .unwrap_or_else(|| config.pi.labels.join(", "));
    let summary = program_summary(&label, &rolled);
    // Story/point completion over the filtered feature set; stories count
    // via their parent feature's membership.
    let completion = pi_summary(&label, &features, &issues.stories, None);

    let report = Report::Pi {
        summary,
        completion,
        scorecards,
        diagnostics: issues.diagnostics,
    };
    create_writer(cfg.format, cfg.output)?.write_report(&report)
}

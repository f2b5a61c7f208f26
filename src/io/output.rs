use crate::core::{
    ArtScorecard, BurndownSeries, CycleTimeStats, Diagnostics, Feature, HealthBand, Measure,
    PiSummary, ProgramSummary, VelocitySeries,
};
use colored::*;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

/// One renderable report, paired with the diagnostics of the normalization
/// pass that produced its inputs so no skipped record goes unmentioned.
#[derive(Debug, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    Pi {
        summary: ProgramSummary,
        completion: PiSummary,
        scorecards: Vec<ArtScorecard>,
        diagnostics: Diagnostics,
    },
    Velocity {
        series: Vec<VelocitySeries>,
        diagnostics: Diagnostics,
    },
    CycleTime {
        stats: Vec<CycleTimeStats>,
        diagnostics: Diagnostics,
    },
    Burndown {
        series: BurndownSeries,
        diagnostics: Diagnostics,
    },
    Features {
        features: Vec<Feature>,
        diagnostics: Diagnostics,
    },
    Listing {
        title: String,
        values: Vec<String>,
    },
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        match report {
            Report::Pi {
                summary,
                completion,
                scorecards,
                diagnostics,
            } => {
                self.write_pi(summary, completion, scorecards)?;
                self.write_diagnostics(diagnostics)?;
            }
            Report::Velocity {
                series,
                diagnostics,
            } => {
                self.write_velocity(series)?;
                self.write_diagnostics(diagnostics)?;
            }
            Report::CycleTime { stats, diagnostics } => {
                self.write_cycle_time(stats)?;
                self.write_diagnostics(diagnostics)?;
            }
            Report::Burndown {
                series,
                diagnostics,
            } => {
                self.write_burndown(series)?;
                self.write_diagnostics(diagnostics)?;
            }
            Report::Features {
                features,
                diagnostics,
            } => {
                self.write_features(features)?;
                self.write_diagnostics(diagnostics)?;
            }
            Report::Listing { title, values } => {
                writeln!(self.writer, "# {title}")?;
                writeln!(self.writer)?;
                for value in values {
                    writeln!(self.writer, "- {value}")?;
                }
            }
        }
        Ok(())
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_features(&mut self, features: &[Feature]) -> anyhow::Result<()> {
        writeln!(self.writer, "# Features")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "| Key | Title | ART | Workstream | Status | Stories | Done | Committed | Delivered |"
        )?;
        writeln!(
            self.writer,
            "|-----|-------|-----|------------|--------|---------|------|-----------|-----------|"
        )?;
        for feature in features {
            writeln!(
                self.writer,
                "| {} | {} | {} | {} | {} | {} | {} | {:.0} | {:.0} |",
                feature.key,
                feature.title,
                feature.art_name(),
                feature.workstream.as_deref().unwrap_or("-"),
                feature.status.display_name(),
                feature.story_count,
                feature.done_story_count,
                feature.committed_points,
                feature.delivered_points,
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_pi(
        &mut self,
        summary: &ProgramSummary,
        completion: &PiSummary,
        scorecards: &[ArtScorecard],
    ) -> anyhow::Result<()> {
        writeln!(self.writer, "# PI Scorecard - {}", summary.pi_label)?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{} ARTs, {}/{} features done, {:.0}/{:.0} points delivered, predictability {}",
            summary.art_count,
            summary.done_feature_count,
            summary.feature_count,
            summary.delivered_points,
            summary.committed_points,
            fmt_percent(summary.predictability),
        )?;
        writeln!(
            self.writer,
            "Stories {}/{} done, {:.0}/{:.0} story points complete ({})",
            completion.completed_stories,
            completion.total_stories,
            completion.completed_points,
            completion.total_points,
            fmt_percent(completion.point_completion),
        )?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "| ART | Workstream | Features | Done | Committed | Delivered | Predictability | Health | Band |"
        )?;
        writeln!(
            self.writer,
            "|-----|------------|----------|------|-----------|-----------|----------------|--------|------|"
        )?;
        for card in scorecards {
            writeln!(
                self.writer,
                "| {} | {} | {} | {} | {:.0} | {:.0} | {} | {} | {} |",
                card.art,
                card.workstream.as_deref().unwrap_or("-"),
                card.feature_count,
                card.done_feature_count,
                card.committed_points,
                card.delivered_points,
                fmt_percent(card.predictability),
                fmt_score(card.health.score),
                band_label(card.health.band),
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_velocity(&mut self, series: &[VelocitySeries]) -> anyhow::Result<()> {
        writeln!(self.writer, "# Team Velocity")?;
        for team in series {
            writeln!(self.writer)?;
            writeln!(self.writer, "## {}", team.team)?;
            writeln!(self.writer)?;
            writeln!(
                self.writer,
                "| Sprint | Planned | Velocity | Rolling ({}) | Completion |",
                team.window
            )?;
            writeln!(
                self.writer,
                "|--------|---------|----------|--------------|------------|"
            )?;
            for (point, rolling) in team.points.iter().zip(&team.rolling) {
                writeln!(
                    self.writer,
                    "| {} | {:.0} | {:.0} | {:.1} | {} |",
                    point.sprint,
                    point.planned_points,
                    point.completed_points,
                    rolling,
                    fmt_percent(point.completion_rate),
                )?;
            }
            writeln!(self.writer)?;
            writeln!(
                self.writer,
                "Average velocity {}, completion rate {} (stddev {})",
                fmt_score(team.summary.average_velocity),
                fmt_percent(team.summary.completion_rate_mean),
                fmt_percent(team.summary.completion_rate_stddev),
            )?;
            if team.outlier_stories > 0 {
                writeln!(
                    self.writer,
                    "{} stories excluded for implausible sprint ordinals",
                    team.outlier_stories
                )?;
            }
        }
        Ok(())
    }

    fn write_cycle_time(&mut self, stats: &[CycleTimeStats]) -> anyhow::Result<()> {
        writeln!(self.writer, "# Cycle Time")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "| Team | Samples | In flight | Mean | Median | p{} | Anomalies |",
            stats.first().map_or(85, |s| s.percentile)
        )?;
        writeln!(
            self.writer,
            "|------|---------|-----------|------|--------|-----|-----------|"
        )?;
        for team in stats {
            writeln!(
                self.writer,
                "| {} | {} | {} | {} | {} | {} | {} |",
                team.team,
                team.samples.len(),
                team.in_flight,
                fmt_days(team.mean_days),
                fmt_days(team.median_days),
                fmt_days(team.percentile_days),
                team.negative_anomalies,
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_burndown(&mut self, series: &BurndownSeries) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "# Burndown - {} - {}",
            series.team, series.sprint
        )?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Scope {:.0} points over {} days from {}",
            series.scope_points, series.days, series.start
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Day | Date | Remaining | Ideal |")?;
        writeln!(self.writer, "|-----|------|-----------|-------|")?;
        for point in &series.points {
            writeln!(
                self.writer,
                "| {} | {} | {:.0} | {:.1} |",
                point.day, point.date, point.remaining_points, point.ideal_remaining,
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_diagnostics(&mut self, diagnostics: &Diagnostics) -> anyhow::Result<()> {
        writeln!(self.writer, "## Data Quality")?;
        writeln!(self.writer)?;
        for (label, count) in diagnostic_rows(diagnostics) {
            writeln!(self.writer, "- {label}: {count}")?;
        }
        Ok(())
    }
}

pub struct TerminalWriter;

impl Default for TerminalWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalWriter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputWriter for TerminalWriter {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        match report {
            Report::Pi {
                summary,
                completion,
                scorecards,
                diagnostics,
            } => {
                print_pi(summary, completion, scorecards);
                print_diagnostics(diagnostics);
            }
            Report::Velocity {
                series,
                diagnostics,
            } => {
                print_velocity(series);
                print_diagnostics(diagnostics);
            }
            Report::CycleTime { stats, diagnostics } => {
                print_cycle_time(stats);
                print_diagnostics(diagnostics);
            }
            Report::Burndown {
                series,
                diagnostics,
            } => {
                print_burndown(series);
                print_diagnostics(diagnostics);
            }
            Report::Features {
                features,
                diagnostics,
            } => {
                print_features(features);
                print_diagnostics(diagnostics);
            }
            Report::Listing { title, values } => {
                println!("{}", title.bold().blue());
                for value in values {
                    println!("  {value}");
                }
            }
        }
        Ok(())
    }
}

fn print_features(features: &[Feature]) {
    println!("{}", "Features".bold().blue());
    for feature in features {
        println!(
            "  {} {} [{}]",
            feature.key.bold(),
            feature.title,
            feature.status.display_name(),
        );
        println!(
            "    {} / {}, stories {}/{} done, points {:.0} committed / {:.0} delivered",
            feature.art_name(),
            feature.workstream.as_deref().unwrap_or("-"),
            feature.done_story_count,
            feature.story_count,
            feature.committed_points,
            feature.delivered_points,
        );
        if let Some(benefit) = &feature.business_benefit {
            println!("    {}", benefit.dimmed());
        }
    }
    println!();
}

fn print_pi(summary: &ProgramSummary, completion: &PiSummary, scorecards: &[ArtScorecard]) {
    println!(
        "{}",
        format!("PI Scorecard - {}", summary.pi_label).bold().blue()
    );
    println!(
        "  {} ARTs, {}/{} features done, {:.0}/{:.0} points, predictability {}",
        summary.art_count,
        summary.done_feature_count,
        summary.feature_count,
        summary.delivered_points,
        summary.committed_points,
        fmt_percent(summary.predictability),
    );
    println!(
        "  stories {}/{} done, points {:.0}/{:.0} complete ({})",
        completion.completed_stories,
        completion.total_stories,
        completion.completed_points,
        completion.total_points,
        fmt_percent(completion.point_completion),
    );
    println!();

    for card in scorecards {
        let name = match &card.workstream {
            Some(ws) => format!("{} / {}", card.art, ws),
            None => card.art.clone(),
        };
        println!("  {} [{}]", name.bold(), colored_band(card.health.band));
        println!(
            "    features: {}/{} done, points: {:.0} committed / {:.0} delivered",
            card.done_feature_count,
            card.feature_count,
            card.committed_points,
            card.delivered_points,
        );
        println!(
            "    predictability: {}, health: {}",
            colored_predictability(card.predictability),
            fmt_score(card.health.score),
        );
    }
    println!();
}

fn print_velocity(series: &[VelocitySeries]) {
    println!("{}", "Team Velocity".bold().blue());
    for team in series {
        println!();
        println!("  {}", team.team.bold());
        for (point, rolling) in team.points.iter().zip(&team.rolling) {
            println!(
                "    sprint {:>3}: {:>5.0} pts (rolling {:>5.1}, completion {})",
                point.sprint,
                point.completed_points,
                rolling,
                fmt_percent(point.completion_rate),
            );
        }
        println!(
            "    average {}, completion {} (stddev {})",
            fmt_score(team.summary.average_velocity),
            fmt_percent(team.summary.completion_rate_mean),
            fmt_percent(team.summary.completion_rate_stddev),
        );
        if team.outlier_stories > 0 {
            println!(
                "    {}",
                format!(
                    "{} stories excluded for implausible sprint ordinals",
                    team.outlier_stories
                )
                .yellow()
            );
        }
    }
    println!();
}

fn print_cycle_time(stats: &[CycleTimeStats]) {
    println!("{}", "Cycle Time".bold().blue());
    for team in stats {
        println!(
            "  {}: {} samples, {} in flight, mean {}, median {}, p{} {}{}",
            team.team.bold(),
            team.samples.len(),
            team.in_flight,
            fmt_days(team.mean_days),
            fmt_days(team.median_days),
            team.percentile,
            fmt_days(team.percentile_days),
            if team.negative_anomalies > 0 {
                format!(", {} anomalies", team.negative_anomalies).red().to_string()
            } else {
                String::new()
            },
        );
    }
    println!();
}

fn print_burndown(series: &BurndownSeries) {
    println!(
        "{}",
        format!("Burndown - {} - {}", series.team, series.sprint)
            .bold()
            .blue()
    );
    println!(
        "  scope {:.0} points over {} days from {}",
        series.scope_points, series.days, series.start
    );
    for point in &series.points {
        println!(
            "    day {:>2} ({}): {:>5.0} remaining (ideal {:>5.1})",
            point.day, point.date, point.remaining_points, point.ideal_remaining,
        );
    }
    let remaining = series.final_remaining();
    if remaining > 0.0 {
        println!(
            "  {}",
            format!("{remaining:.0} points not burned down").yellow()
        );
    } else {
        println!("  {}", "sprint fully burned down".green());
    }
    println!();
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    println!("{}", "Data quality:".bold());
    for (label, count) in diagnostic_rows(diagnostics) {
        let value = if label_is_anomaly(label) && count > 0 {
            count.to_string().yellow().to_string()
        } else {
            count.to_string()
        };
        println!("  {label}: {value}");
    }
}

fn diagnostic_rows(d: &Diagnostics) -> [(&'static str, usize); 10] {
    [
        ("records seen", d.records_seen),
        ("features", d.features),
        ("stories", d.stories),
        ("skipped (structurally invalid)", d.skipped_structural),
        ("ignored (not a feature or linked story)", d.ignored),
        ("malformed PI labels", d.malformed_pi_labels),
        ("dangling feature links", d.dangling_links),
        ("unestimated stories", d.unestimated_stories),
        ("unparsed sprint labels", d.unparsed_sprints),
        ("unparsed timestamps", d.unparsed_timestamps),
    ]
}

fn label_is_anomaly(label: &str) -> bool {
    !matches!(label, "records seen" | "features" | "stories")
}

fn fmt_percent(m: Measure<f64>) -> String {
    match m {
        Measure::Defined(v) => format!("{:.1}%", v * 100.0),
        Measure::Insufficient => "n/a".to_string(),
    }
}

fn fmt_score(m: Measure<f64>) -> String {
    match m {
        Measure::Defined(v) => format!("{v:.1}"),
        Measure::Insufficient => "n/a".to_string(),
    }
}

fn fmt_days(m: Measure<f64>) -> String {
    match m {
        Measure::Defined(v) => format!("{v:.1}d"),
        Measure::Insufficient => "n/a".to_string(),
    }
}

fn band_label(band: Option<HealthBand>) -> &'static str {
    match band {
        Some(HealthBand::Healthy) => "healthy",
        Some(HealthBand::AtRisk) => "at risk",
        Some(HealthBand::OffTrack) => "off track",
        None => "no data",
    }
}

fn colored_band(band: Option<HealthBand>) -> ColoredString {
    let label = band_label(band);
    match band {
        Some(HealthBand::Healthy) => label.green(),
        Some(HealthBand::AtRisk) => label.yellow(),
        Some(HealthBand::OffTrack) => label.red(),
        None => label.dimmed(),
    }
}

fn colored_predictability(m: Measure<f64>) -> String {
    match m {
        Measure::Defined(v) if v > 1.0 => {
            // Over-delivery is valid but worth a second look.
            format!("{:.1}%", v * 100.0).cyan().to_string()
        }
        Measure::Defined(v) if v >= 0.8 => format!("{:.1}%", v * 100.0).green().to_string(),
        Measure::Defined(v) => format!("{:.1}%", v * 100.0).yellow().to_string(),
        Measure::Insufficient => "n/a".dimmed().to_string(),
    }
}

/// Build a writer for the requested format. Json and Markdown honor an
/// output file; the terminal writer always prints to stdout.
pub fn create_writer(
    format: OutputFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<Box<dyn OutputWriter>> {
    let sink: Box<dyn Write> = match &output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    Ok(match format {
        OutputFormat::Json => Box::new(JsonWriter::new(sink)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(sink)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProgramSummary;

    fn summary() -> ProgramSummary {
        ProgramSummary {
            pi_label: "PI-4_Grading".to_string(),
            art_count: 1,
            feature_count: 3,
            done_feature_count: 2,
            committed_points: 60.0,
            delivered_points: 45.0,
            predictability: Measure::Defined(0.75),
        }
    }

    fn completion() -> PiSummary {
        PiSummary {
            pi_label: "PI-4_Grading".to_string(),
            workstream: None,
            total_features: 3,
            completed_features: 2,
            total_stories: 4,
            completed_stories: 3,
            total_points: 60.0,
            completed_points: 45.0,
            feature_completion: Measure::ratio(2.0, 3.0),
            story_completion: Measure::ratio(3.0, 4.0),
            point_completion: Measure::Defined(0.75),
        }
    }

    #[test]
    fn test_json_writer_emits_tagged_report() {
        let report = Report::Pi {
            summary: summary(),
            completion: completion(),
            scorecards: vec![],
            diagnostics: Diagnostics::default(),
        };
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer).write_report(&report).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["report"], "pi");
        assert_eq!(value["summary"]["predictability"], 0.75);
    }

    #[test]
    fn test_markdown_writer_renders_scorecard_table() {
        let report = Report::Pi {
            summary: summary(),
            completion: completion(),
            scorecards: vec![],
            diagnostics: Diagnostics::default(),
        };
        let mut buffer = Vec::new();
        MarkdownWriter::new(&mut buffer)
            .write_report(&report)
            .unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("# PI Scorecard - PI-4_Grading"));
        assert!(text.contains("predictability 75.0%"));
        assert!(text.contains("Stories 3/4 done"));
        assert!(text.contains("## Data Quality"));
    }

    #[test]
    fn test_measure_formatting() {
        assert_eq!(fmt_percent(Measure::Defined(0.75)), "75.0%");
        assert_eq!(fmt_percent(Measure::Insufficient), "n/a");
        assert_eq!(fmt_days(Measure::Defined(3.0)), "3.0d");
        assert_eq!(fmt_score(Measure::Insufficient), "n/a");
    }
}

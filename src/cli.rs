use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "trainmap")]
#[command(about = "PI predictability and team delivery metrics for agile release trains", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// ART scorecards: commitment vs delivery, predictability, health
    Pi {
        /// JSON issue export to analyze
        input: PathBuf,

        /// Configuration file (defaults to .trainmap.toml lookup)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Analyze a single PI label instead of the configured set
        #[arg(long)]
        pi: Option<String>,

        /// Restrict to one or more ARTs
        #[arg(long, value_delimiter = ',')]
        art: Vec<String>,

        /// Restrict to one or more workstreams
        #[arg(long, value_delimiter = ',')]
        workstream: Vec<String>,

        /// Unroll each ART into its workstreams
        #[arg(long = "by-workstream")]
        by_workstream: bool,

        /// Order scorecards by health instead of ART name
        #[arg(long = "sort-by-health")]
        sort_by_health: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Per-team velocity series with a trailing rolling average
    Velocity {
        /// JSON issue export to analyze
        input: PathBuf,

        /// Configuration file (defaults to .trainmap.toml lookup)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Restrict to one or more teams
        #[arg(long, value_delimiter = ',')]
        team: Vec<String>,

        /// Rolling average window (overrides configuration)
        #[arg(long)]
        window: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Per-team cycle-time distributions
    CycleTime {
        /// JSON issue export to analyze
        input: PathBuf,

        /// Configuration file (defaults to .trainmap.toml lookup)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Restrict to one or more teams
        #[arg(long, value_delimiter = ',')]
        team: Vec<String>,

        /// Only stories created on or after this date (inclusive)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only stories created on or before this date (inclusive)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Percentile to report next to the median (overrides configuration)
        #[arg(long)]
        percentile: Option<u8>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reconstructed sprint burndown for one team and sprint
    Burndown {
        /// JSON issue export to analyze
        input: PathBuf,

        /// Configuration file (defaults to .trainmap.toml lookup)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Team to burn down
        #[arg(long)]
        team: String,

        /// Sprint label, e.g. "Sprint 14"
        #[arg(long)]
        sprint: String,

        /// First day of the sprint
        #[arg(long)]
        start: NaiveDate,

        /// Sprint length in days
        #[arg(long, default_value = "14")]
        days: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Per-feature detail listing with story rollups
    Features {
        /// JSON issue export to analyze
        input: PathBuf,

        /// Configuration file (defaults to .trainmap.toml lookup)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Restrict to one or more ARTs
        #[arg(long, value_delimiter = ',')]
        art: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the configured PI labels present in an export
    Pis {
        /// JSON issue export to analyze
        input: PathBuf,

        /// Configuration file (defaults to .trainmap.toml lookup)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// List the teams present in an export
    Teams {
        /// JSON issue export to analyze
        input: PathBuf,

        /// Configuration file (defaults to .trainmap.toml lookup)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

impl From<OutputFormat> for crate::io::output::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => crate::io::output::OutputFormat::Json,
            OutputFormat::Markdown => crate::io::output::OutputFormat::Markdown,
            OutputFormat::Terminal => crate::io::output::OutputFormat::Terminal,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

use anyhow::Result;
use clap::Parser;
use trainmap::cli::{Cli, Commands};
use trainmap::commands::{
    burndown_report, cycle_time_report, features_report, init_config, list_pis, list_teams,
    pi_report, velocity_report, BurndownReportConfig, CycleTimeReportConfig, DiscoverConfig,
    FeaturesReportConfig, PiReportConfig, VelocityReportConfig,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Pi {
            input,
            config,
            pi,
            art,
            workstream,
            by_workstream,
            sort_by_health,
            format,
            output,
        } => pi_report(PiReportConfig {
            input,
            config,
            pi,
            art,
            workstream,
            by_workstream,
            sort_by_health,
            format: format.into(),
            output,
        }),

        Commands::Velocity {
            input,
            config,
            team,
            window,
            format,
            output,
        } => velocity_report(VelocityReportConfig {
            input,
            config,
            team,
            window,
            format: format.into(),
            output,
        }),

        Commands::CycleTime {
            input,
            config,
            team,
            from,
            to,
            percentile,
            format,
            output,
        } => cycle_time_report(CycleTimeReportConfig {
            input,
            config,
            team,
            from,
            to,
            percentile,
            format: format.into(),
            output,
        }),

        Commands::Burndown {
            input,
            config,
            team,
            sprint,
            start,
            days,
            format,
            output,
        } => burndown_report(BurndownReportConfig {
            input,
            config,
            team,
            sprint,
            start,
            days,
            format: format.into(),
            output,
        }),

        Commands::Features {
            input,
            config,
            art,
            format,
            output,
        } => features_report(FeaturesReportConfig {
            input,
            config,
            art,
            format: format.into(),
            output,
        }),

        Commands::Pis {
            input,
            config,
            format,
        } => list_pis(DiscoverConfig {
            input,
            config,
            format: format.into(),
        }),

        Commands::Teams {
            input,
            config,
            format,
        } => list_teams(DiscoverConfig {
            input,
            config,
            format: format.into(),
        }),

        Commands::Init { force } => init_config(force),
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

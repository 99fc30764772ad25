//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Waypoint: run mission-planner editor scenarios against chromium
#[derive(Parser, Debug)]
#[command(name = "waypoint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List scenarios and the cases they cover
    List(ListArgs),

    /// Run scenarios in fresh chromium pages
    Run(RunArgs),

    /// Validate a suite configuration file
    CheckConfig(CheckConfigArgs),
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite configuration (YAML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Only scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Where to write the JSON run report
    #[arg(short, long, default_value = "target/waypoint/report.json")]
    pub report: PathBuf,

    /// Directory for failure screenshots
    #[arg(long, default_value = "target/waypoint/screenshots")]
    pub artifacts: PathBuf,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the check-config command
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Suite configuration (YAML)
    pub config: PathBuf,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Detect terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "waypoint",
            "-vv",
            "--log-json",
            "run",
            "--config",
            "suite.yaml",
            "--filter",
            "site",
            "--headed",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("suite.yaml"));
        assert_eq!(args.filter.as_deref(), Some("site"));
        assert!(args.headed);
        assert_eq!(args.report, PathBuf::from("target/waypoint/report.json"));
    }

    #[test]
    fn test_run_requires_config() {
        assert!(Cli::try_parse_from(["waypoint", "run"]).is_err());
    }

    #[test]
    fn test_parse_check_config() {
        let cli = Cli::try_parse_from(["waypoint", "check-config", "suite.yaml"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(cli.command, Commands::CheckConfig(_)));
    }
}

//! Waypoint CLI Library
//!
//! Command-line runner for the Waypoint mission-planner scenarios.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{CheckConfigArgs, Cli, ColorArg, Commands, ListArgs, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::SuiteRunner;

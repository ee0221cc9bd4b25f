// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `reactive-command`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reactive-command",
    version,
    about = "Execute a scenario of reactive commands and trace every channel notification.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the scenario file (TOML).
    ///
    /// Default: `Scenario.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Scenario.toml")]
    pub scenario: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `REACTIVE_COMMAND_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the commands, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

//! Command-line interface definitions for casetest.
//!
//! Mirrors the teacher's `cli.rs` structure: a top-level `Cli` holding a
//! `Commands` subcommand enum, with `run`/`validate` sharing a
//! `CommonArgs` struct and a `completions` command for shell integration.

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;

/// Top-level CLI structure for casetest.
#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// The available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the configured tests through create/configure/build/run.
    Run(RunArgs),

    /// Validate the given YAML run profile without executing anything.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),
}

/// Arguments shared by `run` and `validate`.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to the YAML file defining the run profile.
    #[arg(short, long, default_value = "profile.yaml", value_hint = ValueHint::FilePath)]
    pub file: Utf8PathBuf,

    /// Log verbosity, from `trace` (most) to `error` (least).
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the `completions` command.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Maps directly onto `tracing`'s level filters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Parses command-line arguments into a `Cli`.
pub fn parse_args() -> Result<Cli> {
    Ok(Cli::parse())
}

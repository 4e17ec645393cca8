//! Command execution abstraction for casetest.
//!
//! This module provides:
//! - [`CommandSpec`]: specification for a command to execute
//! - [`ExecutionResult`]: result of command execution, including captured output
//! - [`CommandExecutor`]: trait for command execution strategies
//! - [`RealCommandExecutor`]: production implementation using `std::process::Command`
//!
//! Phase handlers build a [`CommandSpec`] and hand it to a shared
//! `Arc<dyn CommandExecutor>`; the executor is the only part of the system
//! that shells out, which keeps the scheduler and phase handlers testable
//! with a fake in their place.

mod pipe;
mod real;

use camino::Utf8PathBuf;
use std::process::ExitStatus;

pub use real::RealCommandExecutor;

/// Specification for a command to be executed.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The command to execute (e.g. "create_newcase").
    pub command: String,
    /// Command arguments.
    pub args: Vec<String>,
    /// Working directory (optional, defaults to current directory).
    pub cwd: Option<Utf8PathBuf>,
}

impl CommandSpec {
    /// Creates a new `CommandSpec` with command and args.
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            cwd: None,
        }
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: Utf8PathBuf) -> Self {
        self.cwd = Some(cwd);
        self
    }

    /// Formats the command and args the way they would appear on a shell
    /// command line, for diagnostic logging.
    pub fn display_command(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Standard output captured from the command.
    pub stdout: String,
    /// Standard error captured from the command.
    pub stderr: String,
}

impl ExecutionResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Trait for command execution.
///
/// Implementations must be `Send + Sync` to allow the executor to be shared
/// across consumer threads via `Arc<dyn CommandExecutor>`.
pub trait CommandExecutor: Send + Sync {
    /// Executes a command with the given specification.
    ///
    /// Never returns `Err` for a command that ran and exited non-zero —
    /// that is reported via `ExecutionResult::success()`. `Err` is reserved
    /// for the command genuinely failing to run (not found, spawn failure).
    fn execute(&self, spec: &CommandSpec) -> anyhow::Result<ExecutionResult>;
}

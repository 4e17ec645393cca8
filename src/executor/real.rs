//! Real command executor implementation.
//!
//! This module provides [`RealCommandExecutor`], which executes commands
//! using `std::process::Command` with real-time output streaming.

use std::process::{Child, Command, Stdio};
use std::thread;
use std::thread::JoinHandle;

use anyhow::Result;
use which::which;

use super::pipe::{StreamType, panic_message, read_pipe_to_log};
use super::{CommandExecutor, CommandSpec, ExecutionResult};

/// Kills a child process and joins its reader threads, to avoid leaking
/// either the process or the threads on an error path.
fn cleanup_child_process(child: &mut Child, handles: Vec<JoinHandle<String>>) {
    let pid = child.id();
    if let Err(e) = child.kill() {
        tracing::debug!(pid = pid, "kill returned error (process may have already exited): {}", e);
    }
    if let Err(e) = child.wait() {
        tracing::warn!(pid = pid, "failed to wait for child process after kill: {}", e);
    }
    for handle in handles {
        if let Err(e) = handle.join() {
            tracing::warn!("reader thread panicked during cleanup: {}", panic_message(&*e));
        }
    }
}

/// Command executor that runs actual system commands, streaming their
/// stdout/stderr to the structured log while also capturing them for
/// the caller's diagnostic block.
pub struct RealCommandExecutor;

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        let program = which(&spec.command).map_err(|e| {
            crate::error::CasetestError::Execution {
                command: spec.command.clone(),
                status: format!("command not found: {}", e),
            }
        })?;
        tracing::trace!("command found: {}: {}", spec.command, program.display());

        let mut command = Command::new(&program);
        command.args(&spec.args);
        if let Some(ref cwd) = spec.cwd {
            command.current_dir(cwd.as_std_path());
        }
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| crate::error::CasetestError::Execution {
            command: spec.command.clone(),
            status: format!("failed to spawn: {}", e),
        })?;

        tracing::trace!("spawned command: {}: pid={}", spec.command, child.id());

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let stdout_handle = thread::Builder::new()
            .name("stdout-reader".to_string())
            .spawn(move || read_pipe_to_log(stdout_pipe, StreamType::Stdout))
            .map_err(|e| crate::error::CasetestError::Execution {
                command: spec.command.clone(),
                status: format!("failed to spawn stdout reader thread: {}", e),
            })?;

        let stderr_handle = match thread::Builder::new()
            .name("stderr-reader".to_string())
            .spawn(move || read_pipe_to_log(stderr_pipe, StreamType::Stderr))
        {
            Ok(handle) => handle,
            Err(e) => {
                cleanup_child_process(&mut child, vec![stdout_handle]);
                return Err(crate::error::CasetestError::Execution {
                    command: spec.command.clone(),
                    status: format!("failed to spawn stderr reader thread: {}", e),
                }
                .into());
            }
        };

        let status = match child.wait() {
            Ok(s) => s,
            Err(e) => {
                cleanup_child_process(&mut child, vec![stdout_handle, stderr_handle]);
                return Err(crate::error::CasetestError::Execution {
                    command: spec.command.clone(),
                    status: format!("failed to wait: {}", e),
                }
                .into());
            }
        };

        let stdout = stdout_handle.join().unwrap_or_else(|e| {
            tracing::error!(stream = "stdout", panic = panic_message(&*e), "reader thread panicked");
            String::new()
        });
        let stderr = stderr_handle.join().unwrap_or_else(|e| {
            tracing::error!(stream = "stderr", panic = panic_message(&*e), "reader thread panicked");
            String::new()
        });

        tracing::trace!("executed command: {}: success={}", spec.command, status.success());

        Ok(ExecutionResult { status, stdout, stderr })
    }
}

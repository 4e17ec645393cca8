pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod log_sink;
pub mod phase;
pub mod scheduler;
pub mod state_table;
pub mod status;
pub mod testname;

pub use error::CasetestError;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::executor::{CommandExecutor, RealCommandExecutor};
use crate::scheduler::Scheduler;

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(FmtSubscriber::builder().with_max_level(filter).finish())
        .context("failed to set global default tracing subscriber")
}

/// Loads, validates, and runs the configured tests to completion.
///
/// Returns `Ok(true)` iff every test ended `Pass`/`Pending` and is not
/// namelist soft-failed; the caller maps this onto the process exit code.
pub fn run_run(opts: &cli::RunArgs) -> Result<bool> {
    let config = config::load_run_profile(opts.common.file.as_path())
        .with_context(|| format!("failed to load run profile from {}", opts.common.file))?;
    config.validate().context("run profile validation failed")?;

    let executor: Arc<dyn CommandExecutor> = Arc::new(RealCommandExecutor);
    let scheduler = Arc::new(Scheduler::new(config, executor).context("failed to construct scheduler")?);
    Ok(scheduler.run())
}

pub fn run_validate(opts: &cli::ValidateArgs) -> Result<()> {
    let config = config::load_run_profile(opts.common.file.as_path())
        .with_context(|| format!("failed to load run profile from {}", opts.common.file))?;
    config.validate().context("run profile validation failed")?;
    info!("validation successful:\n{:#?}", config);
    Ok(())
}

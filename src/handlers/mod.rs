//! Phase handlers.
//!
//! Each handler is a pure function of the shared run configuration and a
//! test name: it builds the right external command (or filesystem
//! operation), runs it, and returns a [`PhaseOutcome`]. Handlers never
//! touch the state table directly — the consumer applies the outcome
//! under the table's lock (see [`crate::scheduler`]).

mod build;
mod create_newcase;
mod namelist;
mod run;
mod setup;
mod xml;

use camino::Utf8PathBuf;

use crate::config::RunConfig;
use crate::executor::CommandExecutor;
use crate::phase::Phase;

/// What a phase handler invocation produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseOutcome {
    pub success: bool,
    /// Set only by the `Namelist` handler when a comparison found
    /// differences; `success` remains `true` in that case.
    pub namelist_soft_fail: bool,
}

impl PhaseOutcome {
    pub(crate) fn ok() -> Self {
        Self { success: true, namelist_soft_fail: false }
    }

    pub(crate) fn failed() -> Self {
        Self { success: false, namelist_soft_fail: false }
    }

    pub(crate) fn soft_failed() -> Self {
        Self { success: true, namelist_soft_fail: true }
    }
}

/// Shared, immutable context handed to every phase handler.
pub struct HandlerContext<'a> {
    pub config: &'a RunConfig,
    pub executor: &'a dyn CommandExecutor,
}

impl<'a> HandlerContext<'a> {
    pub fn test_dir(&self, test_name: &str) -> Utf8PathBuf {
        self.config.test_dir(test_name)
    }
}

pub type Handler = fn(&HandlerContext, &str) -> PhaseOutcome;

/// Runs `spec` under `ctx`, logs a PASSED/FAILED block to the test's
/// diagnostic log, and converts the result into a [`PhaseOutcome`].
///
/// Shared by every handler that ultimately boils down to "invoke an
/// external command and check its exit status" — `create_newcase`, `xml`,
/// `setup`, `build`, `run`.
pub(crate) fn run_logged(
    ctx: &HandlerContext,
    phase: Phase,
    test_name: &str,
    spec: &crate::executor::CommandSpec,
) -> PhaseOutcome {
    let test_dir = ctx.test_dir(test_name);
    let command = spec.display_command();

    let result = match ctx.executor.execute(spec) {
        Ok(result) => result,
        Err(e) => {
            let _ = crate::log_sink::log_note(&test_dir, &format!("{phase} could not be started: {e:#}"));
            tracing::error!(test = test_name, phase = %phase, "{:#}", e);
            return PhaseOutcome::failed();
        }
    };

    if let Err(e) = crate::log_sink::log_phase_result(
        &test_dir,
        phase,
        test_name,
        &command,
        &result.stdout,
        &result.stderr,
        result.success(),
    ) {
        tracing::warn!(test = test_name, phase = %phase, "failed to write diagnostic log: {:#}", e);
    }

    if result.success() { PhaseOutcome::ok() } else { PhaseOutcome::failed() }
}

/// Looks up the handler for `phase`. Panics for `Init`, which never has one.
pub fn dispatch(phase: Phase) -> Handler {
    match phase {
        Phase::Init => panic!("Init phase has no handler"),
        Phase::CreateNewcase => create_newcase::run,
        Phase::Xml => xml::run,
        Phase::Setup => setup::run,
        Phase::Namelist => namelist::run,
        Phase::Build => build::run,
        Phase::Run => run::run,
    }
}

//! The phase scheduler: a single producer admits work under a CPU budget,
//! a pool of consumers executes it.
//!
//! The state table, CPU budget, and work queue are bundled into one
//! `Mutex<SchedulerCore>` — the "single owner, mutex-guarded record"
//! equivalent of an actor. All filesystem operations and external command
//! invocations happen outside the lock; only state reads/writes and queue
//! operations happen inside it.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::CasetestError;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::handlers::{self, HandlerContext};
use crate::log_sink;
use crate::phase::{Phase, Status};
use crate::state_table::StateTable;
use crate::status::{self, StatusRecord};

const PRODUCER_POLL: Duration = Duration::from_secs(1);
const CONSUMER_IDLE_POLL: Duration = Duration::from_secs(5);

struct WorkItem {
    test_name: String,
    phase: Phase,
    procs: u32,
}

struct SchedulerCore {
    state: StateTable,
    budget: u32,
    queue: VecDeque<WorkItem>,
    parallel_jobs: usize,
}

/// Drives every configured test through its phases to completion.
pub struct Scheduler {
    core: Mutex<SchedulerCore>,
    config: Arc<RunConfig>,
    executor: Arc<dyn CommandExecutor>,
}

impl Scheduler {
    /// Builds a scheduler for `config`. Fails pre-flight if any target
    /// test directory already exists, before any thread starts.
    pub fn new(config: RunConfig, executor: Arc<dyn CommandExecutor>) -> Result<Self, CasetestError> {
        for name in &config.tests {
            let dir = config.test_dir(name);
            if dir.exists() {
                return Err(CasetestError::Validation(format!("test directory already exists: {dir}")));
            }
        }

        let phases = config.active_phases();
        let state = StateTable::new(&config.tests, phases);
        let budget = config.initial_cpu_budget();
        let parallel_jobs = config.parallel_jobs;

        Ok(Self {
            core: Mutex::new(SchedulerCore { state, budget, queue: VecDeque::new(), parallel_jobs }),
            config: Arc::new(config),
            executor,
        })
    }

    /// Runs every test to completion and returns the overall summary:
    /// `true` iff every test ended `Pass`/`Pending` and not namelist
    /// soft-failed.
    pub fn run(self: Arc<Self>) -> bool {
        let producer = {
            let scheduler = Arc::clone(&self);
            thread::spawn(move || scheduler.run_producer())
        };

        let parallel_jobs = { self.core.lock().unwrap().parallel_jobs };
        let consumers: Vec<_> = (0..parallel_jobs)
            .map(|id| {
                let scheduler = Arc::clone(&self);
                thread::Builder::new()
                    .name(format!("consumer-{id}"))
                    .spawn(move || scheduler.run_consumer())
                    .expect("failed to spawn consumer thread")
            })
            .collect();

        producer.join().expect("producer thread panicked");
        for consumer in consumers {
            consumer.join().expect("consumer thread panicked");
        }

        self.summarize()
    }

    fn run_producer(&self) {
        loop {
            let candidates = {
                let core = self.core.lock().unwrap();
                let last = *core.state.phases().last().expect("non-empty phase list");
                core.state
                    .names()
                    .filter(|name| {
                        let entry = core.state.get(name);
                        entry.status() != Status::Pending && entry.work_remains(last)
                    })
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            };

            if candidates.is_empty() {
                let still_live = self.core.lock().unwrap().state.num_live() > 0;
                if !still_live {
                    return;
                }
                thread::sleep(PRODUCER_POLL);
                continue;
            }

            for test_name in candidates {
                let next_phase = {
                    let core = self.core.lock().unwrap();
                    let phases = core.state.phases();
                    let current = core.state.get(&test_name).phase();
                    let index = phases.iter().position(|p| *p == current).expect("current phase is in phase list");
                    phases[index + 1]
                };

                let procs_needed = self.procs_needed(&test_name, next_phase);

                let mut core = self.core.lock().unwrap();
                if procs_needed <= core.budget {
                    core.budget -= procs_needed;
                    core.state.advance(&test_name);
                    core.queue.push_back(WorkItem { test_name, phase: next_phase, procs: procs_needed });
                }
            }

            thread::sleep(PRODUCER_POLL);
        }
    }

    /// `1` for every phase except `Run` in no-batch mode, where it reads
    /// `TOTALPES` from the test directory via `xmlquery`.
    fn procs_needed(&self, test_name: &str, phase: Phase) -> u32 {
        if phase != Phase::Run || !self.config.no_batch {
            return 1;
        }

        let spec = CommandSpec::new(self.config.helpers.xmlquery.clone(), vec!["TOTALPES".to_string()])
            .with_cwd(self.config.test_dir(test_name));
        match self.executor.execute(&spec) {
            Ok(result) if result.success() => result.stdout.trim().parse().unwrap_or(1),
            _ => 1,
        }
    }

    fn run_consumer(&self) {
        loop {
            let item = { self.core.lock().unwrap().queue.pop_front() };

            let Some(item) = item else {
                let mut core = self.core.lock().unwrap();
                let num_live = core.state.num_live();
                if num_live < core.parallel_jobs {
                    core.parallel_jobs -= 1;
                    return;
                }
                drop(core);
                thread::sleep(CONSUMER_IDLE_POLL);
                continue;
            };

            let ctx = HandlerContext { config: &self.config, executor: self.executor.as_ref() };
            let handler = handlers::dispatch(item.phase);
            let test_name = item.test_name.clone();
            let phase = item.phase;

            let started = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&ctx, &test_name)));
            let elapsed = started.elapsed();

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .copied()
                        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                        .unwrap_or("unknown panic");
                    tracing::error!(test = %test_name, phase = %phase, "handler panicked: {message}");
                    let _ = log_sink::log_note(
                        &self.config.test_dir(&test_name),
                        &format!("{phase} handler panicked: {message}"),
                    );
                    handlers::PhaseOutcome { success: false, namelist_soft_fail: false }
                }
            };

            let status = if outcome.success {
                if phase == Phase::Run && !self.config.no_batch { Status::Pending } else { Status::Pass }
            } else {
                Status::Fail
            };

            let mut core = self.core.lock().unwrap();
            if outcome.namelist_soft_fail {
                core.state.mark_namelist_soft_fail(&test_name);
            }
            core.state.resolve(&test_name, phase, status);
            core.budget += item.procs;
            drop(core);

            self.persist_status(&test_name, phase, status);

            info!(test = %test_name, phase = %phase, status = %status, elapsed_ms = elapsed.as_millis(), "phase complete");
        }
    }

    /// Applies the Status Persister triggers of the design: write on a
    /// successful non-`Run` transition landing on `Build` or the last
    /// phase, on any non-`Run` failure, and special-cased for `Run`
    /// failures against an existing file.
    fn persist_status(&self, test_name: &str, phase: Phase, status: Status) {
        let test_dir = self.config.test_dir(test_name);
        let phases = { self.core.lock().unwrap().state.phases().to_vec() };
        let last_phase = *phases.last().expect("non-empty phase list");

        let should_write = match phase {
            Phase::Run => status == Status::Fail,
            _ => status == Status::Fail || phase == Phase::Build || phase == last_phase,
        };

        if phase == Phase::Run && status == Status::Fail {
            if status::status_file_exists(&test_dir) {
                if let Ok(existing) = status::read_status_file(&test_dir)
                    && let Some(recorded) = status::recorded_status(&existing, Phase::Run)
                    && matches!(recorded, Status::Pass | Status::Pending)
                {
                    let _ = log_sink::log_very_bad(
                        &test_dir,
                        &format!("Run handler reported failure but TestStatus already recorded {recorded}"),
                    );
                    return;
                }
            }
        }

        if !should_write {
            return;
        }

        let records = self.build_status_records(test_name, &phases);
        if let Err(e) = status::write_status_file(&test_dir, &records) {
            let _ = log_sink::log_very_bad(&test_dir, &format!("failed to write TestStatus: {e}"));
        }
    }

    fn build_status_records(&self, test_name: &str, phases: &[Phase]) -> Vec<StatusRecord> {
        let core = self.core.lock().unwrap();
        let current = core.state.get(test_name).phase();
        let current_index = phases.iter().position(|p| *p == current).expect("current phase is in phase list");

        let mut records: Vec<StatusRecord> = phases[1..=current_index]
            .iter()
            .map(|&phase| StatusRecord { status: core.state.status_at(test_name, phase), test_name: test_name.to_string(), phase })
            .collect();

        let run_expected = !self.config.no_run && !core.state.get(test_name).is_broken() && current_index >= phases.iter().position(|p| *p == Phase::Build).unwrap_or(usize::MAX);
        let run_already_recorded = records.iter().any(|r| r.phase == Phase::Run);
        if run_expected && !run_already_recorded {
            records.push(StatusRecord { status: Status::Pending, test_name: test_name.to_string(), phase: Phase::Run });
        }

        records
    }

    /// `true` iff every test ended in `Pass`/`Pending` and is not in the
    /// namelist soft-fail set.
    fn summarize(&self) -> bool {
        let core = self.core.lock().unwrap();
        core.state.names().all(|name| {
            let entry = core.state.get(name);
            matches!(entry.status(), Status::Pass | Status::Pending) && !entry.nl_soft_failed()
        })
    }
}

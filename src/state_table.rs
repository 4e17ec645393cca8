//! In-memory per-test state: current phase/status plus the namelist
//! soft-fail side table.
//!
//! The table enforces every transition invariant itself rather than
//! trusting callers — an illegal transition is a programming error in the
//! scheduler and aborts the process loudly, matching the design note on
//! state-machine violations.

use std::collections::HashMap;

use crate::phase::{Phase, Status};

/// One test's place in the pipeline.
#[derive(Debug, Clone)]
pub struct TestEntry {
    pub name: String,
    phase: Phase,
    status: Status,
    nl_soft_failed: bool,
}

impl TestEntry {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: Phase::Init,
            status: Status::Pass,
            nl_soft_failed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn nl_soft_failed(&self) -> bool {
        self.nl_soft_failed
    }

    /// A test whose current status is terminal and not in CONTINUE.
    pub fn is_broken(&self) -> bool {
        matches!(self.status, Status::Fail)
    }

    /// Whether this test still has phase work ahead of it.
    pub fn work_remains(&self, last_phase: Phase) -> bool {
        let still_going = self.status.can_continue() || self.status == Status::Pending;
        still_going && self.phase != last_phase
    }
}

/// Map of `test_name -> TestEntry`, the "Test State Table" of the design.
///
/// All mutating methods assume the caller holds the enclosing scheduler
/// lock; this type performs no locking of its own.
#[derive(Debug)]
pub struct StateTable {
    entries: HashMap<String, TestEntry>,
    phases: Vec<Phase>,
}

impl StateTable {
    /// Creates one `TestEntry` per name, all starting at `(Init, Pass)`.
    pub fn new(test_names: &[String], phases: Vec<Phase>) -> Self {
        let entries = test_names
            .iter()
            .map(|name| (name.clone(), TestEntry::new(name)))
            .collect();
        Self { entries, phases }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    fn last_phase(&self) -> Phase {
        *self.phases.last().expect("phase list is never empty")
    }

    fn next_phase(&self, phase: Phase) -> Phase {
        let index = self
            .phases
            .iter()
            .position(|p| *p == phase)
            .unwrap_or_else(|| panic!("phase {phase} is not part of the configured phase list"));
        *self
            .phases
            .get(index + 1)
            .unwrap_or_else(|| panic!("phase {phase} has no successor"))
    }

    pub fn get(&self, name: &str) -> &TestEntry {
        self.entries
            .get(name)
            .unwrap_or_else(|| panic!("unknown test: {name}"))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tests that still have phase work ahead of them.
    pub fn num_live(&self) -> usize {
        let last = self.last_phase();
        self.entries.values().filter(|e| e.work_remains(last)).count()
    }

    /// Status reported for `phase` on `name`, per the historical-status rule:
    /// the live status for the current phase, `Pass` for any earlier phase
    /// except a soft-failed `Namelist`. Asking about a future phase panics.
    pub fn status_at(&self, name: &str, phase: Phase) -> Status {
        let entry = self.get(name);
        let current_index = self.phase_index(entry.phase);
        let asked_index = self.phase_index(phase);

        if asked_index > current_index {
            panic!("status_at: {name} has not reached {phase} yet");
        }
        if asked_index == current_index {
            return entry.status;
        }
        if phase == Phase::Namelist && entry.nl_soft_failed {
            return Status::NamelistFail;
        }
        Status::Pass
    }

    fn phase_index(&self, phase: Phase) -> usize {
        self.phases
            .iter()
            .position(|p| *p == phase)
            .unwrap_or_else(|| panic!("phase {phase} is not part of the configured phase list"))
    }

    /// Transitions `name` from `(phase, Pending)` to `(phase, Pending|status)`
    /// where `status != Pending`. Panics if `name` is not currently `Pending`
    /// in `phase`.
    pub fn resolve(&mut self, name: &str, phase: Phase, status: Status) {
        let entry = self
            .entries
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown test: {name}"));
        assert_eq!(
            entry.phase, phase,
            "resolve: {name} is in phase {:?}, not {:?}",
            entry.phase, phase
        );
        assert_eq!(
            entry.status,
            Status::Pending,
            "resolve: {name} is not Pending in {:?} (state machine violation)",
            phase
        );
        assert_ne!(status, Status::Pending, "resolve: cannot resolve Pending -> Pending");
        entry.status = status;
    }

    /// Advances `name` to its next phase with status `Pending`. Only legal
    /// from a status in `CONTINUE`.
    pub fn advance(&mut self, name: &str) {
        let next = {
            let entry = self.get(name);
            assert!(
                entry.status.can_continue(),
                "advance: {name} cannot advance from status {:?} (state machine violation)",
                entry.status
            );
            self.next_phase(entry.phase)
        };
        let entry = self
            .entries
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown test: {name}"));
        entry.phase = next;
        entry.status = Status::Pending;
    }

    /// Marks `name`'s namelist comparison as soft-failed. Only callable
    /// while `name`'s current phase is `Namelist`.
    pub fn mark_namelist_soft_fail(&mut self, name: &str) {
        let entry = self
            .entries
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown test: {name}"));
        assert_eq!(
            entry.phase,
            Phase::Namelist,
            "mark_namelist_soft_fail: {name} is not in the Namelist phase"
        );
        entry.nl_soft_failed = true;
    }
}

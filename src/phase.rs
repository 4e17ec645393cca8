//! The fixed phase sequence and the status a test can hold within it.
//!
//! `Phase` and `Status` are closed tagged enums rather than strings, so the
//! phase → handler dispatch table (see [`crate::handlers`]) is an exhaustive
//! `match` the compiler checks, instead of the name-mangled reflection the
//! original driver used.

use std::str::FromStr;

use strum::{Display, EnumIter, EnumString};

/// One stage of the fixed build/run pipeline for a single test case.
///
/// `Init` is the synthetic starting phase and never has a handler. The
/// remaining phases always occur in this order, though `Namelist`,
/// `Build`, and `Run` may be configured out of a given run (see
/// [`crate::config::RunConfig::active_phases`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
pub enum Phase {
    #[strum(serialize = "INIT")]
    Init,
    #[strum(serialize = "CREATE_NEWCASE")]
    CreateNewcase,
    #[strum(serialize = "XML")]
    Xml,
    #[strum(serialize = "SETUP")]
    Setup,
    #[strum(serialize = "NAMELIST")]
    Namelist,
    #[strum(serialize = "BUILD")]
    Build,
    #[strum(serialize = "RUN")]
    Run,
}

impl Phase {
    /// Parses a phase from its `TestStatus` textual form (e.g. `"BUILD"`).
    pub fn parse(s: &str) -> Result<Self, crate::error::CasetestError> {
        Phase::from_str(s).map_err(|_| crate::error::CasetestError::StateMachine(format!("unknown phase: {s}")))
    }
}

/// The status of a test within its current phase.
///
/// `CONTINUE` (see [`Status::can_continue`]) is the set of statuses from
/// which a test is still permitted to advance to the next phase: a plain
/// pass, or a namelist soft-fail (which is reported but does not arrest
/// the pipeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum Status {
    #[strum(serialize = "PASS")]
    Pass,
    #[strum(serialize = "FAIL")]
    Fail,
    #[strum(serialize = "PENDING")]
    Pending,
    #[strum(serialize = "NAMELIST_FAIL")]
    NamelistFail,
}

impl Status {
    /// True for the statuses from which a test may advance to its next phase.
    pub fn can_continue(self) -> bool {
        matches!(self, Status::Pass | Status::NamelistFail)
    }

    /// Parses a status from its `TestStatus` textual form (e.g. `"PASS"`).
    pub fn parse(s: &str) -> Result<Self, crate::error::CasetestError> {
        Status::from_str(s)
            .map_err(|_| crate::error::CasetestError::StateMachine(format!("unknown status: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display_matches_testdb_grammar() {
        assert_eq!(Phase::CreateNewcase.to_string(), "CREATE_NEWCASE");
        assert_eq!(Phase::Run.to_string(), "RUN");
    }

    #[test]
    fn phase_round_trips_through_parse() {
        for phase in [Phase::Init, Phase::Xml, Phase::Setup, Phase::Namelist, Phase::Build, Phase::Run] {
            assert_eq!(Phase::parse(&phase.to_string()).unwrap(), phase);
        }
    }

    #[test]
    fn status_can_continue() {
        assert!(Status::Pass.can_continue());
        assert!(Status::NamelistFail.can_continue());
        assert!(!Status::Fail.can_continue());
        assert!(!Status::Pending.can_continue());
    }

    #[test]
    fn status_display_matches_testdb_grammar() {
        assert_eq!(Status::NamelistFail.to_string(), "NAMELIST_FAIL");
    }

    #[test]
    fn unknown_phase_is_rejected() {
        assert!(Phase::parse("BOGUS").is_err());
    }
}

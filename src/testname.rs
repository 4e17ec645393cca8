//! A direct, non-exhaustive parser for test-name strings.
//!
//! Handles the grammar used by the worked examples:
//! `TESTCASE[_CASEOPT...].GRID.COMPSET.MACHINE_COMPILER[--TESTMODS]`, e.g.
//! `SMS_D.f19_g16.X.mach_gnu--mods/test`. This does not attempt every
//! historical naming convention, only the one this component's callers use.

use crate::error::CasetestError;

/// A test name decomposed into its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestName {
    pub raw: String,
    pub test_case: String,
    pub case_opts: Vec<String>,
    pub grid: String,
    pub compset: String,
    pub machine: String,
    pub compiler: String,
    pub test_mods: Option<String>,
}

impl TestName {
    /// Parses `raw` into its components.
    ///
    /// # Errors
    /// Returns [`CasetestError::TestName`] if `raw` does not have the four
    /// dot-separated fields the grammar requires, or if the fourth field
    /// has no `_` separating machine from compiler.
    pub fn parse(raw: &str) -> Result<Self, CasetestError> {
        let fields: Vec<&str> = raw.splitn(4, '.').collect();
        let [case_field, grid, compset, tail] = fields.as_slice() else {
            return Err(CasetestError::TestName(format!(
                "expected TESTCASE.GRID.COMPSET.MACHINE_COMPILER, got: {raw}"
            )));
        };

        let (machine_compiler, test_mods) = match tail.split_once("--") {
            Some((mc, mods)) => (mc, Some(mods.to_string())),
            None => (*tail, None),
        };

        let (machine, compiler) = machine_compiler.split_once('_').ok_or_else(|| {
            CasetestError::TestName(format!("machine_compiler field has no '_': {machine_compiler}"))
        })?;

        let mut case_parts = case_field.split('_');
        let test_case = case_parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CasetestError::TestName(format!("empty test case field: {raw}")))?
            .to_string();
        let case_opts = case_parts.map(str::to_string).collect();

        Ok(TestName {
            raw: raw.to_string(),
            test_case,
            case_opts,
            grid: grid.to_string(),
            compset: compset.to_string(),
            machine: machine.to_string(),
            compiler: compiler.to_string(),
            test_mods,
        })
    }
}

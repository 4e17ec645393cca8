//! Per-test diagnostic log.
//!
//! Appends free-form text blocks to `<test_dir>/TestStatus.log`, creating
//! the test directory on first use. Only one consumer ever writes to a
//! given test's log at a time, since it owns that test's `Pending` slot.

use std::fs::{self, OpenOptions};
use std::io::Write;

use camino::Utf8Path;

use crate::error::CasetestError;
use crate::phase::Phase;

const LOG_FILE_NAME: &str = "TestStatus.log";

/// Appends a "PASSED"/"FAILED" diagnostic block for one phase invocation.
pub fn log_phase_result(
    test_dir: &Utf8Path,
    phase: Phase,
    test_name: &str,
    command: &str,
    stdout: &str,
    stderr: &str,
    success: bool,
) -> Result<(), CasetestError> {
    let verdict = if success { "PASSED" } else { "FAILED" };
    let block = format!(
        "{phase} {verdict} for test '{test_name}'\ncommand: {command}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}\n\n"
    );
    append(test_dir, &block)
}

/// Appends an arbitrary diagnostic line, for conditions that do not map
/// onto a phase command invocation (e.g. a missing user-mods directory).
pub fn log_note(test_dir: &Utf8Path, note: &str) -> Result<(), CasetestError> {
    append(test_dir, &format!("{note}\n"))
}

/// Appends a "VERY BAD" infrastructure-inconsistency diagnostic.
pub fn log_very_bad(test_dir: &Utf8Path, note: &str) -> Result<(), CasetestError> {
    append(test_dir, &format!("VERY BAD: {note}\n"))
}

fn append(test_dir: &Utf8Path, text: &str) -> Result<(), CasetestError> {
    fs::create_dir_all(test_dir).map_err(|e| CasetestError::io(format!("create test dir: {test_dir}"), e))?;
    let path = test_dir.join(LOG_FILE_NAME);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| CasetestError::io(format!("open {path}"), e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| CasetestError::io(format!("write {path}"), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn test_dir(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().join("A.f19_g16.X.mach_gnu.20260727")).unwrap()
    }

    #[test]
    fn creates_test_dir_and_appends_block() {
        let tmp = TempDir::new().unwrap();
        let dir = test_dir(&tmp);
        log_phase_result(&dir, Phase::Build, "A.f19_g16.X.mach_gnu", "./case.test_build", "ok", "", true).unwrap();
        let contents = fs::read_to_string(dir.join("TestStatus.log")).unwrap();
        assert!(contents.contains("BUILD PASSED for test 'A.f19_g16.X.mach_gnu'"));
        assert!(contents.contains("ok"));
    }

    #[test]
    fn appends_do_not_clobber_prior_blocks() {
        let tmp = TempDir::new().unwrap();
        let dir = test_dir(&tmp);
        log_note(&dir, "first").unwrap();
        log_note(&dir, "second").unwrap();
        let contents = fs::read_to_string(dir.join("TestStatus.log")).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn very_bad_is_prefixed() {
        let tmp = TempDir::new().unwrap();
        let dir = test_dir(&tmp);
        log_very_bad(&dir, "Run recorded Pass but handler failed").unwrap();
        let contents = fs::read_to_string(dir.join("TestStatus.log")).unwrap();
        assert!(contents.starts_with("VERY BAD:"));
    }
}

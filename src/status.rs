//! The on-disk `TestStatus` file: writer and round-trip parser.
//!
//! Grammar: one record per line, `<STATUS> <TEST_NAME> <PHASE>\n`, in
//! phase order. A trailing `PENDING <name> RUN` line is a placeholder for
//! a run phase this process expects but has not yet owned.

use std::fs;

use camino::Utf8Path;

use crate::error::CasetestError;
use crate::phase::{Phase, Status};

const STATUS_FILE_NAME: &str = "TestStatus";

/// One parsed line of a `TestStatus` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub status: Status,
    pub test_name: String,
    pub phase: Phase,
}

impl StatusRecord {
    fn render(&self) -> String {
        format!("{} {} {}\n", self.status, self.test_name, self.phase)
    }

    fn parse_line(line: &str) -> Result<Self, CasetestError> {
        let mut parts = line.split_whitespace();
        let (Some(status), Some(test_name), Some(phase)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CasetestError::Config(format!("malformed TestStatus line: {line:?}")));
        };
        Ok(StatusRecord {
            status: Status::parse(status)?,
            test_name: test_name.to_string(),
            phase: Phase::parse(phase)?,
        })
    }
}

/// Writes `records` to `<test_dir>/TestStatus`, overwriting any existing
/// file. Callers build `records` in phase order up to and including the
/// test's current phase, and append a trailing `Pending Run` placeholder
/// themselves as an extra [`StatusRecord`] when one is warranted.
pub fn write_status_file(test_dir: &Utf8Path, records: &[StatusRecord]) -> Result<(), CasetestError> {
    let path = test_dir.join(STATUS_FILE_NAME);
    let mut contents = String::new();
    for record in records {
        contents.push_str(&record.render());
    }
    fs::write(&path, contents).map_err(|e| CasetestError::io(format!("write {path}"), e))
}

/// Reads `<test_dir>/TestStatus` back into its ordered records.
pub fn read_status_file(test_dir: &Utf8Path) -> Result<Vec<StatusRecord>, CasetestError> {
    let path = test_dir.join(STATUS_FILE_NAME);
    let text = fs::read_to_string(&path).map_err(|e| CasetestError::io(format!("read {path}"), e))?;
    text.lines().filter(|l| !l.trim().is_empty()).map(StatusRecord::parse_line).collect()
}

/// Whether `<test_dir>/TestStatus` exists at all.
pub fn status_file_exists(test_dir: &Utf8Path) -> bool {
    test_dir.join(STATUS_FILE_NAME).is_file()
}

/// Looks up the recorded status for `phase` in an already-written
/// `TestStatus` file, used by the "very bad" Run-phase inconsistency check.
pub fn recorded_status(records: &[StatusRecord], phase: Phase) -> Option<Status> {
    records.iter().find(|r| r.phase == phase).map(|r| r.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn dir(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap()
    }

    fn records() -> Vec<StatusRecord> {
        vec![
            StatusRecord { status: Status::Pass, test_name: "A".to_string(), phase: Phase::CreateNewcase },
            StatusRecord { status: Status::Pass, test_name: "A".to_string(), phase: Phase::Xml },
            StatusRecord { status: Status::Pass, test_name: "A".to_string(), phase: Phase::Setup },
            StatusRecord { status: Status::Pass, test_name: "A".to_string(), phase: Phase::Build },
            StatusRecord { status: Status::Pending, test_name: "A".to_string(), phase: Phase::Run },
        ]
    }

    #[test]
    fn round_trips_through_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let d = dir(&tmp);
        write_status_file(&d, &records()).unwrap();
        let parsed = read_status_file(&d).unwrap();
        assert_eq!(parsed, records());
    }

    #[test]
    fn render_matches_grammar() {
        let record = StatusRecord { status: Status::Fail, test_name: "A.f19_g16.X.mach_gnu".to_string(), phase: Phase::Build };
        assert_eq!(record.render(), "FAIL A.f19_g16.X.mach_gnu BUILD\n");
    }

    #[test]
    fn recorded_status_finds_run_entry() {
        let recs = records();
        assert_eq!(recorded_status(&recs, Phase::Run), Some(Status::Pending));
        assert_eq!(recorded_status(&recs, Phase::Namelist), None);
    }

    #[test]
    fn rejects_malformed_line() {
        let tmp = TempDir::new().unwrap();
        let d = dir(&tmp);
        fs::write(d.join(STATUS_FILE_NAME), "garbage\n").unwrap();
        assert!(read_status_file(&d).is_err());
    }
}

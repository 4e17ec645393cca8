//! Configuration module for casetest.
//!
//! This module provides the data structures and loader for a run profile:
//! which tests to drive, which phases to skip, where baselines and test
//! directories live, and the machine facts the phase handlers need. The
//! profile is loaded from a YAML file using [`load_run_profile`].

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

use crate::phase::Phase;

/// Machine facts that would otherwise be looked up from a machines
/// database; supplied directly here so this component has no live
/// environment-discovery dependency.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineInfo {
    pub name: String,
    pub compiler: String,
    pub max_tasks_per_node: u32,
    pub scratch_root: Utf8PathBuf,
}

/// Paths to the external helper executables the phase handlers invoke.
///
/// Defaults match the bare command names, which is enough for a machine
/// where they are already on `PATH`; a profile may override any of them
/// with an absolute path.
#[derive(Debug, Clone, Deserialize)]
pub struct HelperPaths {
    #[serde(default = "default_create_newcase")]
    pub create_newcase: String,
    #[serde(default = "default_xml_bridge")]
    pub xml_bridge: String,
    #[serde(default = "default_cesm_setup")]
    pub cesm_setup: String,
    #[serde(default = "default_xmlquery")]
    pub xmlquery: String,
    #[serde(default = "default_namelist_diff")]
    pub namelist_diff: String,
    #[serde(default = "default_text_diff")]
    pub text_diff: String,
    /// Directory holding per-test `<test_name>_build.csh` templates, and the
    /// `tests_build.csh` fallback.
    pub build_templates_dir: Utf8PathBuf,
}

fn default_create_newcase() -> String {
    "create_newcase".to_string()
}
fn default_xml_bridge() -> String {
    "xml_bridge".to_string()
}
fn default_cesm_setup() -> String {
    "cesm_setup".to_string()
}
fn default_xmlquery() -> String {
    "xmlquery".to_string()
}
fn default_namelist_diff() -> String {
    "component_compare.sh".to_string()
}
fn default_text_diff() -> String {
    "diff".to_string()
}

/// A fully-loaded run profile: which tests to run, under what mode, and
/// where everything lives on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Test name strings, in the grammar `testname` parses.
    pub tests: Vec<String>,

    #[serde(default)]
    pub no_run: bool,
    #[serde(default)]
    pub no_build: bool,
    #[serde(default)]
    pub no_batch: bool,
    #[serde(default)]
    pub clean: bool,
    #[serde(default)]
    pub compare: bool,
    #[serde(default)]
    pub generate: bool,

    pub test_root: Utf8PathBuf,
    pub test_id: String,
    #[serde(default)]
    pub baseline_root: Option<Utf8PathBuf>,
    #[serde(default)]
    pub baseline_name: Option<String>,
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default = "default_parallel_jobs")]
    pub parallel_jobs: usize,

    pub machine: MachineInfo,
    pub helpers: HelperPaths,

    /// Optional user-mods directory applied to every test's `create_newcase`.
    #[serde(default)]
    pub user_mods_dir: Option<Utf8PathBuf>,

    /// Directory of machine-description XML files, passed positionally to
    /// `xml_bridge`.
    pub machines_dir: Utf8PathBuf,
    /// The `env_case.xml`-style template `xml_bridge` edits in place.
    pub xml_template: Utf8PathBuf,
}

fn default_parallel_jobs() -> usize {
    1
}

impl RunConfig {
    /// Validates cross-field constraints that deserialization alone cannot
    /// express: compare/generate both need a baseline root and name, and
    /// the two are mutually exclusive per test_id suffix.
    pub fn validate(&self) -> Result<()> {
        if self.tests.is_empty() {
            bail!("no tests configured");
        }
        if self.compare && self.generate {
            bail!("compare and generate are mutually exclusive");
        }
        if (self.compare || self.generate) && (self.baseline_root.is_none() || self.baseline_name.is_none()) {
            bail!("compare/generate requires both baseline_root and baseline_name");
        }
        if self.parallel_jobs == 0 {
            bail!("parallel_jobs must be at least 1");
        }
        if self.machine.max_tasks_per_node == 0 {
            bail!("machine.max_tasks_per_node must be at least 1");
        }
        Ok(())
    }

    /// The initial CPU budget: `floor(1.25 * max_tasks_per_node)`.
    pub fn initial_cpu_budget(&self) -> u32 {
        (self.machine.max_tasks_per_node as f64 * 1.25).floor() as u32
    }

    /// The ordered phase list for this run: `Namelist` is dropped unless
    /// comparing or generating, `Build` is dropped in no-build mode, `Run`
    /// is dropped in no-run mode.
    pub fn active_phases(&self) -> Vec<Phase> {
        let mut phases = vec![Phase::Init, Phase::CreateNewcase, Phase::Xml, Phase::Setup];
        if self.compare || self.generate {
            phases.push(Phase::Namelist);
        }
        if !self.no_build {
            phases.push(Phase::Build);
        }
        if !self.no_run {
            phases.push(Phase::Run);
        }
        phases
    }

    /// The `<test_name><action><test_id>` case-id convention: `.C` when
    /// comparing, `.G` when generating, empty otherwise.
    pub fn case_id(&self, test_name: &str) -> String {
        let action = if self.compare {
            ".C"
        } else if self.generate {
            ".G"
        } else {
            ""
        };
        format!("{test_name}{action}.{}", self.test_id)
    }

    pub fn test_dir(&self, test_name: &str) -> Utf8PathBuf {
        self.test_root.join(self.case_id(test_name))
    }

    pub fn baseline_dir(&self, test_name: &str) -> Option<Utf8PathBuf> {
        let root = self.baseline_root.as_ref()?;
        let name = self.baseline_name.as_ref()?;
        Some(root.join(name).join(test_name))
    }
}

/// Loads a run profile from a YAML file.
#[tracing::instrument]
pub fn load_run_profile(path: &Utf8Path) -> Result<RunConfig> {
    let file = File::open(path).with_context(|| format!("failed to load file: {}", path))?;
    let reader = BufReader::new(file);
    let config: RunConfig =
        serde_yaml::from_reader(reader).with_context(|| format!("failed to parse yaml: {}", path))?;
    debug!("loaded run profile:\n{:#?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunConfig {
        RunConfig {
            tests: vec!["A.f19_g16.X.mach_gnu".to_string()],
            no_run: false,
            no_build: false,
            no_batch: true,
            clean: false,
            compare: false,
            generate: false,
            test_root: Utf8PathBuf::from("/scratch/tests"),
            test_id: "20260727".to_string(),
            baseline_root: None,
            baseline_name: None,
            project: None,
            parallel_jobs: 1,
            machine: MachineInfo {
                name: "mach".to_string(),
                compiler: "gnu".to_string(),
                max_tasks_per_node: 4,
                scratch_root: Utf8PathBuf::from("/scratch"),
            },
            helpers: HelperPaths {
                create_newcase: default_create_newcase(),
                xml_bridge: default_xml_bridge(),
                cesm_setup: default_cesm_setup(),
                xmlquery: default_xmlquery(),
                namelist_diff: default_namelist_diff(),
                text_diff: default_text_diff(),
                build_templates_dir: Utf8PathBuf::from("/templates"),
            },
            user_mods_dir: None,
            machines_dir: Utf8PathBuf::from("/machines"),
            xml_template: Utf8PathBuf::from("/machines/env_case.xml"),
        }
    }

    #[test]
    fn initial_cpu_budget_rounds_down() {
        assert_eq!(sample().initial_cpu_budget(), 5);
    }

    #[test]
    fn active_phases_drops_namelist_by_default() {
        let config = sample();
        assert!(!config.active_phases().contains(&Phase::Namelist));
    }

    #[test]
    fn active_phases_includes_namelist_when_comparing() {
        let mut config = sample();
        config.compare = true;
        config.baseline_root = Some(Utf8PathBuf::from("/baselines"));
        config.baseline_name = Some("master".to_string());
        assert!(config.active_phases().contains(&Phase::Namelist));
    }

    #[test]
    fn case_id_appends_compare_suffix() {
        let mut config = sample();
        config.compare = true;
        config.baseline_root = Some(Utf8PathBuf::from("/baselines"));
        config.baseline_name = Some("master".to_string());
        assert_eq!(config.case_id("A.f19_g16.X.mach_gnu"), "A.f19_g16.X.mach_gnu.C.20260727");
    }

    #[test]
    fn validate_rejects_compare_without_baseline() {
        let mut config = sample();
        config.compare = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_test_list() {
        let mut config = sample();
        config.tests.clear();
        assert!(config.validate().is_err());
    }
}

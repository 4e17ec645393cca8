#![allow(dead_code)]

use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use casetest::config::{HelperPaths, MachineInfo, RunConfig};
use casetest::executor::{CommandExecutor, CommandSpec, ExecutionResult};

/// A command executor that always succeeds, except for commands whose
/// name is present (and mapped to `false`) in `failing`.
pub struct FakeExecutor {
    pub failing: Mutex<HashMap<String, bool>>,
    pub invocations: Mutex<Vec<CommandSpec>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self { failing: Mutex::new(HashMap::new()), invocations: Mutex::new(Vec::new()) }
    }

    pub fn fail(self, command: &str) -> Self {
        self.failing.lock().unwrap().insert(command.to_string(), true);
        self
    }
}

impl CommandExecutor for FakeExecutor {
    fn execute(&self, spec: &CommandSpec) -> anyhow::Result<ExecutionResult> {
        self.invocations.lock().unwrap().push(spec.clone());
        let should_fail = self.failing.lock().unwrap().get(&spec.command).copied().unwrap_or(false);
        let code = if should_fail { 1 } else { 0 };
        Ok(ExecutionResult { status: ExitStatus::from_raw(code << 8), stdout: "4".to_string(), stderr: String::new() })
    }
}

/// A minimal single-test run profile rooted at `root`, with every helper
/// pointed at a bare command name (resolution happens through the fake
/// executor, never `which`).
pub fn basic_config(root: &std::path::Path, test_name: &str, parallel_jobs: usize) -> RunConfig {
    let root = Utf8PathBuf::from_path_buf(root.to_path_buf()).unwrap();
    RunConfig {
        tests: vec![test_name.to_string()],
        no_run: false,
        no_build: false,
        no_batch: true,
        clean: false,
        compare: false,
        generate: false,
        test_root: root.join("tests"),
        test_id: "20260727".to_string(),
        baseline_root: None,
        baseline_name: None,
        project: None,
        parallel_jobs,
        machine: MachineInfo {
            name: "mach".to_string(),
            compiler: "gnu".to_string(),
            max_tasks_per_node: 4,
            scratch_root: root.clone(),
        },
        helpers: HelperPaths {
            create_newcase: "create_newcase".to_string(),
            xml_bridge: "xml_bridge".to_string(),
            cesm_setup: "cesm_setup".to_string(),
            xmlquery: "xmlquery".to_string(),
            namelist_diff: "component_compare.sh".to_string(),
            text_diff: "diff".to_string(),
            build_templates_dir: root.join("templates"),
        },
        user_mods_dir: None,
        machines_dir: root.clone(),
        xml_template: root.join("env_case.xml"),
    }
}

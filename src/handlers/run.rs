//! `Run` phase handler: invokes `./<case_id>.test` (no-batch) or
//! `./<case_id>.submit` (batch) from the test directory.

use crate::executor::CommandSpec;
use crate::handlers::{HandlerContext, PhaseOutcome, run_logged};
use crate::phase::Phase;

pub fn run(ctx: &HandlerContext, test_name: &str) -> PhaseOutcome {
    let case_id = ctx.config.case_id(test_name);
    let command = if ctx.config.no_batch { format!("./{case_id}.test") } else { format!("./{case_id}.submit") };
    let spec = CommandSpec::new(command, vec![]).with_cwd(ctx.test_dir(test_name));
    run_logged(ctx, Phase::Run, test_name, &spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HelperPaths, MachineInfo, RunConfig};
    use crate::executor::{CommandExecutor, ExecutionResult};
    use camino::Utf8PathBuf;
    use std::os::unix::process::ExitStatusExt;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeExecutor {
        last: Mutex<Option<CommandSpec>>,
    }

    impl CommandExecutor for FakeExecutor {
        fn execute(&self, spec: &CommandSpec) -> anyhow::Result<ExecutionResult> {
            *self.last.lock().unwrap() = Some(spec.clone());
            Ok(ExecutionResult { status: std::process::ExitStatus::from_raw(0), stdout: String::new(), stderr: String::new() })
        }
    }

    fn config(tmp: &TempDir, no_batch: bool) -> RunConfig {
        RunConfig {
            tests: vec!["A.f19_g16.X.mach_gnu".to_string()],
            no_run: false,
            no_build: false,
            no_batch,
            clean: false,
            compare: false,
            generate: false,
            test_root: Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap(),
            test_id: "20260727".to_string(),
            baseline_root: None,
            baseline_name: None,
            project: None,
            parallel_jobs: 1,
            machine: MachineInfo {
                name: "mach".to_string(),
                compiler: "gnu".to_string(),
                max_tasks_per_node: 4,
                scratch_root: Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap(),
            },
            helpers: HelperPaths {
                create_newcase: "create_newcase".to_string(),
                xml_bridge: "xml_bridge".to_string(),
                cesm_setup: "cesm_setup".to_string(),
                xmlquery: "xmlquery".to_string(),
                namelist_diff: "component_compare.sh".to_string(),
                text_diff: "diff".to_string(),
                build_templates_dir: Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap(),
            },
            user_mods_dir: None,
            machines_dir: Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap(),
            xml_template: Utf8PathBuf::from_path_buf(tmp.path().join("env_case.xml")).unwrap(),
        }
    }

    #[test]
    fn uses_dot_test_in_no_batch_mode() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(&tmp, true);
        let executor = FakeExecutor { last: Mutex::new(None) };
        let ctx = HandlerContext { config: &cfg, executor: &executor };
        run(&ctx, "A.f19_g16.X.mach_gnu");
        let spec = executor.last.lock().unwrap().clone().unwrap();
        assert!(spec.command.ends_with(".test"));
    }

    #[test]
    fn uses_dot_submit_in_batch_mode() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(&tmp, false);
        let executor = FakeExecutor { last: Mutex::new(None) };
        let ctx = HandlerContext { config: &cfg, executor: &executor };
        run(&ctx, "A.f19_g16.X.mach_gnu");
        let spec = executor.last.lock().unwrap().clone().unwrap();
        assert!(spec.command.ends_with(".submit"));
    }
}

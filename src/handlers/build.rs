//! `Build` phase handler: invokes `./<case_id>.test_build` from the test
//! directory.

use crate::executor::CommandSpec;
use crate::handlers::{HandlerContext, PhaseOutcome, run_logged};
use crate::phase::Phase;

pub fn run(ctx: &HandlerContext, test_name: &str) -> PhaseOutcome {
    let case_id = ctx.config.case_id(test_name);
    let spec = CommandSpec::new(format!("./{case_id}.test_build"), vec![]).with_cwd(ctx.test_dir(test_name));
    run_logged(ctx, Phase::Build, test_name, &spec)
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
        exit_code: i32,
    }

    impl CommandExecutor for FakeExecutor {
        fn execute(&self, spec: &CommandSpec) -> anyhow::Result<ExecutionResult> {
            *self.last.lock().unwrap() = Some(spec.clone());
            Ok(ExecutionResult {
                status: std::process::ExitStatus::from_raw(self.exit_code << 8),
                stdout: "building...".to_string(),
                stderr: String::new(),
            })
        }
    }

    fn config(tmp: &TempDir) -> RunConfig {
        RunConfig {
            tests: vec!["A.f19_g16.X.mach_gnu".to_string()],
            no_run: false,
            no_build: false,
            no_batch: true,
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
    fn success_on_zero_exit() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(&tmp);
        let executor = FakeExecutor { last: Mutex::new(None), exit_code: 0 };
        let ctx = HandlerContext { config: &cfg, executor: &executor };
        let outcome = run(&ctx, "A.f19_g16.X.mach_gnu");
        assert!(outcome.success);
        let spec = executor.last.lock().unwrap().clone().unwrap();
        assert_eq!(spec.command, format!("./{}.test_build", cfg.case_id("A.f19_g16.X.mach_gnu")));
    }

    #[test]
    fn failure_on_nonzero_exit() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(&tmp);
        let executor = FakeExecutor { last: Mutex::new(None), exit_code: 1 };
        let ctx = HandlerContext { config: &cfg, executor: &executor };
        let outcome = run(&ctx, "A.f19_g16.X.mach_gnu");
        assert!(!outcome.success);
    }
}

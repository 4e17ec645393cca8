//! `Setup` phase handler: stages the build script template, then runs
//! `cesm_setup` from the test directory.

use std::fs;

use crate::executor::CommandSpec;
use crate::handlers::{HandlerContext, PhaseOutcome, run_logged};
use crate::log_sink;
use crate::phase::Phase;

pub fn run(ctx: &HandlerContext, test_name: &str) -> PhaseOutcome {
    let test_dir = ctx.test_dir(test_name);
    let case_id = ctx.config.case_id(test_name);

    let specific = ctx.config.helpers.build_templates_dir.join(format!("{test_name}_build.csh"));
    let fallback = ctx.config.helpers.build_templates_dir.join("tests_build.csh");
    let template = if specific.is_file() { &specific } else { &fallback };

    if !template.is_file() {
        let _ = log_sink::log_note(&test_dir, &format!("no build template found: {template}"));
        return PhaseOutcome::failed();
    }

    let dest = test_dir.join(format!("{case_id}.test_build"));
    if let Err(e) = fs::create_dir_all(&test_dir) {
        let _ = log_sink::log_note(&test_dir, &format!("failed to create test directory: {e}"));
        return PhaseOutcome::failed();
    }
    if let Err(e) = fs::copy(template, &dest) {
        let _ = log_sink::log_note(&test_dir, &format!("failed to stage {template} -> {dest}: {e}"));
        return PhaseOutcome::failed();
    }

    let spec = CommandSpec::new("./cesm_setup", vec![]).with_cwd(test_dir);
    run_logged(ctx, Phase::Setup, test_name, &spec)
}

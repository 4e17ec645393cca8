//! `CreateNewcase` phase handler: builds and runs `create_newcase`.

use camino::Utf8PathBuf;

use crate::executor::CommandSpec;
use crate::handlers::{HandlerContext, PhaseOutcome, run_logged};
use crate::log_sink;
use crate::phase::Phase;
use crate::testname::TestName;

pub fn run(ctx: &HandlerContext, test_name: &str) -> PhaseOutcome {
    let parsed = match TestName::parse(test_name) {
        Ok(p) => p,
        Err(e) => {
            let _ = log_sink::log_note(&ctx.test_dir(test_name), &format!("cannot parse test name: {e}"));
            return PhaseOutcome::failed();
        }
    };

    if let Some(mods_dir) = &ctx.config.user_mods_dir
        && !mods_dir.is_dir()
    {
        let _ =
            log_sink::log_note(&ctx.test_dir(test_name), &format!("configured user_mods_dir missing: {mods_dir}"));
        return PhaseOutcome::failed();
    }

    let sharedlibroot = shared_lib_root(ctx, test_name);

    let mut args = vec![
        "-case".to_string(),
        ctx.config.case_id(test_name),
        "-casedir".to_string(),
        ctx.test_dir(test_name).to_string(),
        "-res".to_string(),
        parsed.grid.clone(),
        "-mach".to_string(),
        parsed.machine.clone(),
        "-compiler".to_string(),
        parsed.compiler.clone(),
        "-compset".to_string(),
        parsed.compset.clone(),
        "-testname".to_string(),
        test_name.to_string(),
        "-sharedlibroot".to_string(),
        sharedlibroot.to_string(),
    ];

    if let Some(project) = &ctx.config.project {
        args.push("-project".to_string());
        args.push(project.clone());
    }

    if !parsed.case_opts.is_empty() {
        args.push("-confopts".to_string());
        args.push(format!("_{}", parsed.case_opts.join("_")));
    }

    if let Some(mods_dir) = &ctx.config.user_mods_dir {
        args.push("-user_mods_dir".to_string());
        args.push(mods_dir.to_string());
    }

    let spec = CommandSpec::new(ctx.config.helpers.create_newcase.clone(), args);
    run_logged(ctx, Phase::CreateNewcase, test_name, &spec)
}

/// `sharedlibroot` policy: shared across the whole run when serial, private
/// per test when parallel (to avoid concurrent build collisions).
fn shared_lib_root(ctx: &HandlerContext, test_name: &str) -> Utf8PathBuf {
    if ctx.config.parallel_jobs == 1 {
        ctx.config.test_root.join(format!("sharedlibroot.{}", ctx.config.test_id))
    } else {
        ctx.test_dir(test_name).join("sharedlibroot")
    }
}

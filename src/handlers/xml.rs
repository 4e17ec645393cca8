//! `Xml` phase handler: invokes the XML bridge with a fixed set of
//! `KEY,VALUE` overrides.

use crate::executor::CommandSpec;
use crate::handlers::{HandlerContext, PhaseOutcome, run_logged};
use crate::phase::Phase;

pub fn run(ctx: &HandlerContext, test_name: &str) -> PhaseOutcome {
    let cfg = ctx.config;

    let mut args = vec![
        cfg.machines_dir.to_string(),
        cfg.machine.name.clone(),
        cfg.xml_template.to_string(),
    ];

    let mut kv = |key: &str, value: String| args.push(format!("{key},{value}"));

    kv("CASE", test_name.to_string());
    kv("TESTID", cfg.test_id.clone());
    kv("TESTARGV", std::env::args().collect::<Vec<_>>().join(" "));
    kv("CLEANUP", cfg.clean.to_string());
    kv("COMPARE", cfg.compare.to_string());
    kv("GENERATE", cfg.generate.to_string());
    if let Some(root) = &cfg.baseline_root {
        kv("BASELINE_ROOT", root.to_string());
    }
    if let Some(name) = &cfg.baseline_name {
        kv("BASELINE_NAME", name.clone());
    }

    let spec = CommandSpec::new(cfg.helpers.xml_bridge.clone(), args).with_cwd(ctx.test_dir(test_name));
    run_logged(ctx, Phase::Xml, test_name, &spec)
}

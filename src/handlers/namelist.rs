//! `Namelist` phase handler: compares a test's namelists against a
//! baseline, or generates a fresh baseline from them.
//!
//! Only meaningful when the run is configured to compare or generate; the
//! scheduler never dispatches this phase otherwise (see
//! [`crate::config::RunConfig::active_phases`]).

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};

use crate::executor::CommandSpec;
use crate::handlers::{HandlerContext, PhaseOutcome};
use crate::log_sink;
use crate::phase::Phase;

pub fn run(ctx: &HandlerContext, test_name: &str) -> PhaseOutcome {
    if ctx.config.generate {
        return generate(ctx, test_name);
    }
    compare(ctx, test_name)
}

/// An item under test that has a namelist/baseline counterpart.
struct Item {
    /// Path to the test's copy.
    current: Utf8PathBuf,
    /// Where the baseline counterpart lives, if any baseline is configured.
    baseline: Option<Utf8PathBuf>,
}

fn compare(ctx: &HandlerContext, test_name: &str) -> PhaseOutcome {
    let test_dir = ctx.test_dir(test_name);
    let Some(baseline_dir) = ctx.config.baseline_dir(test_name) else {
        let _ = log_sink::log_note(&test_dir, "compare requested but no baseline configured");
        return PhaseOutcome::failed();
    };

    let items = match collect_comparison_items(&test_dir, &baseline_dir) {
        Ok(items) => items,
        Err(e) => {
            let _ = log_sink::log_note(&test_dir, &format!("failed to enumerate namelist items: {e}"));
            return PhaseOutcome::failed();
        }
    };

    let mut soft_failed = false;

    for item in items {
        let Some(baseline) = item.baseline else {
            let _ = log_sink::log_note(
                &test_dir,
                &format!("no baseline counterpart for {}", item.current),
            );
            soft_failed = true;
            continue;
        };

        let differ =
            if is_namelist_file(&item.current) { &ctx.config.helpers.namelist_diff } else { &ctx.config.helpers.text_diff };
        let spec = CommandSpec::new(
            differ.clone(),
            vec![baseline.to_string(), item.current.to_string(), "-c".to_string(), test_name.to_string()],
        );

        match ctx.executor.execute(&spec) {
            Ok(result) if result.success() => {}
            Ok(result) => {
                let _ = log_sink::log_note(
                    &test_dir,
                    &format!("namelist divergence in {}:\n{}\n{}", item.current, result.stdout, result.stderr),
                );
                soft_failed = true;
            }
            Err(e) => {
                let _ = log_sink::log_note(&test_dir, &format!("failed to run differ on {}: {e:#}", item.current));
                soft_failed = true;
            }
        }
    }

    if soft_failed { PhaseOutcome::soft_failed() } else { PhaseOutcome::ok() }
}

fn generate(ctx: &HandlerContext, test_name: &str) -> PhaseOutcome {
    let test_dir = ctx.test_dir(test_name);
    let Some(baseline_dir) = ctx.config.baseline_dir(test_name) else {
        let _ = log_sink::log_note(&test_dir, "generate requested but no baseline configured");
        return PhaseOutcome::failed();
    };

    if let Err(e) = write_baseline(&test_dir, &baseline_dir) {
        let _ = log_sink::log_note(&test_dir, &format!("failed to write baseline: {e}"));
        return PhaseOutcome::failed();
    }

    PhaseOutcome::ok()
}

fn write_baseline(test_dir: &Utf8Path, baseline_dir: &Utf8Path) -> std::io::Result<()> {
    if !baseline_dir.is_dir() {
        fs::create_dir_all(baseline_dir)?;
        fs::set_permissions(baseline_dir, fs::Permissions::from_mode(0o775))?;
    }

    let case_docs_dest = baseline_dir.join("CaseDocs");
    if case_docs_dest.is_dir() {
        fs::remove_dir_all(&case_docs_dest)?;
    }
    let case_docs_src = test_dir.join("CaseDocs");
    if case_docs_src.is_dir() {
        copy_dir_recursive(case_docs_src.as_std_path(), case_docs_dest.as_std_path())?;
    }

    for entry in fs::read_dir(test_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with("user_nl") {
            let dest = baseline_dir.join(name.to_string_lossy().as_ref());
            fs::copy(entry.path(), dest)?;
        }
    }

    Ok(())
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let dest_path = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &dest_path)?;
        } else {
            fs::copy(entry.path(), dest_path)?;
        }
    }
    Ok(())
}

/// Items to compare: everything in `<test_dir>/CaseDocs` except README
/// files, dotfiles, and files ending in `doc`/`prescribed` (no dot required,
/// matching the original's plain `str.endswith`), plus every
/// `<test_dir>/user_nl*` file.
fn collect_comparison_items(test_dir: &Utf8Path, baseline_dir: &Utf8Path) -> std::io::Result<Vec<Item>> {
    let mut items = Vec::new();

    let case_docs = test_dir.join("CaseDocs");
    if case_docs.is_dir() {
        for entry in fs::read_dir(&case_docs)? {
            let entry = entry?;
            let Ok(name) = Utf8PathBuf::from_path_buf(entry.path()) else { continue };
            let base = name.file_name().unwrap_or_default();
            if base.contains("README")
                || base.starts_with('.')
                || base.ends_with("doc")
                || base.ends_with("prescribed")
            {
                continue;
            }
            let baseline_case_docs = baseline_dir.join("CaseDocs").join(base);
            items.push(Item {
                current: name,
                baseline: Some(baseline_case_docs).filter(|p| p.is_file()),
            });
        }
    }

    for entry in fs::read_dir(test_dir)? {
        let entry = entry?;
        let Ok(name) = Utf8PathBuf::from_path_buf(entry.path()) else { continue };
        let base = name.file_name().unwrap_or_default();
        if base.starts_with("user_nl") {
            let baseline_counterpart = baseline_dir.join(base);
            items.push(Item {
                current: name,
                baseline: Some(baseline_counterpart).filter(|p| p.is_file()),
            });
        }
    }

    // Re-resolve baseline presence for CaseDocs items: if it wasn't found
    // under baseline/CaseDocs, it is still considered missing (the
    // CaseDocs-vs-root distinction only affects which baseline subpath is
    // probed, not a fallback to root).
    Ok(items)
}

fn is_namelist_file(path: &Utf8Path) -> bool {
    let base = path.file_name().unwrap_or_default();
    base.starts_with("user_nl") || base.contains("_in") || path.extension() == Some("nml")
}

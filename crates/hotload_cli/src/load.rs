//! `hotload load` and `hotload precompile`: one-shot load cycles.

use crate::pipeline::{build_loader, load_settings, report_diagnostics};
use crate::GlobalArgs;

/// Loads the named units, or every unit when `names` is empty.
///
/// Exits with 1 if any unit failed to compile or could not be found.
pub fn run(names: &[String], global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    let loader = build_loader(&settings);

    let mut missing = 0usize;
    let loaded = if names.is_empty() {
        loader.load_all()?
    } else {
        let mut loaded = Vec::new();
        for name in names {
            match loader.load(name)? {
                Some(handle) => loaded.push(handle),
                None => {
                    eprintln!("error: no unit named '{name}'");
                    missing += 1;
                }
            }
        }
        loaded
    };

    let errors = report_diagnostics(&loader, global);
    if !global.quiet {
        for handle in &loaded {
            eprintln!("     Loaded {}", handle.name());
        }
        eprintln!(
            "   Finished {} unit(s), {} error(s), generation {}",
            loaded.len(),
            errors + missing,
            loader.generation()
        );
    }
    Ok(if errors + missing > 0 { 1 } else { 0 })
}

/// Loads every unit with precompile emission forced on.
pub fn precompile(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut settings = load_settings(global)?;
    settings.precompile = true;
    settings.use_precompiled = false;
    let loader = build_loader(&settings);

    let loaded = loader.load_all()?;
    let errors = report_diagnostics(&loader, global);
    if !global.quiet {
        eprintln!(
            "   Precompiled {} unit(s) into {}",
            loaded.len(),
            settings.precompiled_dir.display()
        );
    }
    Ok(if errors > 0 { 1 } else { 0 })
}

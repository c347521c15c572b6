//! `hotload watch`: the development loop.

use std::thread;
use std::time::Duration;

use tracing::info;

use crate::pipeline::{build_loader, load_settings, report_diagnostics};
use crate::{GlobalArgs, WatchArgs, EXIT_RESTART};

/// Loads every unit, then runs change detection every `interval_ms`.
///
/// Returns [`EXIT_RESTART`] as soon as a reload fails, since every reload
/// failure needs a restart.
pub fn run(args: &WatchArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    let loader = build_loader(&settings);

    let loaded = loader.load_all()?;
    report_diagnostics(&loader, global);
    if !global.quiet {
        eprintln!("   Watching {} unit(s)", loaded.len());
    }

    let interval = Duration::from_millis(args.interval_ms);
    let mut cycle = 0u64;
    while args.cycles.map_or(true, |limit| cycle < limit) {
        thread::sleep(interval);
        cycle += 1;
        let before = loader.generation();
        let outcome = loader.detect_changes();
        report_diagnostics(&loader, global);
        match outcome {
            Ok(()) if loader.generation() != before => {
                info!(generation = %loader.generation(), "reloaded");
            }
            Ok(()) => {}
            Err(err) => {
                eprintln!("error: {err}");
                eprintln!("   Restart required");
                return Ok(EXIT_RESTART);
            }
        }
    }
    Ok(0)
}

//! `hotload cache`: content cache maintenance.

use hotload_cache::DiskContentCache;

use crate::pipeline::load_settings;
use crate::{CacheCommand, GlobalArgs};

/// Runs a cache maintenance command against the project's content cache.
pub fn run(command: &CacheCommand, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    let cache = DiskContentCache::open(&settings.cache_dir);
    match command {
        CacheCommand::Gc => {
            let removed = cache.gc()?;
            if !global.quiet {
                eprintln!(
                    "   Removed {removed} stale artifact(s), {} unit(s) cached",
                    cache.len()
                );
            }
        }
        CacheCommand::Clear => {
            cache.clear()?;
            if !global.quiet {
                eprintln!("   Cleared {}", settings.cache_dir.display());
            }
        }
    }
    Ok(0)
}

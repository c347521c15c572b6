//! `hotload list`: show every discoverable unit.

use crate::pipeline::{build_loader, load_settings};
use crate::GlobalArgs;

/// Prints one unit name per line, with the search root it was found in.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    let loader = build_loader(&settings);
    let names = if settings.use_precompiled {
        loader.options().precompiled.discover()
    } else {
        loader.locator().discover()
    };

    for name in &names {
        match loader.locator().resolve(name) {
            Some(source) if global.verbose => {
                println!("{name}\t{}", source.path().display());
            }
            _ => println!("{name}"),
        }
    }
    if !global.quiet {
        eprintln!("   Found {} unit(s)", names.len());
    }
    Ok(0)
}

//! Hotload CLI: drive the module loader from the command line.
//!
//! Provides `hotload list` to show discoverable units, `hotload load` and
//! `hotload precompile` for one-shot load cycles, `hotload watch` for the
//! development loop, and `hotload cache` to maintain the content cache.

#![warn(missing_docs)]

mod cache;
mod list;
mod load;
mod pipeline;
mod watch;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Hotload: compile, load and hot-reload application units.
#[derive(Parser, Debug)]
#[command(name = "hotload", version, about = "Dynamic module loading and hot reload")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `hotload.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every unit discoverable on the search path.
    List,
    /// Load the given units, or every unit if none are given.
    Load {
        /// Fully-qualified unit names.
        names: Vec<String>,
    },
    /// Load every unit and write it to the precompiled layout.
    Precompile,
    /// Load every unit, then reload on every source change.
    Watch(WatchArgs),
    /// Maintain the persisted content cache.
    #[command(subcommand)]
    Cache(CacheCommand),
}

/// Arguments for the `hotload watch` subcommand.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Milliseconds between change-detection passes.
    #[arg(long, default_value_t = 500)]
    pub interval_ms: u64,

    /// Stop after this many passes (runs until a restart is needed if omitted).
    #[arg(long)]
    pub cycles: Option<u64>,
}

/// Content cache maintenance commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum CacheCommand {
    /// Delete artifacts no longer referenced by the cache manifest.
    Gc,
    /// Delete the whole content cache.
    Clear,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

/// Exit code of `watch` when the process must restart.
pub const EXIT_RESTART: i32 = 3;

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var("TERM").is_ok(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };
    init_tracing(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::List => list::run(&global),
        Command::Load { ref names } => load::run(names, &global),
        Command::Precompile => load::precompile(&global),
        Command::Watch(ref args) => watch::run(args, &global),
        Command::Cache(ref command) => cache::run(command, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `HOTLOAD_LOG` overrides the level flags.
fn init_tracing(quiet: bool, verbose: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_env("HOTLOAD_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_list() {
        let cli = Cli::parse_from(["hotload", "list"]);
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn parse_load_without_names() {
        let cli = Cli::parse_from(["hotload", "load"]);
        match cli.command {
            Command::Load { names } => assert!(names.is_empty()),
            _ => panic!("expected Load command"),
        }
    }

    #[test]
    fn parse_load_with_names() {
        let cli = Cli::parse_from(["hotload", "load", "app.models.User", "app.Main"]);
        match cli.command {
            Command::Load { names } => assert_eq!(names, vec!["app.models.User", "app.Main"]),
            _ => panic!("expected Load command"),
        }
    }

    #[test]
    fn parse_watch_defaults() {
        let cli = Cli::parse_from(["hotload", "watch"]);
        match cli.command {
            Command::Watch(ref args) => {
                assert_eq!(args.interval_ms, 500);
                assert!(args.cycles.is_none());
            }
            _ => panic!("expected Watch command"),
        }
    }

    #[test]
    fn parse_watch_with_args() {
        let cli = Cli::parse_from(["hotload", "watch", "--interval-ms", "50", "--cycles", "3"]);
        match cli.command {
            Command::Watch(ref args) => {
                assert_eq!(args.interval_ms, 50);
                assert_eq!(args.cycles, Some(3));
            }
            _ => panic!("expected Watch command"),
        }
    }

    #[test]
    fn parse_cache_commands() {
        let cli = Cli::parse_from(["hotload", "cache", "gc"]);
        assert!(matches!(cli.command, Command::Cache(CacheCommand::Gc)));
        let cli = Cli::parse_from(["hotload", "cache", "clear"]);
        assert!(matches!(cli.command, Command::Cache(CacheCommand::Clear)));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["hotload", "--quiet", "--color", "never", "list"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["hotload", "--config", "/path/to/hotload.toml", "precompile"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/hotload.toml"));
        assert!(matches!(cli.command, Command::Precompile));
    }
}

// sra/src/logger.rs
//! Logger setup for the binary. Logs go to stderr so stdout stays reserved
//! for the outcome.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes `env_logger`. An explicit level wins over `RUST_LOG`; without
/// one, `RUST_LOG` applies and defaults to `info`.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.target(Target::Stderr).format_timestamp_secs();
    // A logger may already be installed when running under the test harness.
    let _ = builder.try_init();
}

/// Maps the `--quiet` / `--debug` flags to a level override.
pub fn level_from_flags(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}

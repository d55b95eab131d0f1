//! Logging utilities
//!
//! The library only emits through the `log` facade; binaries pick the
//! logger. These helpers install `env_logger` the way the demo apps do.

pub use log::{debug, error, info, trace, warn};

/// Initialize logging from `RUST_LOG`, defaulting to `info`
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}

/// Initialize logging at `level`; per-module `RUST_LOG` directives still apply
///
/// Unknown level names fall back to `info`. Calling this twice is harmless:
/// the second logger is rejected and the error is ignored.
pub fn init_with_level(level: &str) {
    let filter = parse_level(level);
    let _ = env_logger::Builder::from_default_env()
        .filter_level(filter)
        .try_init();
}

/// Parse a level name (`"off"`, `"error"`, ..., `"trace"`), case-insensitive
pub fn parse_level(level: &str) -> log::LevelFilter {
    level.trim().parse().unwrap_or(log::LevelFilter::Info)
}

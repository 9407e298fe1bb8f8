//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize logging with a default level that `RUST_LOG` can still override
///
/// Unknown level names fall back to `info`. Calling this twice is harmless:
/// the second initialization attempt is ignored.
pub fn init_with_level(level: &str) {
    let filter = parse_level(level);
    let _ = env_logger::Builder::from_default_env()
        .filter_level(filter)
        .parse_default_env()
        .try_init();
}

/// Parse a level name such as `"debug"` into a filter
pub fn parse_level(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or(log::LevelFilter::Info)
}

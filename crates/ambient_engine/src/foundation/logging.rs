//! Logging setup
//!
//! The crate logs through the `log` facade. Binaries call [`init`] once at
//! startup; `RUST_LOG` still overrides the default level.

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize `env_logger` with an `Info` default
pub fn init() {
    init_with_level(LevelFilter::Info);
}

/// Initialize `env_logger` with the given default level. Calling it again
/// after a logger is installed is a no-op.
pub fn init_with_level(level: LevelFilter) {
    let result = env_logger::Builder::from_default_env()
        .filter_level(level)
        .parse_default_env()
        .try_init();
    if result.is_ok() {
        log::debug!("Logging initialized at {level}");
    }
}

//! Logging helpers
//!
//! This module wires the `log` facade to `env_logger`.

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Parameters
///
/// * `level` - Default log level filter
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", level);

    // Repeated initialization is ignored
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Initializes the logger with the `env_logger` crate.
///
/// `RUST_LOG` overrides the default `info` filter, e.g. `RUST_LOG=sx1278_rx=trace`
/// shows every register transfer.
pub fn init_logger() {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER);
    // A second call (tests, embedding) keeps the first logger.
    let _ = env_logger::Builder::from_env(env).try_init();
}

//! Diagnostic logging for questctl
//!
//! Logs go to stderr so command output stays pipeable. `RUST_LOG` wins over
//! the configured level.

use tracing_subscriber::EnvFilter;

pub fn init(configured_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

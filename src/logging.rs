//! Logging initialization.
//!
//! The library only emits `tracing` events; user-visible messaging is the
//! caller's job. The CLI logs to stderr so command output stays clean.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize a stderr subscriber. `debug_override` forces the `debug`
/// level (the `--debug` flag); otherwise `RUST_LOG` or `warn` applies.
pub fn init_logging(debug_override: bool) {
    let default_level = if debug_override { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

//! Diagnostic logging
//!
//! Diagnostics go to stderr through `tracing`; stdout stays reserved for
//! command output. The audit log is separate and records data changes.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "TALLY_LOG";

/// Install the global subscriber.
///
/// `TALLY_LOG` wins when set; otherwise `default_level` is used. Calling
/// this twice is harmless: the second install is ignored.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}

/// Filter directive for a `-v` count on top of the configured level
pub fn level_for_verbosity(configured: &str, verbose: u8) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

//! Logging setup.
//!
//! Logs go to stderr so stdout carries only command output. `RUST_LOG`
//! takes precedence over the `--verbose` flag.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::CliError;

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber.
pub fn init_logging(verbose: bool) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .map_err(|e| CliError::InvalidArgument(format!("Invalid log filter: {}", e)))?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()
        .map_err(|e| CliError::Other(format!("Failed to initialize logging: {}", e)))
}

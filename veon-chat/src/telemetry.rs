//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use veon_core::config::GeneralConfig;

use crate::error::{ChatError, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `general.log_level` when set. Output is JSON lines
/// when `general.json_logs` is true.
///
/// # Errors
/// Returns [`ChatError::Telemetry`] if the filter directive is invalid or a
/// global subscriber is already installed.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| ChatError::Telemetry(format!("bad log level {:?}: {e}", config.log_level)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ChatError::Telemetry(e.to_string()))
}

//! Tracing subscriber bootstrap shared by the server and the CLI.

use anyhow::anyhow;
use library_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Build the event filter: `RUST_LOG` wins, then the configured level.
pub fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.log_level)
            .map_err(|e| anyhow!("invalid log level '{}': {}", settings.log_level, e)),
    }
}

/// Install the global tracing subscriber.
///
/// Calling this twice is an error, so binaries call it once at startup.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;

    let installed = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;

    tracing::info!(
        target: "library-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_accepted() {
        let settings = TelemetrySettings {
            log_level: "warn,library_app=debug".to_string(),
            log_format: LogFormat::Json,
        };
        assert!(env_filter(&settings).is_ok());
    }

    #[test]
    fn second_init_fails() {
        let settings = TelemetrySettings::default();
        // The first call may race with other tests in the binary; only the
        // second one is guaranteed to find a subscriber already installed.
        let _ = init(&settings);
        assert!(init(&settings).is_err());
    }
}

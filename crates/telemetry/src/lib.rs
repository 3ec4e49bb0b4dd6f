//! Logging bootstrap for the admin tooling.
//!
//! Logs go to stderr so that records and counts printed on stdout stay
//! pipeable.

use anyhow::anyhow;
use production_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins over the configured filter when set.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .map_err(|err| anyhow!("invalid log filter '{}': {}", settings.filter, err))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {}", err))?;

    tracing::debug!(
        target: "production-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

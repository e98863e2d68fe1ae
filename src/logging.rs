//! Tracing setup for hosts that do not install their own subscriber.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// Error returned when a global subscriber is already installed.
#[derive(Debug, thiserror::Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct LoggingError(#[from] tracing_subscriber::util::TryInitError);

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins over the configured filter when it is set.
pub fn init(settings: &LoggingSettings) -> Result<(), LoggingError> {
    tracing_subscriber::registry()
        .with(filter(settings))
        .with(fmt::layer().with_ansi(settings.ansi).with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

fn filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter))
}

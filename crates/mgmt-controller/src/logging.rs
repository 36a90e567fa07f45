//! Tracing setup for the controller binary

use crate::config::{ControllerConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured filter. Output goes to stderr so the
/// binary's stdout stays machine readable.
pub fn init(config: &ControllerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter.as_str().into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

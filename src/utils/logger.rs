use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid logging.level '{level}': {source}")]
    InvalidLevel {
        level: String,
        #[source]
        source: ParseError,
    },
    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Builds the filter: `RUST_LOG` when set, otherwise `logging.level`, which
/// may be a bare level or any `EnvFilter` directive list.
fn build_filter(logging_config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = logging_config.level.trim().to_lowercase();
    EnvFilter::try_new(&level).map_err(|source| LoggingError::InvalidLevel { level, source })
}

/// Installs the global tracing subscriber. `log` records (emitted by sqlx)
/// are bridged into tracing by the subscriber itself.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter_layer = build_filter(logging_config)?;
    let registry = tracing_subscriber::registry().with(filter_layer);

    let installed = match logging_config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Console => registry.with(fmt::layer().pretty()).try_init(),
    };

    installed.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

//! Logging setup
//!
//! Core and handler crates log through `tracing` when built for the host;
//! this installs the subscriber that prints it.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;

/// Filter used when neither `RUST_LOG` nor the config set one
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter: `RUST_LOG` wins over `configured`, which wins over
/// [`DEFAULT_FILTER`]
pub fn filter(configured: Option<&str>) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = configured.unwrap_or(DEFAULT_FILTER);
    EnvFilter::try_new(directives).map_err(|_| ConfigError::LogFilter(directives.to_owned()))
}

/// Check that `directives` parse as an env filter
pub fn check_filter(directives: &str) -> Result<(), ConfigError> {
    EnvFilter::try_new(directives)
        .map(|_| ())
        .map_err(|_| ConfigError::LogFilter(directives.to_owned()))
}

/// Install the global subscriber
///
/// Returns `false` if a subscriber was already installed (tests, or a host
/// that set up its own); that is not an error.
pub fn init(configured: Option<&str>) -> bool {
    let filter = filter(configured).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .is_ok()
}

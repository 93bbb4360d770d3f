//! TOML parsing and validation

use tracing::debug;

use super::RuntimeConfig;
use crate::error::ConfigError;
use crate::logging;

/// Parse and validate a runtime configuration
pub fn parse_config(input: &str) -> Result<RuntimeConfig, ConfigError> {
    let config: RuntimeConfig = toml::from_str(input)?;
    validate(&config)?;
    debug!(
        "parsed config: restrict_flow={}, {} object profile(s)",
        config.session.restrict_flow,
        config.profiles.objects.len()
    );
    Ok(config)
}

/// Reject values the engine could not run with
pub fn validate(config: &RuntimeConfig) -> Result<(), ConfigError> {
    config
        .profiles
        .validate()
        .map_err(|(key, error)| ConfigError::Profile {
            scope: match key {
                Some(key) => format!("`{key}`"),
                None => "default".to_owned(),
            },
            error,
        })?;
    if let Some(filter) = &config.session.log_filter {
        logging::check_filter(filter)?;
    }
    Ok(())
}

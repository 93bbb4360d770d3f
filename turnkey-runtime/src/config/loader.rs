//! Configuration files
//!
//! A missing or broken file is not fatal for [`load_or_default`]: the run
//! continues on built-in defaults and the problem is logged.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::{parse_config, RuntimeConfig};
use crate::error::ConfigError;

/// Read and parse the configuration at `path`
pub fn load(path: impl AsRef<Path>) -> Result<RuntimeConfig, ConfigError> {
    let path = path.as_ref();
    info!("loading configuration from {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes", text.len());

    let config = parse_config(&text)?;
    log_config_summary(&config);
    Ok(config)
}

/// Like [`load`], falling back to defaults on any error
pub fn load_or_default(path: impl AsRef<Path>) -> RuntimeConfig {
    match load(path) {
        Ok(config) => config,
        Err(ConfigError::Io { path, source }) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!("no configuration at {}, using defaults", path.display());
            RuntimeConfig::default()
        }
        Err(e) => {
            warn!("{e}, using defaults");
            RuntimeConfig::default()
        }
    }
}

fn log_config_summary(config: &RuntimeConfig) {
    info!("configuration loaded");
    debug!("  restrict_flow: {}", config.session.restrict_flow);
    debug!("  design_time: {}", config.session.design_time);
    debug!("  {} object profile(s)", config.profiles.objects.len());
}

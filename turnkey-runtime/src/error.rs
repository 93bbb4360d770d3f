//! Runtime errors

use std::path::PathBuf;

use thiserror::Error;
use turnkey_core::config::ProfileError;
use turnkey_core::sequence::EngineError;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {scope} profile: {error}")]
    Profile { scope: String, error: ProfileError },

    #[error("invalid log filter `{0}`")]
    LogFilter(String),
}

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Engine refused the call; step-level failures never end up here
    #[error("engine: {0}")]
    Engine(EngineError),
}

impl From<EngineError> for SessionError {
    fn from(e: EngineError) -> Self {
        SessionError::Engine(e)
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_error_message() {
        let e = ConfigError::Profile {
            scope: "default valve".into(),
            error: ProfileError::NonPositiveThreshold,
        };
        assert_eq!(
            e.to_string(),
            "invalid default valve profile: threshold must be positive"
        );
    }

    #[test]
    fn test_engine_error_converts() {
        let e: SessionError = EngineError::NotRunning.into();
        assert!(matches!(e, SessionError::Engine(EngineError::NotRunning)));
    }
}

//! Runtime configuration
//!
//! Loaded from TOML. Every section is optional:
//!
//! ```toml
//! [session]
//! restrict_flow = true
//! design_time = false
//! log_filter = "turnkey_core=debug,info"
//!
//! [profiles.valve]
//! tighten_threshold_deg = 90.0
//! tolerance_deg = 5.0
//!
//! [profiles.knob]
//! tolerance_deg = 3.0
//!
//! [[profiles.object]]
//! key = "ball-valve"
//! valve = { tighten_threshold_deg = 180.0, sockets = { tags = ["dn50"] } }
//! ```

pub mod loader;
pub mod toml;

use serde::{Deserialize, Serialize};
use turnkey_core::config::ProfileSet;

pub use self::loader::{load, load_or_default};
pub use self::toml::parse_config;

/// Per-run switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Freeze objects that are not part of the current step
    pub restrict_flow: bool,
    /// Host is in design-time editing; entity lookups are never cached
    pub design_time: bool,
    /// `tracing` filter directives, overridden by `RUST_LOG`
    pub log_filter: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            restrict_flow: true,
            design_time: false,
            log_filter: None,
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub session: SessionConfig,
    pub profiles: ProfileSet,
}

//! Host integration for the training sequence engine
//!
//! Wires the `no_std` core and the stock handlers into something a host
//! application can drive:
//!
//! - [`config`]: TOML runtime configuration (session flags, profiles)
//! - [`logging`]: `tracing` subscriber setup
//! - [`Session`]: one training run over one host [`World`](turnkey_core::traits::World)

pub mod config;
pub mod error;
pub mod logging;
pub mod scene;
pub mod session;

#[cfg(test)]
mod scenarios;

pub use config::{RuntimeConfig, SessionConfig};
pub use error::{ConfigError, Result, SessionError};
pub use scene::Scene;
pub use session::{CompletionSink, Session};

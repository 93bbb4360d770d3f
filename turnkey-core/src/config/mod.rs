//! Configuration types
//!
//! Program structure handed to the engine by an external loader, plus the
//! per-object parameter profiles consumed by step handlers.

pub mod profile;
pub mod reference;
pub mod types;

pub use profile::*;
pub use reference::EntityReference;
pub use types::*;

//! camp-core - Shared functionality for camp-bridge crates
//!
//! Standard locations on disk and credential loading for the Basecamp bridge.

pub mod config;
pub mod paths;

pub use config::{Config, ConfigError};
pub use paths::Paths;

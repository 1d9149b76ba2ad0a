//! Configuration core for a desktop application shell.
//!
//! Loads a section/key configuration file, applies defaults, validates it,
//! reports environment and security advisories, and publishes an immutable
//! snapshot plus a redacted projection for the UI layer.

pub mod config;
pub mod observability;
pub mod security;

pub use config::{Config, ConfigError, ConfigLoader, ConfigStore, Environment, PublicConfig};

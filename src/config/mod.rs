//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file ([section] key = value)
//!     → source.rs (parse into section/key pairs)
//!     → loader.rs (defaults, coercion, enumerations)
//!     → validation.rs (structural checks, all errors collected)
//!     → policy.rs + security::policy (advisories, logged as warnings)
//!     → loader.rs (create log directory, derive user agent)
//!     → Config (validated, immutable)
//!     → published through ConfigStore as Arc<Config>
//!
//! On reload (explicit or from watcher.rs):
//!     → full pipeline again
//!     → atomic swap of Arc<Config>; failures keep the old snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Malformed scalars fall back to defaults; unknown enumeration values fail

pub mod loader;
pub mod policy;
pub mod public;
pub mod schema;
pub mod source;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::{advisories, ConfigError, ConfigLoader, DEFAULT_ENV_VAR};
pub use public::{AppInfo, PublicConfig};
pub use schema::{Config, Environment};
pub use store::ConfigStore;
pub use validation::{Finding, Severity};

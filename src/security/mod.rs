//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Validated Config:
//!     → policy.rs (advisory checks, warnings only)
//!     → defaults.rs (optional: generate secrets, harden production)
//! ```
//!
//! # Design Decisions
//! - Advisories never block startup; they are logged
//! - Hardening is opt-in and works on a copy that replaces the snapshot

pub mod defaults;
pub mod policy;

pub use defaults::{apply_security_defaults, generate_secure_secret, SecretError};
pub use policy::SecurityValidator;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (debug: parsing, info: load/reload,
//!       warn: advisories and malformed values, error: failed reloads)
//!
//! Consumers:
//!     → logging.rs (console and/or rolling file, JSON or text)
//! ```

pub mod logging;

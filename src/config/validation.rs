//! Configuration validation.
//!
//! # Responsibilities
//! - Structural validation (required fields, numeric and duration ranges)
//! - Enumerated fields are checked while values are resolved, see `loader.rs`
//! - Advisory findings for environment and security policy share the
//!   `Finding` type but never fail a load
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<Finding>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::schema::Config;

/// How much a finding matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Structural violation; aborts the load.
    Error,
    /// Policy advisory; reported and ignored.
    Warning,
}

/// A single validation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Check every structural constraint and report all violations.
pub fn validate_config(config: &Config) -> Result<(), Vec<Finding>> {
    let mut check = Checker::default();

    let app = &config.app;
    check.length("app.name", &app.name, 1, 100);
    if check.required("app.version", &app.version) && !is_semver(&app.version) {
        check.fail(format!(
            "app.version: '{}' is not a MAJOR.MINOR.PATCH version",
            app.version
        ));
    }

    let api = &config.api;
    if check.required("api.base_url", &api.base_url) && !is_absolute_url(&api.base_url) {
        check.fail(format!("api.base_url: '{}' is not an absolute URL", api.base_url));
    }
    check.duration("api.timeout", api.timeout, secs(1), secs(300));
    check.range("api.retry_count", api.retry_count, 0, 10);
    check.duration("api.retry_delay", api.retry_delay, secs(0), secs(60));
    check.range("api.max_idle_conn", api.max_idle_conn, 1, 100);

    let auth = &config.auth;
    check.duration("auth.token_expiry", auth.token_expiry, secs(300), secs(86_400));
    check.duration("auth.refresh_threshold", auth.refresh_threshold, secs(60), secs(3_600));
    check.range("auth.max_login_attempts", auth.max_login_attempts, 1, 10);
    check.duration("auth.lockout_duration", auth.lockout_duration, mins(1), hours(24));
    check.duration("auth.session_timeout", auth.session_timeout, mins(5), hours(24));
    check.duration("auth.remember_me_duration", auth.remember_me_duration, hours(1), hours(720));

    let log = &config.log;
    if log.output.writes_file() {
        check.required("log.file_path", &log.file_path);
    }
    check.range("log.max_size", log.max_size, 1, 1_000);
    check.range("log.max_backups", log.max_backups, 0, 100);
    check.range("log.max_age", log.max_age, 1, 365);

    let db = &config.database;
    check.required("database.host", &db.host);
    check.range("database.port", db.port, 1, 65_535);
    check.length("database.name", &db.name, 1, 100);
    check.range("database.max_open_conns", db.max_open_conns, 1, 100);
    check.range("database.max_idle_conns", db.max_idle_conns, 1, 100);
    check.duration("database.conn_lifetime", db.conn_lifetime, mins(1), hours(24));

    let security = &config.security;
    check.range("security.rate_limit_rps", security.rate_limit_rps, 1, 10_000);
    check.range("security.rate_limit_burst", security.rate_limit_burst, 1, 1_000);

    let window = &config.window;
    check.range("window.width", window.width, 400, 4_000);
    check.range("window.height", window.height, 300, 3_000);

    let cache = &config.cache;
    check.duration("cache.ttl", cache.ttl, secs(1), hours(24));
    check.range("cache.max_size", cache.max_size, 1, 10_000);
    check.range("cache.max_items", cache.max_items, 100, 1_000_000);

    check.finish()
}

/// `MAJOR.MINOR.PATCH` with numeric parts.
pub fn is_semver(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

fn is_absolute_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| url.has_host())
        .unwrap_or(false)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn mins(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

fn hours(n: u64) -> Duration {
    Duration::from_secs(n * 3_600)
}

/// Accumulates error findings.
#[derive(Default)]
struct Checker {
    findings: Vec<Finding>,
}

impl Checker {
    fn fail(&mut self, message: String) {
        self.findings.push(Finding::error(message));
    }

    /// Returns whether the value was present.
    fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.fail(format!("{field}: is required"));
            return false;
        }
        true
    }

    fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        if !self.required(field, value) {
            return;
        }
        let len = value.chars().count();
        if len < min || len > max {
            self.fail(format!("{field}: length {len} is outside {min}..={max}"));
        }
    }

    fn range(&mut self, field: &str, value: u32, min: u32, max: u32) {
        if !(min..=max).contains(&value) {
            self.fail(format!("{field}: {value} is outside {min}..={max}"));
        }
    }

    fn duration(&mut self, field: &str, value: Duration, min: Duration, max: Duration) {
        if !(min..=max).contains(&value) {
            self.fail(format!(
                "{field}: {} is outside {}..={}",
                humantime::format_duration(value),
                humantime::format_duration(min),
                humantime::format_duration(max),
            ));
        }
    }

    fn finish(self) -> Result<(), Vec<Finding>> {
        if self.findings.is_empty() {
            Ok(())
        } else {
            Err(self.findings)
        }
    }
}

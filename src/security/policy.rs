//! Security advisory checks.
//!
//! # Responsibilities
//! - CORS origin shape and coverage
//! - CSRF secret presence and strength
//! - Rate limit sanity
//! - A stricter pass when the environment is production
//!
//! All results are warnings; they never block a load.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::policy::references_loopback;
use crate::config::schema::{Config, Environment, SslMode};
use crate::config::validation::Finding;

/// Shortest CSRF secret that is not flagged.
pub const MIN_CSRF_SECRET_LEN: usize = 32;

static ORIGIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[a-zA-Z0-9.-]+(:[0-9]+)?$").expect("origin pattern is valid")
});

/// Whether `origin` has the `scheme://host[:port]` shape. `*` is accepted.
pub fn is_valid_origin(origin: &str) -> bool {
    origin == "*" || ORIGIN_PATTERN.is_match(origin)
}

/// Evaluates security-relevant combinations of settings.
pub struct SecurityValidator<'a> {
    config: &'a Config,
}

impl<'a> SecurityValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn validate(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let security = &self.config.security;

        if security.cors_enabled {
            if security.cors_origins.is_empty() {
                findings.push(Finding::warning("CORS is enabled but no origins are specified"));
            }
            for origin in &security.cors_origins {
                if origin == "*" {
                    findings.push(Finding::warning(
                        "Wildcard CORS origin '*' allows any site and is not recommended",
                    ));
                } else if !is_valid_origin(origin) {
                    findings.push(Finding::warning(format!("Invalid CORS origin: {origin}")));
                }
            }
        }

        if security.csrf_enabled {
            if security.csrf_secret.is_empty() {
                findings.push(Finding::warning("CSRF is enabled but no secret is provided"));
            } else if security.csrf_secret.chars().count() < MIN_CSRF_SECRET_LEN {
                findings.push(Finding::warning(format!(
                    "CSRF secret should be at least {MIN_CSRF_SECRET_LEN} characters long"
                )));
            }
        }

        if security.rate_limit_enabled {
            if security.rate_limit_rps == 0 {
                findings.push(Finding::warning("Rate limiting is enabled but RPS is not positive"));
            }
            if security.rate_limit_burst == 0 {
                findings.push(Finding::warning(
                    "Rate limiting is enabled but burst is not positive",
                ));
            }
        }

        if self.config.app.environment == Environment::Production {
            findings.extend(self.validate_production());
        }

        findings
    }

    fn validate_production(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let security = &self.config.security;

        if security.cors_enabled {
            for origin in security.cors_origins.iter().filter(|o| references_loopback(o)) {
                findings.push(Finding::warning(format!(
                    "Localhost origin {origin} should not be allowed in production"
                )));
            }
        }

        if self.config.database.ssl_mode == SslMode::Disable {
            findings.push(Finding::warning("Database SSL should be enabled in production"));
        }

        if self.config.api.timeout.as_secs() > 60 {
            findings.push(Finding::warning(
                "API timeout is very high for production environment",
            ));
        }

        findings
    }
}

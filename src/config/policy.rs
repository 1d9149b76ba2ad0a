//! Environment-specific advisory checks.
//!
//! Every rule here produces a warning. Production rules read like hard
//! requirements but are still reported, not enforced.

use crate::config::schema::{Config, Environment, SslMode};
use crate::config::validation::Finding;

/// Hosts treated as the local machine.
pub(crate) const LOOPBACK_MARKERS: [&str; 2] = ["localhost", "127.0.0.1"];

pub(crate) fn references_loopback(value: &str) -> bool {
    LOOPBACK_MARKERS.iter().any(|marker| value.contains(marker))
}

/// Validates a configuration against the rules of one environment.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentValidator {
    environment: Environment,
}

impl EnvironmentValidator {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn validate(&self, config: &Config) -> Vec<Finding> {
        match self.environment {
            Environment::Development => validate_development(config),
            Environment::Staging => validate_staging(config),
            Environment::Production => validate_production(config),
        }
    }
}

fn validate_development(config: &Config) -> Vec<Finding> {
    let mut findings = Vec::new();

    if !config.app.debug {
        findings.push(Finding::warning("Debug mode should be enabled in development"));
    }

    let base_url = &config.api.base_url;
    if !references_loopback(base_url) && !base_url.contains("test") {
        findings.push(Finding::warning(
            "Development should typically use localhost or test API URLs",
        ));
    }

    findings
}

fn validate_staging(config: &Config) -> Vec<Finding> {
    let mut findings = Vec::new();

    if references_loopback(&config.api.base_url) {
        findings.push(Finding::warning("Staging should not use localhost API URLs"));
    }

    if config.api.timeout.as_secs() < 10 {
        findings.push(Finding::warning("API timeout is too low for staging environment"));
    }

    findings
}

fn validate_production(config: &Config) -> Vec<Finding> {
    let mut findings = Vec::new();

    if config.app.debug {
        findings.push(Finding::warning("Debug mode must be disabled in production"));
    }

    if config.app.dev_tools {
        findings.push(Finding::warning("Dev tools must be disabled in production"));
    }

    if !config.api.base_url.starts_with("https://") {
        findings.push(Finding::warning("Production must use HTTPS API URLs"));
    }

    if config.database.ssl_mode == SslMode::Disable {
        findings.push(Finding::warning("Database SSL must be enabled in production"));
    }

    if !config.security.rate_limit_enabled {
        findings.push(Finding::warning("Rate limiting should be enabled in production"));
    }

    findings
}

//! Projections that are safe to hand to the UI layer.

use serde::Serialize;

use crate::config::schema::{Config, Environment};

/// Placeholder written over secrets in [`sanitized`].
pub const MASK: &str = "***MASKED***";

/// Whitelisted subset of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub app: PublicAppConfig,
    pub api: PublicApiConfig,
    pub window: PublicWindowConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAppConfig {
    pub environment: Environment,
    pub name: String,
    pub version: String,
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicApiConfig {
    /// Whole seconds.
    pub timeout: u64,
    pub retry_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicWindowConfig {
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub fullscreen: bool,
}

impl From<&Config> for PublicConfig {
    fn from(config: &Config) -> Self {
        Self {
            app: PublicAppConfig {
                environment: config.app.environment,
                name: config.app.name.clone(),
                version: config.app.version.clone(),
                debug: config.app.debug,
            },
            api: PublicApiConfig {
                timeout: config.api.timeout.as_secs(),
                retry_count: config.api.retry_count,
            },
            window: PublicWindowConfig {
                width: config.window.width,
                height: config.window.height,
                resizable: config.window.resizable,
                fullscreen: config.window.fullscreen,
            },
        }
    }
}

/// Application metadata shown in about boxes and window titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub environment: Environment,
    pub debug: bool,
}

impl From<&Config> for AppInfo {
    fn from(config: &Config) -> Self {
        Self {
            name: config.app.name.clone(),
            version: config.app.version.clone(),
            environment: config.app.environment,
            debug: config.app.debug,
        }
    }
}

/// Full copy with credentials masked. For diagnostics, not for the UI.
pub fn sanitized(config: &Config) -> Config {
    let mut copy = config.clone();

    if !copy.database.password.is_empty() {
        copy.database.password = MASK.to_string();
    }
    if !copy.security.csrf_secret.is_empty() {
        copy.security.csrf_secret = MASK.to_string();
    }

    copy
}

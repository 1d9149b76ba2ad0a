//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! desktop shell. Every field carries the default that applies when the
//! source leaves it out; constraints live in `validation.rs`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// Root configuration for the application.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct Config {
    /// Application identity and feature flags.
    pub app: AppConfig,

    /// Remote API client settings.
    pub api: ApiConfig,

    /// Session and token lifetimes.
    pub auth: AuthConfig,

    /// Logging output settings.
    pub log: LogConfig,

    /// Database connection settings.
    pub database: DatabaseConfig,

    /// CORS, CSRF and rate limiting.
    pub security: SecurityConfig,

    /// Main window geometry.
    pub window: WindowConfig,

    /// Cache knobs. No cache is implemented here; the values are only
    /// validated and handed to whoever builds one.
    pub cache: CacheConfig,
}

/// Error returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not one of {allowed}")]
pub struct UnknownVariant {
    pub value: String,
    pub allowed: &'static str,
}

/// Generates `as_str`, `Display`, `FromStr` for a closed string enumeration.
/// Matching is exact and case-sensitive.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALLOWED: &'static str = concat!($($text, " "),+);

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        value: s.to_string(),
                        allowed: Self::ALLOWED.trim_end(),
                    }),
                }
            }
        }
    };
}

/// Deployment profile. Selects defaults and which advisory checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

string_enum!(Environment {
    Development => "development",
    Staging => "staging",
    Production => "production",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

string_enum!(LogLevel {
    Debug => "debug",
    Info => "info",
    Warn => "warn",
    Error => "error",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

string_enum!(LogFormat {
    Json => "json",
    Text => "text",
});

/// Where log records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

string_enum!(LogOutput {
    Console => "console",
    File => "file",
    Both => "both",
});

impl LogOutput {
    /// True when records go to `log.file_path`.
    pub fn writes_file(&self) -> bool {
        matches!(self, Self::File | Self::Both)
    }
}

/// Database transport security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    #[default]
    Disable,
    Require,
    VerifyCa,
    VerifyFull,
}

string_enum!(SslMode {
    Disable => "disable",
    Require => "require",
    VerifyCa => "verify-ca",
    VerifyFull => "verify-full",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    #[default]
    Lru,
    Lfu,
    Fifo,
}

string_enum!(EvictionPolicy {
    Lru => "lru",
    Lfu => "lfu",
    Fifo => "fifo",
});

/// Application-level settings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppConfig {
    pub environment: Environment,

    /// Display name, also used for the window title.
    pub name: String,

    /// Semantic version (`MAJOR.MINOR.PATCH`).
    pub version: String,

    pub debug: bool,
    pub hot_reload: bool,
    pub dev_tools: bool,
    pub mock_api: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            name: "Desktop Shell".to_string(),
            version: "1.0.0".to_string(),
            debug: true,
            hot_reload: true,
            dev_tools: true,
            mock_api: false,
        }
    }
}

/// Remote API client settings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL every API path is appended to.
    pub base_url: String,

    /// Per-request timeout.
    #[serde(with = "as_humantime")]
    pub timeout: Duration,

    /// Extra attempts after the first failure.
    pub retry_count: u32,

    /// Delay between attempts.
    #[serde(with = "as_humantime")]
    pub retry_delay: Duration,

    /// Empty means derived from `app.name`/`app.version` after validation.
    pub user_agent: String,

    pub max_idle_conn: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout: Duration::from_secs(30),
            retry_count: 3,
            retry_delay: Duration::from_secs(1),
            user_agent: String::new(),
            max_idle_conn: 10,
        }
    }
}

/// Authentication lifetimes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthConfig {
    #[serde(with = "as_humantime")]
    pub token_expiry: Duration,

    /// Refresh the access token once it has less than this left.
    #[serde(with = "as_humantime")]
    pub refresh_threshold: Duration,

    pub max_login_attempts: u32,

    #[serde(with = "as_humantime")]
    pub lockout_duration: Duration,

    #[serde(with = "as_humantime")]
    pub session_timeout: Duration,

    #[serde(with = "as_humantime")]
    pub remember_me_duration: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_expiry: Duration::from_secs(3600),
            refresh_threshold: Duration::from_secs(300),
            max_login_attempts: 5,
            lockout_duration: Duration::from_secs(15 * 60),
            session_timeout: Duration::from_secs(24 * 3600),
            remember_me_duration: Duration::from_secs(30 * 24 * 3600),
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,

    /// Log file, used when `output` is `file` or `both`.
    pub file_path: String,

    /// Megabytes per file.
    pub max_size: u32,

    /// Rotated files to keep.
    pub max_backups: u32,

    /// Days to keep rotated files.
    pub max_age: u32,

    pub compress: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Json,
            output: LogOutput::Console,
            file_path: "logs/app.log".to_string(),
            max_size: 100,
            max_backups: 3,
            max_age: 28,
            compress: true,
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u32,
    pub name: String,
    pub username: String,
    pub password: String,
    pub ssl_mode: SslMode,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,

    #[serde(with = "as_humantime")]
    pub conn_lifetime: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "app".to_string(),
            username: String::new(),
            password: String::new(),
            ssl_mode: SslMode::Disable,
            max_open_conns: 25,
            max_idle_conns: 5,
            conn_lifetime: Duration::from_secs(5 * 60),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SecurityConfig {
    pub cors_enabled: bool,

    /// Allowed origins, `scheme://host[:port]` or `*`.
    pub cors_origins: Vec<String>,

    pub rate_limit_enabled: bool,

    /// Sustained requests per second.
    pub rate_limit_rps: u32,

    /// Burst capacity.
    pub rate_limit_burst: u32,

    pub csrf_enabled: bool,
    pub csrf_secret: String,
}

/// Rate limit applied when production hardening has to switch it on.
pub const DEFAULT_RATE_LIMIT_RPS: u32 = 100;
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 200;

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_enabled: true,
            cors_origins: Vec::new(),
            rate_limit_enabled: false,
            rate_limit_rps: DEFAULT_RATE_LIMIT_RPS,
            rate_limit_burst: DEFAULT_RATE_LIMIT_BURST,
            csrf_enabled: false,
            csrf_secret: String::new(),
        }
    }
}

/// Main window geometry and flags.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub fullscreen: bool,
    pub maximized: bool,
    pub minimized: bool,
    pub always_on_top: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            resizable: true,
            fullscreen: false,
            maximized: false,
            minimized: false,
            always_on_top: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheConfig {
    pub enabled: bool,

    #[serde(with = "as_humantime")]
    pub ttl: Duration,

    /// Megabytes.
    pub max_size: u32,

    pub max_items: u32,
    pub compression_enabled: bool,
    pub eviction_policy: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: Duration::from_secs(3600),
            max_size: 100,
            max_items: 10_000,
            compression_enabled: false,
            eviction_policy: EvictionPolicy::Lru,
        }
    }
}

/// Serializes durations the way they are written in the source (`1h`, `30s`).
mod as_humantime {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parsing_is_exact() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert!("Production".parse::<Environment>().is_err());
        assert!(" staging".parse::<Environment>().is_err());
        assert_eq!("verify-ca".parse::<SslMode>().unwrap(), SslMode::VerifyCa);
    }

    #[test]
    fn test_unknown_variant_lists_allowed_values() {
        let err = "verbose".parse::<LogLevel>().unwrap_err();
        assert_eq!(err.to_string(), "'verbose' is not one of debug info warn error");
    }

    #[test]
    fn test_durations_serialize_in_source_form() {
        let json = serde_json::to_value(AuthConfig::default()).unwrap();
        assert_eq!(json["token_expiry"], "1h");
        assert_eq!(json["lockout_duration"], "15m");
    }

    #[test]
    fn test_log_output_file_targets() {
        assert!(!LogOutput::Console.writes_file());
        assert!(LogOutput::File.writes_file());
        assert!(LogOutput::Both.writes_file());
    }
}

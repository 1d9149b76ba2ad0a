//! Configuration loading from disk.
//!
//! Pipeline: read → parse → resolve (defaults, coercion, enumerations) →
//! structural validation → advisories → post-validation adjustment.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::config::policy::EnvironmentValidator;
use crate::config::schema::{
    ApiConfig, AppConfig, AuthConfig, CacheConfig, Config, DatabaseConfig, Environment,
    LogConfig, SecurityConfig, UnknownVariant, WindowConfig,
};
use crate::config::source::Source;
use crate::config::validation::{validate_config, Finding};
use crate::security::{SecretError, SecurityValidator};

/// Variable consulted for the environment when the source does not set one.
pub const DEFAULT_ENV_VAR: &str = "APP_ENV";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", display_findings(.0))]
    Validation(Vec<Finding>),

    #[error("post-validation adjustment failed for {}: {source}", path.display())]
    Adjustment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to apply security defaults: {0}")]
    Secret(#[from] SecretError),

    #[error("configuration not loaded; load() must succeed before it is read")]
    NotLoaded,
}

fn display_findings(findings: &[Finding]) -> String {
    let list: Vec<String> = findings.iter().map(ToString::to_string).collect();
    format!("Validation failed: {}", list.join(", "))
}

/// Reads a section/key source and produces a validated [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
    env_var: String,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_var: DEFAULT_ENV_VAR.to_string(),
        }
    }

    /// Use a different variable to select the environment.
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Run the full pipeline against the source file.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), "Read configuration source");
        self.load_source(&Source::parse(&content))
    }

    /// Run the pipeline on an already parsed source.
    pub fn load_source(&self, source: &Source) -> Result<Config, ConfigError> {
        let (mut config, mut errors) = self.resolve(source);

        if let Err(found) = validate_config(&config) {
            errors.extend(found);
        }
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        for finding in advisories(&config) {
            tracing::warn!(environment = %config.app.environment, "{}", finding);
        }

        adjust(&mut config)?;

        tracing::info!(
            environment = %config.app.environment,
            name = %config.app.name,
            version = %config.app.version,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Apply defaults and coercion. Returns enumeration violations
    /// alongside the resolved values.
    fn resolve(&self, source: &Source) -> (Config, Vec<Finding>) {
        let mut r = Resolver::new(source);

        let environment = r.environment(&self.env_var);

        let d = AppConfig::default();
        let app = AppConfig {
            environment,
            name: r.string("app", "name", d.name),
            version: r.string("app", "version", d.version),
            debug: r.boolean("app", "debug", d.debug),
            hot_reload: r.boolean("app", "hot_reload", d.hot_reload),
            dev_tools: r.boolean("app", "dev_tools", d.dev_tools),
            mock_api: r.boolean("app", "mock_api", d.mock_api),
        };

        let d = ApiConfig::default();
        let api = ApiConfig {
            base_url: r.string("api", "base_url", d.base_url),
            timeout: r.duration("api", "timeout", d.timeout),
            retry_count: r.integer("api", "retry_count", d.retry_count),
            retry_delay: r.duration("api", "retry_delay", d.retry_delay),
            user_agent: r.string("api", "user_agent", d.user_agent),
            max_idle_conn: r.integer("api", "max_idle_conn", d.max_idle_conn),
        };

        let d = AuthConfig::default();
        let auth = AuthConfig {
            token_expiry: r.duration("auth", "token_expiry", d.token_expiry),
            refresh_threshold: r.duration("auth", "refresh_threshold", d.refresh_threshold),
            max_login_attempts: r.integer("auth", "max_login_attempts", d.max_login_attempts),
            lockout_duration: r.duration("auth", "lockout_duration", d.lockout_duration),
            session_timeout: r.duration("auth", "session_timeout", d.session_timeout),
            remember_me_duration: r.duration(
                "auth",
                "remember_me_duration",
                d.remember_me_duration,
            ),
        };

        let d = LogConfig::default();
        let log = LogConfig {
            level: r.enumeration("log", "level", d.level),
            format: r.enumeration("log", "format", d.format),
            output: r.enumeration("log", "output", d.output),
            file_path: r.string("log", "file_path", d.file_path),
            max_size: r.integer("log", "max_size", d.max_size),
            max_backups: r.integer("log", "max_backups", d.max_backups),
            max_age: r.integer("log", "max_age", d.max_age),
            compress: r.boolean("log", "compress", d.compress),
        };

        let d = DatabaseConfig::default();
        let database = DatabaseConfig {
            host: r.string("database", "host", d.host),
            port: r.integer("database", "port", d.port),
            name: r.string("database", "name", d.name),
            username: r.string("database", "username", d.username),
            password: r.string("database", "password", d.password),
            ssl_mode: r.enumeration("database", "ssl_mode", d.ssl_mode),
            max_open_conns: r.integer("database", "max_open_conns", d.max_open_conns),
            max_idle_conns: r.integer("database", "max_idle_conns", d.max_idle_conns),
            conn_lifetime: r.duration("database", "conn_lifetime", d.conn_lifetime),
        };

        let d = SecurityConfig::default();
        let security = SecurityConfig {
            cors_enabled: r.boolean("security", "cors_enabled", d.cors_enabled),
            cors_origins: r.list("security", "cors_origins"),
            rate_limit_enabled: r.boolean("security", "rate_limit_enabled", d.rate_limit_enabled),
            rate_limit_rps: r.integer("security", "rate_limit_rps", d.rate_limit_rps),
            rate_limit_burst: r.integer("security", "rate_limit_burst", d.rate_limit_burst),
            csrf_enabled: r.boolean("security", "csrf_enabled", d.csrf_enabled),
            csrf_secret: r.string("security", "csrf_secret", d.csrf_secret),
        };

        let d = WindowConfig::default();
        let window = WindowConfig {
            width: r.integer("window", "width", d.width),
            height: r.integer("window", "height", d.height),
            resizable: r.boolean("window", "resizable", d.resizable),
            fullscreen: r.boolean("window", "fullscreen", d.fullscreen),
            maximized: r.boolean("window", "maximized", d.maximized),
            minimized: r.boolean("window", "minimized", d.minimized),
            always_on_top: r.boolean("window", "always_on_top", d.always_on_top),
        };

        let d = CacheConfig::default();
        let cache = CacheConfig {
            enabled: r.boolean("cache", "enabled", d.enabled),
            ttl: r.duration("cache", "ttl", d.ttl),
            max_size: r.integer("cache", "max_size", d.max_size),
            max_items: r.integer("cache", "max_items", d.max_items),
            compression_enabled: r.boolean("cache", "compression_enabled", d.compression_enabled),
            eviction_policy: r.enumeration("cache", "eviction_policy", d.eviction_policy),
        };

        r.log_unknown_keys();

        let config = Config {
            app,
            api,
            auth,
            log,
            database,
            security,
            window,
            cache,
        };
        (config, r.errors)
    }
}

/// Environment and security advisories for `config`. Never fatal.
pub fn advisories(config: &Config) -> Vec<Finding> {
    let mut findings = EnvironmentValidator::new(config.app.environment).validate(config);
    findings.extend(SecurityValidator::new(config).validate());
    findings
}

/// Create the log directory and derive fields left unset.
fn adjust(config: &mut Config) -> Result<(), ConfigError> {
    if config.log.output.writes_file() {
        let dir = Path::new(&config.log.file_path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = dir {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Adjustment {
                path: dir.to_path_buf(),
                source,
            })?;
        }
    }

    if config.api.user_agent.is_empty() {
        config.api.user_agent = format!("{}/{}", config.app.name, config.app.version);
    }

    Ok(())
}

/// Looks up typed values with fallback to defaults.
///
/// Malformed booleans, integers and durations are ignored with a warning.
/// Unknown enumeration values and numbers too large for their field are
/// recorded as errors.
struct Resolver<'a> {
    source: &'a Source,
    seen: RefCell<HashSet<(String, String)>>,
    errors: Vec<Finding>,
}

impl<'a> Resolver<'a> {
    fn new(source: &'a Source) -> Self {
        Self {
            source,
            seen: RefCell::new(HashSet::new()),
            errors: Vec::new(),
        }
    }

    /// Non-empty raw value. Empty values count as absent.
    fn raw(&self, section: &str, key: &str) -> Option<&'a str> {
        self.seen
            .borrow_mut()
            .insert((section.to_string(), key.to_string()));
        self.source
            .get(section, key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn malformed<T: std::fmt::Debug>(&self, section: &str, key: &str, value: &str, default: T) -> T {
        tracing::warn!(
            field = %format!("{section}.{key}"),
            value,
            default = ?default,
            "Ignoring malformed value, using default"
        );
        default
    }

    fn environment(&mut self, env_var: &str) -> Environment {
        let from_env = std::env::var(env_var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let value = match (self.raw("app", "environment"), from_env) {
            (Some(value), _) => value.to_string(),
            (None, Some(value)) => {
                tracing::debug!(variable = env_var, value = %value, "Environment taken from process environment");
                value
            }
            (None, None) => return Environment::default(),
        };

        self.parse_variant("app.environment", &value, Environment::default())
    }

    fn string(&self, section: &str, key: &str, default: String) -> String {
        self.raw(section, key).map(str::to_string).unwrap_or(default)
    }

    fn boolean(&self, section: &str, key: &str, default: bool) -> bool {
        match self.raw(section, key) {
            None => default,
            Some(value) if value.eq_ignore_ascii_case("true") => true,
            Some(value) if value.eq_ignore_ascii_case("false") => false,
            Some(value) => self.malformed(section, key, value, default),
        }
    }

    fn integer(&mut self, section: &str, key: &str, default: u32) -> u32 {
        let Some(value) = self.raw(section, key) else {
            return default;
        };
        let coerced = parse_integer(value);
        self.settle(section, key, value, coerced, default)
    }

    fn duration(&mut self, section: &str, key: &str, default: Duration) -> Duration {
        let Some(value) = self.raw(section, key) else {
            return default;
        };
        let coerced = parse_duration(value);
        self.settle(section, key, value, coerced, default)
    }

    fn settle<T: std::fmt::Debug>(
        &mut self,
        section: &str,
        key: &str,
        value: &str,
        coerced: Coerced<T>,
        default: T,
    ) -> T {
        match coerced {
            Coerced::Value(parsed) => parsed,
            Coerced::Malformed => self.malformed(section, key, value, default),
            Coerced::Overflow => {
                self.errors.push(Finding::error(format!(
                    "{section}.{key}: {value} is too large to represent"
                )));
                default
            }
        }
    }

    /// Comma-separated list. Absent or empty yields an empty list.
    fn list(&self, section: &str, key: &str) -> Vec<String> {
        self.raw(section, key)
            .map(split_list)
            .unwrap_or_default()
    }

    fn enumeration<T>(&mut self, section: &str, key: &str, default: T) -> T
    where
        T: FromStr<Err = UnknownVariant>,
    {
        match self.raw(section, key) {
            None => default,
            Some(value) => self.parse_variant(&format!("{section}.{key}"), value, default),
        }
    }

    fn parse_variant<T>(&mut self, field: &str, value: &str, fallback: T) -> T
    where
        T: FromStr<Err = UnknownVariant>,
    {
        match value.parse() {
            Ok(variant) => variant,
            Err(err) => {
                self.errors.push(Finding::error(format!("{field}: {err}")));
                fallback
            }
        }
    }

    fn log_unknown_keys(&self) {
        let seen = self.seen.borrow();
        for (section, key) in self.source.keys() {
            if !seen.contains(&(section.to_string(), key.to_string())) {
                tracing::debug!(section, key, "Ignoring unknown configuration key");
            }
        }
    }
}

/// Result of coercing a raw numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerced<T> {
    Value(T),
    /// Not a number of the expected shape. Falls back to the default.
    Malformed,
    /// Well formed, but does not fit the target type. A structural error.
    Overflow,
}

impl<T> Coerced<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Coerced<U> {
        match self {
            Coerced::Value(value) => Coerced::Value(f(value)),
            Coerced::Malformed => Coerced::Malformed,
            Coerced::Overflow => Coerced::Overflow,
        }
    }
}

/// Base-10 digits only.
fn parse_integer<T: TryFrom<u64>>(value: &str) -> Coerced<T> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Coerced::Malformed;
    }
    // An all-digit string only fails to parse when it overflows u64.
    match value.parse::<u64>().ok().and_then(|n| T::try_from(n).ok()) {
        Some(n) => Coerced::Value(n),
        None => Coerced::Overflow,
    }
}

/// Duration string (`30s`, `5m`, `1h 30m`) or bare seconds.
pub fn parse_duration(value: &str) -> Coerced<Duration> {
    let value = value.trim();
    match humantime::parse_duration(value) {
        Ok(duration) => Coerced::Value(duration),
        Err(humantime::DurationError::NumberOverflow) => Coerced::Overflow,
        Err(_) => parse_integer::<u64>(value).map(Duration::from_secs),
    }
}

/// Split on commas and trim each element. Empty input yields an empty list.
pub fn split_list(value: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    value.split(',').map(|item| item.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> ConfigLoader {
        ConfigLoader::new("unused.ini").with_env_var("SHELL_CONFIG_LOADER_UNIT_TEST_ENV")
    }

    fn load(text: &str) -> Result<Config, ConfigError> {
        loader().load_source(&Source::parse(text))
    }

    #[test]
    fn test_duration_forms() {
        assert_eq!(parse_duration("30s"), Coerced::Value(Duration::from_secs(30)));
        assert_eq!(parse_duration("30"), Coerced::Value(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Coerced::Value(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h 30m"), Coerced::Value(Duration::from_secs(5400)));
        assert_eq!(parse_duration("-5"), Coerced::Malformed);
        assert_eq!(parse_duration("soon"), Coerced::Malformed);
        assert_eq!(parse_duration("99999999999999999999999"), Coerced::Overflow);
    }

    #[test]
    fn test_integer_rejects_signs_and_junk() {
        assert_eq!(parse_integer::<u32>("42"), Coerced::Value(42));
        assert_eq!(parse_integer::<u32>("+42"), Coerced::Malformed);
        assert_eq!(parse_integer::<u32>("-1"), Coerced::Malformed);
        assert_eq!(parse_integer::<u32>("4k"), Coerced::Malformed);
    }

    #[test]
    fn test_integer_overflow_is_detected() {
        assert_eq!(parse_integer::<u32>("4294967295"), Coerced::Value(u32::MAX));
        assert_eq!(parse_integer::<u32>("4294967296"), Coerced::Overflow);
        assert_eq!(parse_integer::<u32>("99999999999999999999999"), Coerced::Overflow);
    }

    #[test]
    fn test_oversized_numbers_fail_the_load() {
        let err = load("[window]\nwidth = 5000000000\n[database]\nport = 4294967296\n[cache]\nttl = 99999999999999999999999\n")
            .unwrap_err();
        let findings = match err {
            ConfigError::Validation(findings) => findings,
            other => panic!("expected validation error, got {other:?}"),
        };

        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages.len(), 3, "{messages:?}");
        assert!(messages.iter().any(|m| m.starts_with("window.width: 5000000000")));
        assert!(messages.iter().any(|m| m.starts_with("database.port: 4294967296")));
        assert!(messages.iter().any(|m| m.starts_with("cache.ttl: ")));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("http://a.test:1, http://b.test:2 "),
            vec!["http://a.test:1".to_string(), "http://b.test:2".to_string()]
        );
        assert!(split_list("").is_empty());
        assert!(split_list("   ").is_empty());
        assert_eq!(split_list("one"), vec!["one".to_string()]);
    }

    #[test]
    fn test_empty_source_gives_defaults() {
        let config = load("").unwrap();
        let mut expected = Config::default();
        expected.api.user_agent = "Desktop Shell/1.0.0".to_string();
        assert_eq!(config, expected);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = load("[window]\nwidth = wide\nresizable = maybe\n[api]\ntimeout = soon\n").unwrap();
        assert_eq!(config.window.width, 1200);
        assert!(config.window.resizable);
        assert_eq!(config.api.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_booleans_case_insensitive() {
        let config = load("[app]\ndebug = FALSE\nmock_api = True\n").unwrap();
        assert!(!config.app.debug);
        assert!(config.app.mock_api);
    }

    #[test]
    fn test_unknown_enumeration_is_an_error() {
        let err = load("[cache]\neviction_policy = random\n").unwrap_err();
        match err {
            ConfigError::Validation(findings) => {
                assert_eq!(findings.len(), 1);
                assert!(findings[0].message.starts_with("cache.eviction_policy: 'random'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_enumerations_are_case_sensitive() {
        assert!(load("[log]\nlevel = INFO\n").is_err());
        assert_eq!(load("[log]\nlevel = info\n").unwrap().log.level.as_str(), "info");
    }

    #[test]
    fn test_explicit_user_agent_kept() {
        let config = load("[api]\nuser_agent = Custom/2\n").unwrap();
        assert_eq!(config.api.user_agent, "Custom/2");
    }

    #[test]
    fn test_validation_error_display_lists_all() {
        let err = load("[window]\nwidth = 10\nheight = 10\n").unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Validation failed: "));
        assert!(text.contains("window.width"));
        assert!(text.contains("window.height"));
    }
}

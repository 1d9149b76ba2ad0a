//! Security default injection.
//!
//! Not part of the regular load path. Callers opt in through
//! `ConfigStore::apply_security_defaults` or by calling
//! [`apply_security_defaults`] on a configuration they own.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::config::schema::{
    Config, Environment, SslMode, DEFAULT_RATE_LIMIT_BURST, DEFAULT_RATE_LIMIT_RPS,
};

/// Shortest secret [`generate_secure_secret`] will produce.
pub const MIN_SECRET_LENGTH: usize = 16;

/// Length of generated CSRF secrets.
pub const CSRF_SECRET_LENGTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret length must be at least {MIN_SECRET_LENGTH} characters, got {0}")]
    TooShort(usize),

    #[error("failed to generate secure random bytes: {0}")]
    Rng(#[from] rand::Error),
}

/// Generate a URL-safe secret of exactly `length` characters from
/// `length` bytes of OS randomness.
pub fn generate_secure_secret(length: usize) -> Result<String, SecretError> {
    if length < MIN_SECRET_LENGTH {
        return Err(SecretError::TooShort(length));
    }

    let mut bytes = vec![0u8; length];
    OsRng.try_fill_bytes(&mut bytes)?;

    let mut secret = URL_SAFE_NO_PAD.encode(bytes);
    secret.truncate(length);
    Ok(secret)
}

/// Fill in missing secrets and, in production, force hardened settings.
pub fn apply_security_defaults(config: &mut Config) -> Result<(), SecretError> {
    if config.security.csrf_enabled && config.security.csrf_secret.is_empty() {
        config.security.csrf_secret = generate_secure_secret(CSRF_SECRET_LENGTH)?;
        tracing::info!("Generated secure CSRF secret");
    }

    if config.app.environment != Environment::Production {
        return Ok(());
    }

    config.app.debug = false;
    config.app.dev_tools = false;
    config.app.hot_reload = false;

    if !config.security.rate_limit_enabled {
        config.security.rate_limit_enabled = true;
        config.security.rate_limit_rps = DEFAULT_RATE_LIMIT_RPS;
        config.security.rate_limit_burst = DEFAULT_RATE_LIMIT_BURST;
        tracing::info!(
            rps = DEFAULT_RATE_LIMIT_RPS,
            burst = DEFAULT_RATE_LIMIT_BURST,
            "Enabled rate limiting for production"
        );
    }

    if config.database.ssl_mode == SslMode::Disable {
        config.database.ssl_mode = SslMode::Require;
        tracing::info!("Upgraded database ssl_mode to require for production");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_length_and_alphabet() {
        let secret = generate_secure_secret(64).unwrap();
        assert_eq!(secret.len(), 64);
        assert!(secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_secret_too_short() {
        assert!(matches!(generate_secure_secret(8), Err(SecretError::TooShort(8))));
        assert!(generate_secure_secret(16).is_ok());
    }

    #[test]
    fn test_secrets_differ() {
        let a = generate_secure_secret(32).unwrap();
        let b = generate_secure_secret(32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_existing_secret_kept() {
        let mut config = Config::default();
        config.security.csrf_enabled = true;
        config.security.csrf_secret = "already-set".to_string();
        apply_security_defaults(&mut config).unwrap();
        assert_eq!(config.security.csrf_secret, "already-set");
    }

    #[test]
    fn test_development_flags_untouched() {
        let mut config = Config::default();
        apply_security_defaults(&mut config).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_production_hardening() {
        let mut config = Config::default();
        config.app.environment = Environment::Production;
        config.security.rate_limit_rps = 7;

        apply_security_defaults(&mut config).unwrap();

        assert!(!config.app.debug);
        assert!(!config.app.dev_tools);
        assert!(!config.app.hot_reload);
        assert!(config.security.rate_limit_enabled);
        assert_eq!(config.security.rate_limit_rps, DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.security.rate_limit_burst, DEFAULT_RATE_LIMIT_BURST);
        assert_eq!(config.database.ssl_mode, SslMode::Require);
    }

    #[test]
    fn test_production_keeps_stronger_settings() {
        let mut config = Config::default();
        config.app.environment = Environment::Production;
        config.security.rate_limit_enabled = true;
        config.security.rate_limit_rps = 500;
        config.database.ssl_mode = SslMode::VerifyFull;

        apply_security_defaults(&mut config).unwrap();

        assert_eq!(config.security.rate_limit_rps, 500);
        assert_eq!(config.database.ssl_mode, SslMode::VerifyFull);
    }
}

//! Owned, atomically swappable configuration snapshot.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;

use crate::config::loader::{ConfigError, ConfigLoader};
use crate::config::public::{sanitized, AppInfo, PublicConfig};
use crate::config::schema::{Config, Environment};
use crate::security::apply_security_defaults;

/// Holds the published configuration.
///
/// Readers get an `Arc<Config>` that stays valid even if a reload swaps
/// in a new snapshot meanwhile. Writers (load, reload, hardening) are
/// serialised so the pipeline never runs twice concurrently.
pub struct ConfigStore {
    loader: ConfigLoader,
    current: ArcSwapOption<Config>,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(loader: ConfigLoader) -> Self {
        Self {
            loader,
            current: ArcSwapOption::empty(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    /// Load once. Later calls return the published snapshot untouched.
    pub fn load(&self) -> Result<Arc<Config>, ConfigError> {
        if let Some(config) = self.current.load_full() {
            return Ok(config);
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(config) = self.current.load_full() {
            return Ok(config);
        }
        self.run_pipeline()
    }

    /// Rerun the full pipeline. On failure the previous snapshot stays.
    pub fn reload(&self) -> Result<Arc<Config>, ConfigError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.current.load_full().map(|c| c.app.environment);
        let config = self.run_pipeline()?;

        if let Some(previous) = previous.filter(|p| *p != config.app.environment) {
            tracing::info!(from = %previous, to = %config.app.environment, "Environment changed on reload");
        }
        tracing::info!("Configuration reloaded");
        Ok(config)
    }

    fn run_pipeline(&self) -> Result<Arc<Config>, ConfigError> {
        let config = Arc::new(self.loader.load()?);
        self.current.store(Some(Arc::clone(&config)));
        Ok(config)
    }

    /// The published snapshot. Reading before a successful load is a
    /// startup ordering bug and is reported as `ConfigError::NotLoaded`.
    pub fn current(&self) -> Result<Arc<Config>, ConfigError> {
        self.current.load_full().ok_or(ConfigError::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Generate missing secrets and harden production settings on the live
    /// snapshot.
    pub fn apply_security_defaults(&self) -> Result<Arc<Config>, ConfigError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut config = Config::clone(&*self.current()?);
        apply_security_defaults(&mut config)?;

        let config = Arc::new(config);
        self.current.store(Some(Arc::clone(&config)));
        Ok(config)
    }

    pub fn public(&self) -> Result<PublicConfig, ConfigError> {
        Ok(PublicConfig::from(self.current()?.as_ref()))
    }

    pub fn sanitized(&self) -> Result<Config, ConfigError> {
        Ok(sanitized(&*self.current()?))
    }

    pub fn api_base_url(&self) -> Result<String, ConfigError> {
        Ok(self.current()?.api.base_url.clone())
    }

    pub fn environment(&self) -> Result<Environment, ConfigError> {
        Ok(self.current()?.app.environment)
    }

    pub fn is_debug(&self) -> Result<bool, ConfigError> {
        Ok(self.current()?.app.debug)
    }

    pub fn app_info(&self) -> Result<AppInfo, ConfigError> {
        Ok(AppInfo::from(self.current()?.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_with(content: &str) -> (TempDir, ConfigStore) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app.ini");
        fs::write(&path, content).unwrap();
        let loader = ConfigLoader::new(path).with_env_var("SHELL_CONFIG_STORE_UNIT_TEST_ENV");
        (tmp, ConfigStore::new(loader))
    }

    #[test]
    fn test_current_before_load() {
        let (_tmp, store) = store_with("");
        assert!(matches!(store.current(), Err(ConfigError::NotLoaded)));
        assert!(matches!(store.public(), Err(ConfigError::NotLoaded)));
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_load_is_cached() {
        let (tmp, store) = store_with("[app]\nname = First\n");
        let first = store.load().unwrap();

        fs::write(tmp.path().join("app.ini"), "[app]\nname = Second\n").unwrap();
        let second = store.load().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.app.name, "First");
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let (tmp, store) = store_with("[app]\nname = First\n");
        let first = store.load().unwrap();

        fs::write(tmp.path().join("app.ini"), "[app]\nname = Second\n").unwrap();
        let second = store.reload().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(store.current().unwrap().app.name, "Second");
        assert_eq!(first.app.name, "First");
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let (tmp, store) = store_with("[app]\nname = First\n");
        store.load().unwrap();

        fs::write(tmp.path().join("app.ini"), "[window]\nwidth = 1\n").unwrap();
        assert!(matches!(store.reload(), Err(ConfigError::Validation(_))));
        assert_eq!(store.current().unwrap().app.name, "First");
    }

    #[test]
    fn test_read_surface() {
        let (_tmp, store) = store_with("[app]\nname = Reader\nversion = 2.3.4\n[api]\nbase_url = http://localhost:9000\n");
        store.load().unwrap();

        assert_eq!(store.api_base_url().unwrap(), "http://localhost:9000");
        assert_eq!(store.environment().unwrap(), Environment::Development);
        assert!(store.is_debug().unwrap());

        let info = store.app_info().unwrap();
        assert_eq!(info.name, "Reader");
        assert_eq!(info.version, "2.3.4");
    }

    #[test]
    fn test_apply_security_defaults_swaps_snapshot() {
        let (_tmp, store) = store_with("[security]\ncsrf_enabled = true\n");
        let before = store.load().unwrap();
        assert!(before.security.csrf_secret.is_empty());

        let after = store.apply_security_defaults().unwrap();
        assert!(after.security.csrf_secret.len() >= 32);
        assert!(Arc::ptr_eq(&after, &store.current().unwrap()));
    }

    #[test]
    fn test_sanitized_copy_leaves_snapshot_intact() {
        let (_tmp, store) = store_with("[database]\npassword = hunter2\n");
        assert!(matches!(store.sanitized(), Err(ConfigError::NotLoaded)));
        store.load().unwrap();

        assert_eq!(store.sanitized().unwrap().database.password, "***MASKED***");
        assert_eq!(store.current().unwrap().database.password, "hunter2");
    }

    #[test]
    fn test_writers_survive_poisoned_lock() {
        let (_tmp, store) = store_with("[app]\nname = First\n");
        let store = Arc::new(store);

        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write_lock.lock().unwrap();
            panic!("writer panicked while holding the lock");
        })
        .join();
        assert!(store.write_lock.is_poisoned());

        assert_eq!(store.load().unwrap().app.name, "First");
        assert_eq!(store.reload().unwrap().app.name, "First");
        assert!(store.apply_security_defaults().is_ok());
    }
}

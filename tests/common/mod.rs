//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use shell_config::config::{ConfigLoader, ConfigStore};
use tempfile::TempDir;

/// A configuration file in its own temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl Fixture {
    pub fn new(content: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.ini");
        fs::write(&path, content).unwrap();
        Self { dir, path }
    }

    /// Replace the file contents.
    pub fn rewrite(&self, content: &str) {
        fs::write(&self.path, content).unwrap();
    }

    /// Loader that reads the environment from `env_var`. Each test passes
    /// its own variable name so tests can run in parallel.
    pub fn loader(&self, env_var: &str) -> ConfigLoader {
        ConfigLoader::new(&self.path).with_env_var(env_var)
    }

    pub fn store(&self, env_var: &str) -> ConfigStore {
        ConfigStore::new(self.loader(env_var))
    }
}

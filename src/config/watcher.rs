//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::schema::Config as AppConfig;
use crate::config::store::ConfigStore;

/// Reloads a [`ConfigStore`] whenever its source file changes.
pub struct ConfigWatcher {
    store: Arc<ConfigStore>,
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Arc<AppConfig>>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver that sees every snapshot a
    /// successful reload publishes.
    pub fn new(store: Arc<ConfigStore>) -> (Self, mpsc::UnboundedReceiver<Arc<AppConfig>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let path = store.loader().path().to_path_buf();

        (
            Self {
                store,
                path,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread. Dropping the
    /// returned watcher stops it.
    ///
    /// The parent directory is watched rather than the file itself, so
    /// editors that save by writing a new file and renaming it over the
    /// old one are still picked up.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let store = Arc::clone(&self.store);
        let file_name = self.path.file_name().map(|name| name.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|path| path.file_name() == file_name.as_deref());
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        tracing::info!("Config file change detected, reloading...");
                        match store.reload() {
                            Ok(config) => {
                                let _ = tx.send(config);
                            }
                            Err(e) => {
                                tracing::error!(
                                    "Failed to reload config: {}. Keeping current configuration.",
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(watch_dir(&self.path), RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Directory holding the config file. A bare file name lives in `.`.
fn watch_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

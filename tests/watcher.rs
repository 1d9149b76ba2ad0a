//! Hot reload through the file watcher.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use shell_config::config::watcher::ConfigWatcher;
use shell_config::config::Config;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

mod common;
use common::Fixture;

/// Wait until a snapshot with the given app name is published.
async fn published(updates: &mut UnboundedReceiver<Arc<Config>>, name: &str) -> Arc<Config> {
    let wait = async {
        loop {
            let config = updates.recv().await.expect("watcher channel closed");
            if config.app.name == name {
                return config;
            }
        }
    };
    timeout(Duration::from_secs(10), wait)
        .await
        .unwrap_or_else(|_| panic!("no snapshot named {name} was published"))
}

#[tokio::test]
async fn test_change_is_published_and_invalid_edit_is_ignored() {
    let fixture = Fixture::new("[app]\nname = Initial\n");
    let store = Arc::new(fixture.store("SHELL_CONFIG_IT_WATCH_RELOAD"));
    store.load().unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(Arc::clone(&store));
    let _watcher = watcher.run().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    fixture.rewrite("[app]\nname = Changed\n");
    let config = published(&mut updates, "Changed").await;
    assert!(Arc::ptr_eq(&config, &store.current().unwrap()));

    fixture.rewrite("[window]\nwidth = 1\n");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.current().unwrap().app.name, "Changed");
    assert_eq!(store.current().unwrap().window.width, 1200);
}

#[tokio::test]
async fn test_replace_by_rename_is_picked_up() {
    let fixture = Fixture::new("[app]\nname = Initial\n");
    let store = Arc::new(fixture.store("SHELL_CONFIG_IT_WATCH_RENAME"));
    store.load().unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(Arc::clone(&store));
    let _watcher = watcher.run().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    for name in ["First", "Second"] {
        let staged = fixture.dir.path().join("app.ini.tmp");
        fs::write(&staged, format!("[app]\nname = {name}\n")).unwrap();
        fs::rename(&staged, &fixture.path).unwrap();

        published(&mut updates, name).await;
        assert_eq!(store.current().unwrap().app.name, name);
    }
}

#[tokio::test]
async fn test_sibling_files_do_not_trigger_reload() {
    let fixture = Fixture::new("[app]\nname = Initial\n");
    let store = Arc::new(fixture.store("SHELL_CONFIG_IT_WATCH_SIBLING"));
    store.load().unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(Arc::clone(&store));
    let _watcher = watcher.run().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    fs::write(fixture.dir.path().join("notes.txt"), "unrelated").unwrap();
    assert!(timeout(Duration::from_secs(1), updates.recv()).await.is_err());
}

//! Integration tests for watch mode.
//!
//! Covers the reload coordinator driven through the debouncer and the
//! start/stop lifecycle of the watch loop.

use drouet::config::{
    DeprecationChecker, FlagSet, FrozenConfig, ResolveInputs, SettingRegistry,
};
use drouet::logging::DistinctLogger;
use drouet::site::SiteBuilder;
use drouet::version::SiteVersion;
use drouet::watch::{
    ReloadCoordinator, ReloadDebouncer, WatchPaths, start_site_watcher, watch_until,
};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Reports every build's title on a channel.
struct RecordingBuilder {
    titles: mpsc::UnboundedSender<String>,
}

impl SiteBuilder for RecordingBuilder {
    fn build(&self, config: &FrozenConfig) -> anyhow::Result<()> {
        let _ = self.titles.send(config.get_str("title")?.to_string());
        Ok(())
    }
}

fn coordinator(
    temp: &TempDir,
) -> (Arc<ReloadCoordinator>, mpsc::UnboundedReceiver<String>) {
    let cache = temp.path().join("cache").display().to_string();
    let inputs = ResolveInputs::new(temp.path())
        .with_env(Arc::new(HashMap::<String, String>::new()))
        .with_flag_sets(vec![FlagSet::new("drouet").with_flag("cacheDir", cache, true)]);
    let (tx, rx) = mpsc::unbounded_channel();
    let coordinator = ReloadCoordinator::new(
        SettingRegistry::standard(),
        inputs,
        Arc::new(RecordingBuilder { titles: tx }),
        DeprecationChecker::new(Arc::new(DistinctLogger::warn()), SiteVersion::CURRENT),
    );
    (Arc::new(coordinator), rx)
}

#[tokio::test(start_paused = true)]
async fn test_debounced_burst_reloads_once_with_latest_edit() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("config.toml"), "title = \"v1\"\n").unwrap();
    let (coordinator, mut titles) = coordinator(&temp);
    coordinator.resolve().unwrap();

    let reloader = Arc::clone(&coordinator);
    let debouncer = ReloadDebouncer::spawn(Duration::from_secs(4), move || {
        reloader.reload();
    });

    for version in ["v2", "v3", "v4"] {
        fs::write(
            temp.path().join("config.toml"),
            format!("title = \"{version}\"\n"),
        )
        .unwrap();
        debouncer.notify();
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    assert_eq!(titles.recv().await.as_deref(), Some("v4"));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(titles.try_recv().is_err());
    assert_eq!(
        coordinator.handle().get("title").unwrap(),
        Some("v4".into())
    );
    debouncer.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_broken_edit_during_watch_keeps_serving_previous_config() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("config.toml"), "title = \"good\"\n").unwrap();
    let (coordinator, mut titles) = coordinator(&temp);
    coordinator.resolve().unwrap();

    let reloader = Arc::clone(&coordinator);
    let (done_tx, mut done) = mpsc::unbounded_channel();
    let debouncer = ReloadDebouncer::spawn(Duration::from_secs(4), move || {
        let _ = done_tx.send(reloader.reload());
    });

    fs::write(temp.path().join("config.toml"), "title = = broken\n").unwrap();
    debouncer.notify();
    assert_eq!(done.recv().await, Some(false));
    assert!(titles.try_recv().is_err());
    assert_eq!(
        coordinator.handle().get("title").unwrap(),
        Some("good".into())
    );

    fs::write(temp.path().join("config.toml"), "title = \"fixed\"\n").unwrap();
    debouncer.notify();
    assert_eq!(done.recv().await, Some(true));
    assert_eq!(titles.recv().await.as_deref(), Some("fixed"));
    debouncer.shutdown().await;
}

#[tokio::test]
async fn test_watch_until_stops_on_shutdown() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("config.toml"), "title = \"t\"\n").unwrap();
    fs::create_dir(temp.path().join("content")).unwrap();
    let (coordinator, _titles) = coordinator(&temp);
    coordinator.resolve().unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        watch_until(coordinator, Duration::from_millis(50), async {}),
    )
    .await
    .expect("watch loop did not stop");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_watch_until_requires_resolved_config() {
    let temp = TempDir::new().unwrap();
    let (coordinator, _titles) = coordinator(&temp);
    let err = watch_until(coordinator, Duration::from_millis(50), async {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not been resolved"));
}

/// Save `content` the way editors that write a temp file and rename it do.
fn replace_by_rename(path: &std::path::Path, content: &str) {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).unwrap();
    fs::rename(&tmp, path).unwrap();
}

#[tokio::test]
async fn test_config_replaced_by_rename_keeps_triggering() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    fs::write(&config, "title = \"one\"\n").unwrap();
    let paths = WatchPaths {
        dirs: Vec::new(),
        files: vec![config.clone()],
    };

    let (fired_tx, mut fired) = mpsc::unbounded_channel();
    let debouncer = ReloadDebouncer::spawn(Duration::from_millis(200), move || {
        let _ = fired_tx.send(());
    });
    let watcher = start_site_watcher(&paths, debouncer.notifier()).unwrap();

    for content in ["title = \"two\"\n", "title = \"three\"\n"] {
        tokio::time::sleep(Duration::from_millis(300)).await;
        replace_by_rename(&config, content);
        tokio::time::timeout(Duration::from_secs(10), fired.recv())
            .await
            .expect("no reload after config was replaced")
            .unwrap();
        // Let the rest of this burst settle before the next save.
        tokio::time::sleep(Duration::from_millis(500)).await;
        while fired.try_recv().is_ok() {}
    }

    drop(watcher);
    debouncer.shutdown().await;
}

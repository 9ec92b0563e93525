//! Watch mode: rebuild when the site or its config changes.

mod debounce;
mod reload;
mod watcher;

pub use debounce::{DEFAULT_DEBOUNCE, DebounceNotifier, ReloadDebouncer};
pub use reload::ReloadCoordinator;
pub use watcher::{SiteWatcher, WATCHED_DIR_KEYS, WatchPaths, start_site_watcher};

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Watch the resolved site until `shutdown` completes, reloading after
/// each burst of changes settles for `delay`.
///
/// The watched paths come from the configuration in effect when watching
/// starts.
pub async fn watch_until(
    coordinator: Arc<ReloadCoordinator>,
    delay: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let config = coordinator.handle().load()?;
    let paths = WatchPaths::for_site(&config)?;

    let reloader = Arc::clone(&coordinator);
    let debouncer = ReloadDebouncer::spawn(delay, move || {
        reloader.reload();
    });
    let watcher =
        start_site_watcher(&paths, debouncer.notifier()).context("Failed to start site watcher")?;
    info!(
        "Watching {} director(ies) and {} config file(s) for changes",
        paths.dirs.len(),
        paths.files.len()
    );

    shutdown.await;

    info!("Stopping watch mode");
    drop(watcher);
    debouncer.shutdown().await;
    Ok(())
}

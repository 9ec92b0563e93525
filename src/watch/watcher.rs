//! Filesystem watcher for a site.
//!
//! Watches the site's source directories recursively and the directory of
//! each loaded config file, and forwards every relevant change to a [`DebounceNotifier`]. The
//! short debounce of the underlying watcher only merges duplicate OS events;
//! burst coalescing is the [`ReloadDebouncer`](super::ReloadDebouncer)'s job.

use super::debounce::DebounceNotifier;
use crate::config::FrozenConfig;
use crate::error::ConfigResult;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebouncedEvent, DebouncedEventKind, Debouncer, new_debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Settings naming directories whose contents affect the build.
pub const WATCHED_DIR_KEYS: &[&str] = &[
    "contentDir",
    "layoutDir",
    "staticDir",
    "dataDir",
    "i18nDir",
    "archetypeDir",
    "themesDir",
];

const OS_EVENT_DEBOUNCE: Duration = Duration::from_millis(100);

/// What to watch for one site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchPaths {
    /// Watched recursively.
    pub dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

impl WatchPaths {
    /// Existing source directories under the working directory plus the
    /// config files that produced `config`.
    pub fn for_site(config: &FrozenConfig) -> ConfigResult<Self> {
        let working_dir = config.working_dir()?;
        let mut dirs = Vec::new();
        for key in WATCHED_DIR_KEYS {
            let Ok(dir) = config.get_str(key) else {
                continue;
            };
            let path = working_dir.join(dir);
            if path.is_dir() && !dirs.contains(&path) {
                dirs.push(path);
            }
        }
        let files = config
            .config_files()
            .iter()
            .map(Path::to_path_buf)
            .collect();
        Ok(Self { dirs, files })
    }

    /// Directories holding the config files, each listed once.
    ///
    /// Config files are watched through their directory so a save that
    /// replaces the file by rename is still seen.
    pub fn config_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for dir in self.files.iter().filter_map(|f| f.parent()) {
            if !dirs.iter().any(|d| d == dir) {
                dirs.push(dir.to_path_buf());
            }
        }
        dirs
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    /// Whether a change at `path` should trigger a reload.
    pub fn is_relevant(&self, path: &Path) -> bool {
        if is_editor_artifact(path) {
            return false;
        }
        self.files.iter().any(|f| f == path) || self.dirs.iter().any(|d| path.starts_with(d))
    }
}

/// Swap files, backups and other transient files editors write next to the real one.
fn is_editor_artifact(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let extension = path.extension().and_then(|e| e.to_str());
    name.ends_with('~')
        || name.starts_with(".#")
        || name == "4913"
        || matches!(extension, Some("swp" | "swx" | "tmp"))
}

/// Keeps the OS watcher alive; dropping it stops watching.
pub struct SiteWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    _task_handle: tokio::task::JoinHandle<()>,
}

/// Start watching `paths`, forwarding relevant changes to `notifier`.
pub fn start_site_watcher(
    paths: &WatchPaths,
    notifier: DebounceNotifier,
) -> Result<SiteWatcher, notify::Error> {
    let (notify_tx, notify_rx) = mpsc::channel();
    let mut debouncer = new_debouncer(OS_EVENT_DEBOUNCE, notify_tx)?;

    let watcher = debouncer.watcher();
    for dir in &paths.dirs {
        info!("Watching directory: {}", dir.display());
        watcher.watch(dir, RecursiveMode::Recursive)?;
    }
    for file in &paths.files {
        info!("Watching config file: {}", file.display());
    }
    for dir in paths.config_dirs() {
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    }

    let paths = paths.clone();
    let task_handle = tokio::task::spawn_blocking(move || {
        forward_events(notify_rx, notifier, &paths);
    });

    Ok(SiteWatcher {
        _debouncer: debouncer,
        _task_handle: task_handle,
    })
}

/// Runs until the watcher is dropped or the debouncer stops.
fn forward_events(
    rx: mpsc::Receiver<Result<Vec<DebouncedEvent>, notify::Error>>,
    notifier: DebounceNotifier,
    paths: &WatchPaths,
) {
    while let Ok(result) = rx.recv() {
        match result {
            Ok(events) => {
                let changed = relevant_changes(events, paths);
                if changed.is_empty() {
                    continue;
                }
                debug!("Site change detected: {:?}", changed);
                if !notifier.notify() {
                    info!("Reload debouncer stopped, site watcher exiting");
                    return;
                }
            }
            Err(e) => error!("File watcher error: {}", e),
        }
    }
    debug!("Site watcher channel closed");
}

fn relevant_changes(events: Vec<DebouncedEvent>, paths: &WatchPaths) -> Vec<PathBuf> {
    events
        .into_iter()
        .filter(|event| {
            matches!(
                event.kind,
                DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
            )
        })
        .map(|event| event.path)
        .filter(|path| paths.is_relevant(path))
        .collect()
}

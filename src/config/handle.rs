//! Shared access to the current resolved config.

use super::origin::Origin;
use super::store::FrozenConfig;
use super::value::Value;
use crate::error::{ConfigError, ConfigResult};
use arc_swap::ArcSwapOption;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Cloneable handle to the latest [`FrozenConfig`].
///
/// Readers get a whole snapshot; a reload swaps in a new one atomically and
/// snapshots already handed out stay valid. Every read fails with
/// [`ConfigError::NotResolved`] until the first snapshot is stored.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    current: Arc<ArcSwapOption<FrozenConfig>>,
}

impl ConfigHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, config: FrozenConfig) {
        self.current.store(Some(Arc::new(config)));
    }

    pub fn is_resolved(&self) -> bool {
        self.current.load().is_some()
    }

    /// The current snapshot.
    pub fn load(&self) -> ConfigResult<Arc<FrozenConfig>> {
        self.current.load_full().ok_or(ConfigError::NotResolved)
    }

    pub fn get(&self, key: &str) -> ConfigResult<Option<Value>> {
        Ok(self.load()?.get(key).cloned())
    }

    pub fn get_origin(&self, key: &str) -> ConfigResult<Option<Origin>> {
        Ok(self.load()?.get_origin(key))
    }

    pub fn all_settings(&self) -> ConfigResult<BTreeMap<String, Value>> {
        Ok(self.load()?.all_settings())
    }

    pub fn all_origins(&self) -> ConfigResult<BTreeMap<String, Origin>> {
        Ok(self.load()?.all_origins())
    }
}

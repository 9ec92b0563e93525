//! Initial resolution and reload of a site's configuration.

use crate::config::{
    ConfigHandle, ConfigStore, DeprecationChecker, FlagBinder, FrozenConfig, ResolveInputs,
    SettingRegistry,
};
use crate::error::ConfigResult;
use crate::site::SiteBuilder;
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Owns everything needed to re-run resolution and the build.
pub struct ReloadCoordinator {
    registry: SettingRegistry,
    inputs: ResolveInputs,
    handle: ConfigHandle,
    builder: Arc<dyn SiteBuilder>,
    deprecations: DeprecationChecker,
}

impl ReloadCoordinator {
    pub fn new(
        registry: SettingRegistry,
        inputs: ResolveInputs,
        builder: Arc<dyn SiteBuilder>,
        deprecations: DeprecationChecker,
    ) -> Self {
        Self {
            registry,
            inputs,
            handle: ConfigHandle::new(),
            builder,
            deprecations,
        }
    }

    pub fn handle(&self) -> ConfigHandle {
        self.handle.clone()
    }

    pub fn inputs(&self) -> &ResolveInputs {
        &self.inputs
    }

    fn resolve_fresh(&self) -> ConfigResult<FrozenConfig> {
        let config = ConfigStore::new(self.registry.clone()).resolve(&self.inputs)?;
        let changed = FlagBinder::changed_names(&self.inputs.flag_sets);
        self.deprecations.check(&config, &changed);
        Ok(config)
    }

    /// First resolution of the run. Errors are returned to the caller, which
    /// must not start a build.
    pub fn resolve(&self) -> ConfigResult<Arc<FrozenConfig>> {
        let config = self.resolve_fresh()?;
        self.handle.store(config);
        self.handle.load()
    }

    /// Build from the current snapshot.
    pub fn build(&self) -> Result<()> {
        let config = self.handle.load()?;
        self.builder.build(&config)
    }

    /// Re-resolve and rebuild after a change.
    ///
    /// A failed resolution is logged and the previous snapshot stays in
    /// effect. Returns whether a new snapshot was installed.
    pub fn reload(&self) -> bool {
        info!("Reloading configuration...");
        let config = match self.resolve_fresh() {
            Ok(config) => config,
            Err(e) => {
                warn!("Config reload failed: {}. Keeping current config.", e);
                return false;
            }
        };
        self.handle.store(config);

        if let Err(e) = self.build() {
            error!("Rebuild failed: {:#}", e);
        }
        true
    }
}

//! Environment variable fallback.
//!
//! A key `baseURL` is looked up as `HUGO_BASEURL`. Environment values only
//! fill keys that nothing but the registry supplied; they never shadow a
//! config file, flag or override. Any other `HUGO_*` variable supplies the
//! key named by its suffix when no source set that key.

use super::origin::Origin;
use super::store::ConfigStore;
use super::value::Value;
use crate::error::{ConfigError, ConfigResult};
use std::collections::HashMap;
use tracing::debug;

/// Prefix for environment variables that map onto settings.
pub const ENV_PREFIX: &str = "HUGO";

/// Read-only view of an environment.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;

    /// Every variable, in no particular order.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn vars(&self) -> Vec<(String, String)> {
        // Non-UTF-8 variables cannot name a setting.
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Binds `<PREFIX>_<KEY>` variables into a store.
#[derive(Debug, Clone)]
pub struct EnvBinder {
    prefix: String,
    extra_keys: Vec<String>,
}

impl Default for EnvBinder {
    fn default() -> Self {
        Self::new(ENV_PREFIX)
    }
}

impl EnvBinder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extra_keys: Vec::new(),
        }
    }

    /// Also consult the environment for `key`, even when no other source knows it.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.extra_keys.push(key.into());
        self
    }

    /// Environment variable name for `key`.
    pub fn var_name(&self, key: &str) -> String {
        format!("{}_{}", self.prefix.to_uppercase(), key.to_uppercase())
    }

    /// Setting key named by `var`, if it carries this binder's prefix.
    pub fn key_for_var(&self, var: &str) -> Option<String> {
        let n = self.prefix.len();
        let prefix = var.get(..n)?;
        let key = var.get(n..)?.strip_prefix('_')?;
        if key.is_empty() || !prefix.eq_ignore_ascii_case(&self.prefix) {
            return None;
        }
        Some(key.to_lowercase())
    }

    /// Fill every known key that has no value yet, or only a default, from
    /// the environment, then add any prefixed variable whose key is still
    /// unset. Values are parsed to the type of the value they replace.
    /// Returns how many keys were taken from the environment.
    pub fn bind(&self, store: &mut ConfigStore, env: &dyn EnvSource) -> ConfigResult<usize> {
        let mut bound = self.bind_known(store, env)?;

        let mut unknown: Vec<(String, String)> = env
            .vars()
            .into_iter()
            .filter_map(|(var, raw)| {
                let key = store.registry().canonical_key(&self.key_for_var(&var)?);
                store.origin(&key).is_none().then_some((var, raw))
            })
            .collect();
        // Deterministic when two spellings name the same key.
        unknown.sort();
        for (var, raw) in unknown {
            let Some(key) = self.key_for_var(&var) else {
                continue;
            };
            if store.origin(&key).is_some() {
                continue;
            }
            debug!(key = %key, var = %var, "Setting taken from environment");
            store.set(&key, Value::String(raw), Origin::Env);
            bound += 1;
        }
        Ok(bound)
    }

    fn bind_known(&self, store: &mut ConfigStore, env: &dyn EnvSource) -> ConfigResult<usize> {
        let mut keys: Vec<String> = store.keys().map(str::to_string).collect();
        keys.extend(
            self.extra_keys
                .iter()
                .map(|k| store.registry().canonical_key(k)),
        );
        keys.sort();
        keys.dedup();

        let mut bound = 0;
        for key in keys {
            if store.origin(&key).is_some_and(|o| !Origin::Env.may_replace(o)) {
                continue;
            }
            let var = self.var_name(&key);
            let Some(raw) = env.var(&var) else {
                continue;
            };
            let value = Value::coerce_str(&raw, store.value(&key)).map_err(|expected| {
                ConfigError::InvalidEnv {
                    var: var.clone(),
                    value: raw.clone(),
                    expected,
                }
            })?;
            debug!(key = %key, var = %var, "Setting taken from environment");
            store.set(&key, value, Origin::Env);
            bound += 1;
        }
        Ok(bound)
    }
}

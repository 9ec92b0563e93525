//! The aggregation point for every settings source.
//!
//! [`ConfigStore`] is a mutable builder. [`ConfigStore::resolve`] consumes it
//! and hands back a [`FrozenConfig`], which has no mutating methods at all;
//! a reload builds a new store from scratch.

use super::env::{ENV_PREFIX, EnvBinder, EnvSource, ProcessEnv};
use super::files::{ConfigFileSet, FileConfigLoader};
use super::flags::{FlagBinder, FlagSet};
use super::origin::Origin;
use super::registry::SettingRegistry;
use super::value::{Value, ValueMap};
use crate::error::{ConfigError, ConfigResult};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Directory under the system temp dir used when no `cacheDir` is configured.
pub const DEFAULT_CACHE_DIR_NAME: &str = "hugo_cache";

/// Command name whose `--watch` flag defaults to on.
pub const SERVER_COMMAND: &str = "server";

/// A setting's current value and the source that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    pub value: Value,
    pub origin: Origin,
}

/// Everything besides the registry that a resolution reads.
#[derive(Clone)]
pub struct ResolveInputs {
    pub base_dir: PathBuf,
    /// Comma-separated config file list; empty means search by convention.
    pub file_spec: String,
    /// Leaf command first.
    pub flag_sets: Vec<FlagSet>,
    pub env: Arc<dyn EnvSource>,
    pub env_prefix: String,
}

impl fmt::Debug for ResolveInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveInputs")
            .field("base_dir", &self.base_dir)
            .field("file_spec", &self.file_spec)
            .field("flag_sets", &self.flag_sets)
            .field("env_prefix", &self.env_prefix)
            .finish_non_exhaustive()
    }
}

impl ResolveInputs {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            file_spec: String::new(),
            flag_sets: Vec::new(),
            env: Arc::new(ProcessEnv),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Derive the base directory and file list from parsed flags.
    ///
    /// A changed `--source` becomes the base directory (made absolute),
    /// otherwise the current directory is used. A changed `--config`
    /// supplies the file list.
    pub fn from_flags(flag_sets: Vec<FlagSet>) -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
        let base_dir = match FlagBinder::changed_value(&flag_sets, "source").and_then(Value::as_str) {
            Some(source) if !source.is_empty() => cwd.join(source),
            _ => cwd,
        };
        let file_spec = FlagBinder::changed_value(&flag_sets, "config")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self::new(base_dir)
            .with_file_spec(file_spec)
            .with_flag_sets(flag_sets))
    }

    pub fn with_file_spec(mut self, spec: impl Into<String>) -> Self {
        self.file_spec = spec.into();
        self
    }

    pub fn with_flag_sets(mut self, sets: Vec<FlagSet>) -> Self {
        self.flag_sets = sets;
        self
    }

    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }
}

/// Mutable settings under construction.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    registry: SettingRegistry,
    settings: BTreeMap<String, Setting>,
}

impl ConfigStore {
    pub fn new(registry: SettingRegistry) -> Self {
        Self {
            registry,
            settings: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &SettingRegistry {
        &self.registry
    }

    /// Write `value` under the canonical name of `key`.
    ///
    /// The write is dropped if the key currently holds a value from a
    /// higher-precedence origin. Returns whether the write took effect.
    pub fn set(&mut self, key: &str, value: impl Into<Value>, origin: Origin) -> bool {
        let key = self.registry.canonical_key(key);
        if let Some(current) = self.settings.get(&key) {
            if !origin.may_replace(current.origin) {
                return false;
            }
        }
        self.settings.insert(
            key,
            Setting {
                value: value.into(),
                origin,
            },
        );
        true
    }

    pub fn set_override(&mut self, key: &str, value: impl Into<Value>) -> bool {
        self.set(key, value, Origin::Override)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.settings
            .get(&self.registry.canonical_key(key))
            .map(|s| &s.value)
    }

    pub fn origin(&self, key: &str) -> Option<Origin> {
        self.settings
            .get(&self.registry.canonical_key(key))
            .map(|s| s.origin)
    }

    /// Canonical names of every key written so far.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }

    pub fn apply_defaults(&mut self) {
        let defaults: Vec<(String, Value)> = self
            .registry
            .defaults()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        for (key, value) in defaults {
            self.set(&key, value, Origin::Default);
        }
    }

    fn apply_file_settings(&mut self, settings: ValueMap) {
        for (key, value) in settings {
            self.set(&key, value, Origin::Config);
        }
    }

    /// Fixed rules that win over every other source.
    fn apply_overrides(&mut self, flag_sets: &[FlagSet]) {
        if let Some(dest) = FlagBinder::changed_value(flag_sets, "destination") {
            self.set_override("publishDir", dest.clone());
        }
        if let Some(warn) = FlagBinder::changed_value(flag_sets, "i18n-warnings") {
            self.set_override("logI18nWarnings", warn.clone());
        }
        if self.value("renderToMemory").and_then(Value::as_bool) == Some(true) {
            self.set_override("publishDir", "/");
        }
        // The server's --watch defaults to on and unchanged flags are never bound.
        let server_watch = flag_sets
            .iter()
            .filter(|set| set.command() == SERVER_COMMAND)
            .find_map(|set| set.lookup("watch"))
            .and_then(|flag| flag.value.as_bool());
        if server_watch == Some(true) {
            self.set_override("watch", true);
        }
    }

    fn derive_keys(&mut self, base_dir: &Path) -> ConfigResult<()> {
        self.set_override("workingDir", base_dir.display().to_string());

        let configured = match self.value("cacheDir") {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(ConfigError::type_mismatch("cachedir", "string", other.kind()));
            }
        };
        let cache_dir = if configured.is_empty() {
            std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME)
        } else {
            base_dir.join(configured)
        };
        std::fs::create_dir_all(&cache_dir).map_err(|source| ConfigError::CacheDir {
            path: cache_dir.clone(),
            source,
        })?;

        let mut cache_dir = cache_dir.display().to_string();
        if !cache_dir.ends_with(MAIN_SEPARATOR) {
            cache_dir.push(MAIN_SEPARATOR);
        }
        debug!("Using cache dir {}", cache_dir);
        self.set_override("cacheDir", cache_dir);
        Ok(())
    }

    /// Run the full resolution pipeline and freeze the result.
    ///
    /// Order: defaults, config files, changed flags, override rules,
    /// environment fallback, derived keys. Any error aborts the whole
    /// resolution; no partially resolved config is returned.
    pub fn resolve(mut self, inputs: &ResolveInputs) -> ConfigResult<FrozenConfig> {
        self.apply_defaults();

        let loaded = FileConfigLoader::load(&inputs.base_dir, &inputs.file_spec)?;
        self.apply_file_settings(loaded.settings);

        FlagBinder::bind(&mut self, &inputs.flag_sets);
        self.apply_overrides(&inputs.flag_sets);

        EnvBinder::new(inputs.env_prefix.as_str()).bind(&mut self, inputs.env.as_ref())?;

        self.derive_keys(&inputs.base_dir)?;

        Ok(FrozenConfig {
            settings: self.settings,
            registry: self.registry,
            files: loaded.files,
        })
    }
}

/// Read-only result of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenConfig {
    settings: BTreeMap<String, Setting>,
    registry: SettingRegistry,
    files: ConfigFileSet,
}

impl FrozenConfig {
    /// Value of `key`, following aliases. A dotted key such as
    /// `taxonomies.tag` descends into nested maps when no top-level key of
    /// that exact name exists.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let canonical = self.registry.canonical_key(key);
        if let Some(setting) = self.settings.get(&canonical) {
            return Some(&setting.value);
        }
        let (head, rest) = canonical.split_once('.')?;
        let mut current = &self.settings.get(&self.registry.canonical_key(head))?.value;
        for part in rest.split('.') {
            current = current.as_map()?.get(part)?;
        }
        Some(current)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Origin of a top-level key.
    pub fn get_origin(&self, key: &str) -> Option<Origin> {
        self.settings
            .get(&self.registry.canonical_key(key))
            .map(|s| s.origin)
    }

    pub fn all_settings(&self) -> BTreeMap<String, Value> {
        self.settings
            .iter()
            .map(|(k, s)| (k.clone(), s.value.clone()))
            .collect()
    }

    pub fn all_origins(&self) -> BTreeMap<String, Origin> {
        self.settings
            .iter()
            .map(|(k, s)| (k.clone(), s.origin))
            .collect()
    }

    /// Files that contributed, in merge order.
    pub fn config_files(&self) -> &ConfigFileSet {
        &self.files
    }

    pub fn registry(&self) -> &SettingRegistry {
        &self.registry
    }

    fn require(&self, key: &str) -> ConfigResult<&Value> {
        self.get(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
        })
    }

    pub fn get_bool(&self, key: &str) -> ConfigResult<bool> {
        let value = self.require(key)?;
        value
            .as_bool()
            .ok_or_else(|| ConfigError::type_mismatch(key, "bool", value.kind()))
    }

    pub fn get_int(&self, key: &str) -> ConfigResult<i64> {
        let value = self.require(key)?;
        value
            .as_int()
            .ok_or_else(|| ConfigError::type_mismatch(key, "int", value.kind()))
    }

    pub fn get_str(&self, key: &str) -> ConfigResult<&str> {
        let value = self.require(key)?;
        value
            .as_str()
            .ok_or_else(|| ConfigError::type_mismatch(key, "string", value.kind()))
    }

    pub fn get_string_list(&self, key: &str) -> ConfigResult<Vec<String>> {
        let value = self.require(key)?;
        value
            .as_string_list()
            .ok_or_else(|| ConfigError::type_mismatch(key, "string list", value.kind()))
    }

    pub fn get_map(&self, key: &str) -> ConfigResult<&ValueMap> {
        let value = self.require(key)?;
        value
            .as_map()
            .ok_or_else(|| ConfigError::type_mismatch(key, "map", value.kind()))
    }

    pub fn working_dir(&self) -> ConfigResult<PathBuf> {
        self.get_str("workingDir").map(PathBuf::from)
    }

    /// A directory setting such as `contentDir`, joined onto the working directory.
    pub fn site_path(&self, key: &str) -> ConfigResult<PathBuf> {
        Ok(self.working_dir()?.join(self.get_str(key)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn site(config: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("config.toml"), config).unwrap();
        temp
    }

    fn inputs(temp: &TempDir) -> ResolveInputs {
        let cache = temp.path().join("cache");
        let env: HashMap<String, String> = HashMap::new();
        let mut inputs = ResolveInputs::new(temp.path()).with_env(Arc::new(env));
        inputs.flag_sets = vec![
            FlagSet::new("drouet").with_flag("cacheDir", cache.display().to_string(), true),
        ];
        inputs
    }

    #[test]
    fn test_set_respects_precedence() {
        let mut store = ConfigStore::new(SettingRegistry::new());
        assert!(store.set("title", "flag", Origin::Flag));
        assert!(!store.set("title", "file", Origin::Config));
        assert!(!store.set("Title", "default", Origin::Default));
        assert_eq!(store.value("TITLE"), Some(&Value::from("flag")));
        assert!(store.set_override("title", "override"));
        assert_eq!(store.origin("title"), Some(Origin::Override));
    }

    #[test]
    fn test_alias_write_and_read() {
        let mut store = ConfigStore::new(SettingRegistry::standard());
        store.set("indexes", Value::Map(ValueMap::new()), Origin::Config);
        assert_eq!(store.value("taxonomies"), Some(&Value::Map(ValueMap::new())));
        assert_eq!(store.keys().filter(|k| *k == "indexes").count(), 0);
    }

    #[test]
    fn test_resolve_layers_sources() {
        let temp = site("title = \"My Site\"\npaginate = 5\n");
        let config = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs(&temp))
            .unwrap();

        assert_eq!(config.get_str("title").unwrap(), "My Site");
        assert_eq!(config.get_origin("title"), Some(Origin::Config));
        assert_eq!(config.get_int("paginate").unwrap(), 5);
        assert_eq!(config.get_origin("contentDir"), Some(Origin::Default));
        assert_eq!(config.get_origin("workingDir"), Some(Origin::Override));
        assert_eq!(config.working_dir().unwrap(), temp.path());
        assert_eq!(
            config.site_path("contentDir").unwrap(),
            temp.path().join("content")
        );
    }

    #[test]
    fn test_cache_dir_created_with_trailing_separator() {
        let temp = site("");
        let config = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs(&temp))
            .unwrap();
        let cache = config.get_str("cacheDir").unwrap();
        assert!(cache.ends_with(MAIN_SEPARATOR));
        assert!(temp.path().join("cache").is_dir());
        assert_eq!(config.get_origin("cacheDir"), Some(Origin::Override));
    }

    #[test]
    fn test_default_cache_dir_under_temp() {
        let temp = site("");
        let mut inputs = inputs(&temp);
        inputs.flag_sets.clear();
        let config = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs)
            .unwrap();
        let cache = PathBuf::from(config.get_str("cacheDir").unwrap());
        assert!(cache.ends_with(DEFAULT_CACHE_DIR_NAME));
        assert!(cache.is_dir());
    }

    #[test]
    fn test_render_to_memory_forces_publish_dir() {
        let temp = site("renderToMemory = true\npublishDir = \"out\"\n");
        let config = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs(&temp))
            .unwrap();
        assert_eq!(config.get_str("publishDir").unwrap(), "/");
        assert_eq!(config.get_origin("publishDir"), Some(Origin::Override));
    }

    #[test]
    fn test_destination_flag_maps_to_publish_dir() {
        let temp = site("publishDir = \"out\"\n");
        let mut inputs = inputs(&temp);
        inputs.flag_sets[0].push("destination", "dist", true);
        inputs.flag_sets[0].push("i18n-warnings", true, true);
        let config = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs)
            .unwrap();
        assert_eq!(config.get_str("publishDir").unwrap(), "dist");
        assert_eq!(config.get_origin("publishDir"), Some(Origin::Override));
        assert!(config.get_bool("logI18nWarnings").unwrap());
    }

    #[test]
    fn test_server_watch_is_reflected_in_settings() {
        let temp = site("");
        let resolve = |server: FlagSet| {
            let mut inputs = inputs(&temp);
            inputs.flag_sets.insert(0, server);
            ConfigStore::new(SettingRegistry::standard())
                .resolve(&inputs)
                .unwrap()
        };

        let config = resolve(FlagSet::new(SERVER_COMMAND).with_flag("watch", true, false));
        assert!(config.get_bool("watch").unwrap());
        assert_eq!(config.get_origin("watch"), Some(Origin::Override));

        let config = resolve(FlagSet::new(SERVER_COMMAND).with_flag("watch", false, true));
        assert!(!config.get_bool("watch").unwrap());
        assert_eq!(config.get_origin("watch"), Some(Origin::Flag));

        let config = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs(&temp))
            .unwrap();
        assert!(!config.get_bool("watch").unwrap());
        assert_eq!(config.get_origin("watch"), Some(Origin::Default));
    }

    #[test]
    fn test_env_fills_defaults_only() {
        let temp = site("title = \"file\"\n");
        let env: HashMap<String, String> = [
            ("HUGO_TITLE", "env"),
            ("HUGO_BUILDDRAFTS", "true"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let inputs = inputs(&temp).with_env(Arc::new(env));
        let config = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs)
            .unwrap();
        assert_eq!(config.get_str("title").unwrap(), "file");
        assert!(config.get_bool("buildDrafts").unwrap());
        assert_eq!(config.get_origin("buildDrafts"), Some(Origin::Env));
    }

    #[test]
    fn test_dotted_path_read() {
        let temp = site("[params]\nAuthor = \"jo\"\n[params.social]\ngithub = \"jo\"\n");
        let config = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs(&temp))
            .unwrap();
        assert_eq!(config.get("params.author"), Some(&Value::from("jo")));
        assert_eq!(config.get("Params.Social.GitHub"), Some(&Value::from("jo")));
        assert_eq!(config.get("taxonomies.tag"), Some(&Value::from("tags")));
        assert_eq!(config.get("indexes.category"), Some(&Value::from("categories")));
        assert_eq!(config.get("params.missing"), None);
        assert_eq!(config.get("title.nested"), None);
    }

    #[test]
    fn test_typed_getters_fail_on_mismatch() {
        let temp = site("title = \"x\"\n");
        let config = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs(&temp))
            .unwrap();
        let err = config.get_int("title").unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        assert!(matches!(
            config.get_bool("nope").unwrap_err(),
            ConfigError::MissingKey { .. }
        ));
        assert_eq!(
            config.get_string_list("ignoreFiles").unwrap(),
            Vec::<String>::new()
        );
        assert_eq!(config.get_map("taxonomies").unwrap().len(), 2);
    }

    #[test]
    fn test_non_string_cache_dir_rejected() {
        let temp = site("cacheDir = 3\n");
        let mut inputs = inputs(&temp);
        inputs.flag_sets.clear();
        let err = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs)
            .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }

    #[test]
    fn test_from_flags_uses_source_and_config() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().display().to_string();
        let sets = vec![
            FlagSet::new("drouet")
                .with_flag("source", source, true)
                .with_flag("config", "a.toml,b.toml", true),
        ];
        let inputs = ResolveInputs::from_flags(sets).unwrap();
        assert_eq!(inputs.base_dir, temp.path());
        assert_eq!(inputs.file_spec, "a.toml,b.toml");
        assert_eq!(inputs.flag_sets.len(), 1);
    }

    #[test]
    fn test_from_flags_ignores_unchanged_source() {
        let sets = vec![FlagSet::new("drouet").with_flag("source", "/elsewhere", false)];
        let inputs = ResolveInputs::from_flags(sets).unwrap();
        assert_eq!(inputs.base_dir, std::env::current_dir().unwrap());
        assert!(inputs.file_spec.is_empty());
    }
}

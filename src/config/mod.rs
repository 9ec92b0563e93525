//! Layered site configuration.
//!
//! Settings come from four sources, lowest precedence first:
//! 1. **Defaults** - registered in a [`SettingRegistry`]
//! 2. **Environment** - `HUGO_<KEY>` variables, only for keys nothing else set
//! 3. **Config files** - `config.{toml,yaml,yml,json}` plus any extra files
//! 4. **Flags** - command-line flags the user actually typed
//!
//! A small set of override rules and derived keys (`workingDir`,
//! `cacheDir`) sit above all of them. Every key remembers its [`Origin`].
//!
//! ## Merge Strategy
//! Files are merged at the top level only; a later file replaces list and
//! map values wholesale.
//!
//! ## Lifecycle
//! A [`ConfigStore`] is consumed by [`ConfigStore::resolve`], producing an
//! immutable [`FrozenConfig`]. Long-running modes share it via a
//! [`ConfigHandle`] and swap in a fresh snapshot on reload.

mod deprecation;
mod env;
mod files;
mod flags;
mod handle;
mod merge;
mod origin;
mod registry;
mod store;
mod value;

pub use deprecation::{
    DEPRECATED_FLAGS, DEPRECATED_KEYS, DeprecatedKey, DeprecationChecker, DeprecationNotice,
    Severity,
};
pub use env::{ENV_PREFIX, EnvBinder, EnvSource, ProcessEnv};
pub use files::{
    CONFIG_BASENAME, ConfigFileSet, ConfigFormat, FileConfigLoader, LoadedConfig,
    SUPPORTED_EXTENSIONS,
};
pub use flags::{Flag, FlagBinder, FlagSet};
pub use handle::ConfigHandle;
pub use merge::{replace_merge, replace_merge_all};
pub use origin::Origin;
pub use registry::SettingRegistry;
pub use store::{
    ConfigStore, DEFAULT_CACHE_DIR_NAME, FrozenConfig, ResolveInputs, SERVER_COMMAND, Setting,
};
pub use value::{Value, ValueMap};

//! Config file discovery, parsing and merging.
//!
//! The first file of a load is mandatory. It is either named explicitly or
//! found by convention as `config.<ext>` in the base directory. Further files
//! are merged on top of it in the order given. A load either succeeds as a
//! whole or fails without producing any settings.

use super::merge::replace_merge_all;
use super::value::{Value, ValueMap};
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Base name of the conventional config file.
pub const CONFIG_BASENAME: &str = "config";

/// Extensions searched, in order, when no explicit file is given.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Serialization format of a config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "toml" | "tml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Parse file content into a generic tree.
    pub fn parse(self, content: &str) -> Result<serde_json::Value, String> {
        match self {
            ConfigFormat::Toml => toml::from_str::<toml::Value>(content)
                .map(toml_to_json)
                .map_err(|e| e.to_string()),
            ConfigFormat::Yaml => {
                serde_yaml::from_str::<serde_json::Value>(content).map_err(|e| e.to_string())
            }
            ConfigFormat::Json => {
                serde_json::from_str::<serde_json::Value>(content).map_err(|e| e.to_string())
            }
        }
    }
}

/// TOML datetimes have no JSON counterpart; they are kept as their string form.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::Value::from(i),
        toml::Value::Float(f) => serde_json::Value::from(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// The config files used by one load, in merge order.
///
/// The first entry is the primary file. Paths are absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFileSet {
    files: Vec<PathBuf>,
}

impl ConfigFileSet {
    pub fn primary(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|p| p == path)
    }
}

/// Result of a successful load: the merged settings and where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub files: ConfigFileSet,
    pub settings: ValueMap,
}

/// Locates, parses and merges config files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileConfigLoader;

impl FileConfigLoader {
    /// Load config files for a site rooted at `base_dir`.
    ///
    /// `file_spec` is a comma-separated list of paths; relative entries are
    /// taken relative to `base_dir`. An empty spec means "find `config.<ext>`
    /// in `base_dir`".
    pub fn load(base_dir: &Path, file_spec: &str) -> ConfigResult<LoadedConfig> {
        let entries: Vec<&str> = file_spec
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let primary = match entries.first() {
            Some(first) => {
                let path = absolutize(base_dir, first);
                if !path.is_file() {
                    return Err(ConfigError::MissingFile { path });
                }
                path
            }
            None => Self::find_conventional(base_dir)?,
        };

        let mut paths = vec![primary];
        paths.extend(entries.iter().skip(1).map(|p| absolutize(base_dir, p)));

        // Parse everything before merging anything.
        let mut layers = Vec::with_capacity(paths.len());
        for path in &paths {
            layers.push(Self::parse_file(path)?);
            debug!("Loaded config file: {}", path.display());
        }

        Ok(LoadedConfig {
            files: ConfigFileSet { files: paths },
            settings: replace_merge_all(layers),
        })
    }

    /// Find the first `config.<ext>` in `base_dir`, in [`SUPPORTED_EXTENSIONS`] order.
    pub fn find_conventional(base_dir: &Path) -> ConfigResult<PathBuf> {
        SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| base_dir.join(format!("{}.{}", CONFIG_BASENAME, ext)))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ConfigError::NotFound {
                dir: base_dir.to_path_buf(),
            })
    }

    /// Read and parse a single file into a top-level settings map.
    pub fn parse_file(path: &Path) -> ConfigResult<ValueMap> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(bytes)
            .map_err(|e| ConfigError::parse(path, format!("file is not valid UTF-8: {}", e)))?;
        if content.trim().is_empty() {
            return Ok(ValueMap::new());
        }
        let tree = format
            .parse(&content)
            .map_err(|reason| ConfigError::parse(path, reason))?;

        match Value::from_json(tree) {
            None => Ok(ValueMap::new()),
            Some(Value::Map(map)) => Ok(map),
            Some(other) => Err(ConfigError::parse(
                path,
                format!("expected a table of settings at top level, found {}", other.kind()),
            )),
        }
    }
}

fn absolutize(base_dir: &Path, entry: &str) -> PathBuf {
    let path = Path::new(entry);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

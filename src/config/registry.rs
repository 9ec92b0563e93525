//! Default values and key aliases.

use super::value::{Value, ValueMap};
use crate::error::{ConfigError, ConfigResult};
use std::collections::BTreeMap;

/// Holds registered defaults and alias mappings.
///
/// Keys are case-insensitive and stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingRegistry {
    defaults: BTreeMap<String, Value>,
    aliases: BTreeMap<String, String>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the site generator's built-in defaults and the
    /// `indexes` -> `taxonomies` alias.
    pub fn standard() -> Self {
        let mut registry = Self::new();

        // Old name for taxonomies
        registry
            .aliases
            .insert("indexes".to_string(), "taxonomies".to_string());

        let mut taxonomies = ValueMap::new();
        taxonomies.insert("tag".to_string(), Value::from("tags"));
        taxonomies.insert("category".to_string(), Value::from("categories"));

        let defaults: Vec<(&str, Value)> = vec![
            ("archetypeDir", "archetypes".into()),
            ("buildDrafts", false.into()),
            ("buildExpired", false.into()),
            ("buildFuture", false.into()),
            ("canonifyURLs", false.into()),
            ("cleanDestinationDir", false.into()),
            ("contentDir", "content".into()),
            ("defaultContentLanguage", "en".into()),
            ("defaultContentLanguageInSubdir", false.into()),
            ("enableMissingTranslationPlaceholders", false.into()),
            ("enableGitInfo", false.into()),
            ("ignoreFiles", Value::List(Vec::new())),
            ("ignoreDeprecations", Value::List(Vec::new())),
            ("dataDir", "data".into()),
            ("debug", false.into()),
            ("disableAliases", false.into()),
            ("disableFastRender", false.into()),
            ("disableLiveReload", false.into()),
            ("disablePathToLower", false.into()),
            ("enableEmoji", false.into()),
            ("footnoteAnchorPrefix", "".into()),
            ("footnoteReturnLinkContents", "".into()),
            ("forceSyncStatic", false.into()),
            ("hasCJKLanguage", false.into()),
            ("i18nDir", "i18n".into()),
            ("ignoreCache", false.into()),
            ("layoutDir", "layouts".into()),
            ("metaDataFormat", "toml".into()),
            ("newContentEditor", "".into()),
            ("paginate", Value::Int(10)),
            ("paginatePath", "page".into()),
            ("pluralizeListTitles", true.into()),
            ("preserveTaxonomyNames", false.into()),
            ("publishDir", "public".into()),
            ("relativeURLs", false.into()),
            ("removePathAccents", false.into()),
            ("renderToMemory", false.into()),
            ("resourceDir", "resources".into()),
            ("rssLimit", Value::Int(-1)),
            ("rSSUri", "index.xml".into()),
            ("sectionPagesMenu", "".into()),
            ("staticDir", "static".into()),
            ("summaryLength", Value::Int(70)),
            ("taxonomies", Value::Map(taxonomies)),
            ("themesDir", "themes".into()),
            ("titleCaseStyle", "AP".into()),
            ("uglyURLs", false.into()),
            ("useModTimeAsFallback", false.into()),
            ("verbose", false.into()),
            ("watch", false.into()),
            ("pygmentsCodeFences", false.into()),
            ("pygmentsCodeFencesGuessSyntax", false.into()),
            ("pygmentsOptions", "".into()),
            ("pygmentsStyle", "monokai".into()),
            ("pygmentsUseClasses", false.into()),
            ("pygmentsUseClassic", false.into()),
        ];
        for (key, value) in defaults {
            registry.defaults.insert(key.to_lowercase(), value);
        }

        registry
    }

    /// Register a default for `key`.
    ///
    /// Re-registering the same value is a no-op; registering a different value
    /// for a key that already has a default is rejected.
    pub fn register_default(&mut self, key: &str, value: impl Into<Value>) -> ConfigResult<()> {
        let key = self.canonical_key(key);
        let value = value.into();
        match self.defaults.get(&key) {
            Some(existing) if *existing == value => Ok(()),
            Some(_) => Err(ConfigError::ConflictingDefault { key }),
            None => {
                self.defaults.insert(key, value);
                Ok(())
            }
        }
    }

    /// Make `alias` an alternate name for `canonical`.
    pub fn register_alias(&mut self, alias: &str, canonical: &str) -> ConfigResult<()> {
        let alias = alias.to_lowercase();
        let canonical = canonical.to_lowercase();
        if alias == canonical {
            return Err(ConfigError::SelfAlias { alias });
        }

        // Walking from the target must never lead back to the alias.
        let mut current = canonical.as_str();
        while let Some(next) = self.aliases.get(current) {
            if *next == alias {
                return Err(ConfigError::AliasCycle { alias, canonical });
            }
            current = next;
        }

        // A default registered under the alias name moves to the canonical key.
        if let Some(value) = self.defaults.remove(&alias) {
            let target = self.canonical_key(&canonical);
            self.defaults.entry(target).or_insert(value);
        }

        self.aliases.insert(alias, canonical);
        Ok(())
    }

    /// Lower-case `key` and follow aliases to the canonical name.
    pub fn canonical_key(&self, key: &str) -> String {
        let mut key = key.to_lowercase();
        // Cycles are rejected at registration, the bound only guards the loop.
        for _ in 0..=self.aliases.len() {
            match self.aliases.get(&key) {
                Some(next) => key = next.clone(),
                None => break,
            }
        }
        key
    }

    pub fn default_value(&self, key: &str) -> Option<&Value> {
        self.defaults.get(&self.canonical_key(key))
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.defaults.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }
}

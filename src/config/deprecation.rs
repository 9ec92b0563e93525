//! Warnings for retired settings and flags.

use super::store::FrozenConfig;
use crate::logging::DistinctLogger;
use crate::version::SiteVersion;
use std::collections::BTreeSet;
use std::sync::Arc;

/// How seriously a deprecation is treated.
///
/// Both severities currently only warn; `ErrorEventually` marks items whose
/// removal release is already scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warn,
    ErrorEventually,
}

/// A retired config key.
#[derive(Debug, Clone, Copy)]
pub struct DeprecatedKey {
    pub key: &'static str,
    pub alternative: &'static str,
    pub severity: Severity,
}

pub const DEPRECATED_KEYS: &[DeprecatedKey] = &[DeprecatedKey {
    key: "useModTimeAsFallback",
    alternative: "Replace with this in your config.toml:

[frontmatter]
date = [ \"date\",\":fileModTime\", \":default\"]
lastmod = [\"lastmod\" ,\":fileModTime\", \":default\"]",
    severity: Severity::Warn,
}];

/// Command-line flags that moved to config-only settings.
pub const DEPRECATED_FLAGS: &[&str] = &[
    "uglyURLs",
    "pluralizeListTitles",
    "preserveTaxonomyNames",
    "canonifyURLs",
];

/// One deprecation found by [`DeprecationChecker::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationNotice {
    /// Key name, or `--flag`.
    pub subject: String,
    pub severity: Severity,
    pub message: String,
    /// False if the same message was already printed earlier in this run.
    pub emitted: bool,
}

/// Detects use of retired keys and flags.
#[derive(Debug, Clone)]
pub struct DeprecationChecker {
    feedback: Arc<DistinctLogger>,
    version: SiteVersion,
}

impl DeprecationChecker {
    pub fn new(feedback: Arc<DistinctLogger>, version: SiteVersion) -> Self {
        Self { feedback, version }
    }

    /// Check a resolved config and the names of flags the user changed.
    ///
    /// A deprecated key triggers when its value differs from the registered
    /// default and it is not listed in `ignoreDeprecations`. A deprecated
    /// flag triggers whenever it was changed.
    pub fn check(
        &self,
        config: &FrozenConfig,
        changed_flags: &BTreeSet<String>,
    ) -> Vec<DeprecationNotice> {
        let confirmed: Vec<String> = config
            .get("ignoreDeprecations")
            .and_then(|v| v.as_string_list())
            .unwrap_or_default()
            .iter()
            .map(|s| s.to_lowercase())
            .collect();

        let mut notices = Vec::new();

        for entry in DEPRECATED_KEYS {
            let Some(value) = config.get(entry.key) else {
                continue;
            };
            if config.registry().default_value(entry.key) == Some(value) {
                continue;
            }
            if confirmed.contains(&entry.key.to_lowercase()) {
                continue;
            }
            let message = self.format("Site config", entry.key, entry.alternative, entry.severity);
            notices.push(self.emit(entry.key.to_string(), entry.severity, message));
        }

        for flag in DEPRECATED_FLAGS {
            if !changed_flags.contains(&flag.to_lowercase()) {
                continue;
            }
            let alternative = format!(
                "Set \"{flag} = true\" in your config.toml.\n\
                 If you need to set this configuration value from the command line, \
                 set it via an OS environment variable: \"HUGO_{}=true drouet\"",
                flag.to_uppercase()
            );
            let item = format!("--{flag} flag");
            let message = self.format("drouet", &item, &alternative, Severity::ErrorEventually);
            notices.push(self.emit(format!("--{flag}"), Severity::ErrorEventually, message));
        }

        notices
    }

    fn format(&self, object: &str, item: &str, alternative: &str, severity: Severity) -> String {
        match severity {
            Severity::ErrorEventually => format!(
                "{object}'s {item} is deprecated and will be removed in drouet {}. {alternative}",
                self.version.next().release()
            ),
            Severity::Warn => format!(
                "WARNING: {object}'s {item} is deprecated and will be removed in a future release. {alternative}"
            ),
        }
    }

    fn emit(&self, subject: String, severity: Severity, message: String) -> DeprecationNotice {
        let emitted = self.feedback.print(&message);
        DeprecationNotice {
            subject,
            severity,
            message,
            emitted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, FlagSet, ResolveInputs, SettingRegistry};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn resolve(config: &str) -> (TempDir, FrozenConfig) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("config.toml"), config).unwrap();
        let cache = temp.path().join("cache").display().to_string();
        let inputs = ResolveInputs::new(temp.path())
            .with_env(Arc::new(HashMap::<String, String>::new()))
            .with_flag_sets(vec![FlagSet::new("drouet").with_flag("cacheDir", cache, true)]);
        let frozen = ConfigStore::new(SettingRegistry::standard())
            .resolve(&inputs)
            .unwrap();
        (temp, frozen)
    }

    fn checker() -> DeprecationChecker {
        DeprecationChecker::new(Arc::new(DistinctLogger::warn()), SiteVersion::CURRENT)
    }

    #[test]
    fn test_default_value_is_not_deprecated_use() {
        let (_temp, config) = resolve("useModTimeAsFallback = false\n");
        assert!(checker().check(&config, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_deprecated_key_warns_once() {
        let (_temp, config) = resolve("useModTimeAsFallback = true\n");
        let checker = checker();

        let first = checker.check(&config, &BTreeSet::new());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].severity, Severity::Warn);
        assert!(first[0].emitted);
        assert!(first[0].message.contains("[frontmatter]"));

        let second = checker.check(&config, &BTreeSet::new());
        assert_eq!(second.len(), 1);
        assert!(!second[0].emitted);
        assert_eq!(checker.feedback.count(), 1);
    }

    #[test]
    fn test_ignore_deprecations_reconfirms_key() {
        let (_temp, config) = resolve(
            "useModTimeAsFallback = true\nignoreDeprecations = [\"useModTimeAsFallback\"]\n",
        );
        assert!(checker().check(&config, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_changed_flag_names_next_release() {
        let (_temp, config) = resolve("");
        let changed: BTreeSet<String> = ["uglyurls".to_string(), "theme".to_string()].into();
        let notices = checker().check(&config, &changed);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].subject, "--uglyURLs");
        assert_eq!(notices[0].severity, Severity::ErrorEventually);
        assert!(notices[0].message.contains("removed in drouet 0.40"));
        assert!(notices[0].message.contains("HUGO_UGLYURLS=true drouet"));
    }
}

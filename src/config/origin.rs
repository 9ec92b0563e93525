//! Where a setting's current value came from.

use std::fmt;

/// The source category that supplied a setting's current value.
///
/// Ordered by precedence, lowest first: a write from a higher origin always
/// replaces a lower one, a write from a lower origin never replaces a higher one.
/// `Env` sits just above `Default`: it fills keys that nothing but the
/// registry supplied and never shadows a file, flag or override value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// Registered default
    Default = 0,
    /// `<PREFIX>_<KEY>` environment variable
    Env = 1,
    /// Loaded config file (or alias target thereof)
    Config = 2,
    /// Command-line flag the user actually set
    Flag = 3,
    /// Programmatic set after flag parsing, including derived keys
    Override = 4,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Default => "default",
            Origin::Env => "env",
            Origin::Config => "config",
            Origin::Flag => "flag",
            Origin::Override => "override",
        }
    }

    /// True if a write from `self` may replace a value currently held by `current`.
    pub fn may_replace(self, current: Origin) -> bool {
        self >= current
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

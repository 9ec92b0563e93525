//! Release version of the site generator.

use std::fmt;

/// A `major.minor[.patch][suffix]` version, e.g. `0.39-DEV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub suffix: &'static str,
}

impl SiteVersion {
    pub const CURRENT: SiteVersion = SiteVersion {
        major: 0,
        minor: 39,
        patch: 0,
        suffix: "-DEV",
    };

    /// The next minor release, without patch level or suffix.
    pub fn next(self) -> SiteVersion {
        let (major, minor) = if self.minor >= 99 {
            (self.major + 1, 0)
        } else {
            (self.major, self.minor + 1)
        };
        SiteVersion {
            major,
            minor,
            patch: 0,
            suffix: "",
        }
    }

    /// This version with the suffix dropped.
    pub fn release(self) -> SiteVersion {
        SiteVersion { suffix: "", ..self }
    }
}

impl fmt::Display for SiteVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)?;
        if self.patch > 0 {
            write!(f, ".{}", self.patch)?;
        }
        f.write_str(self.suffix)
    }
}

//! Text listing of a resolved configuration, as printed by `drouet config`.

use crate::config::{FrozenConfig, Origin, Value};
use std::io::{self, Write};

/// `key = value` when the site's metadata format is TOML, `key: value` otherwise.
pub fn separator(config: &FrozenConfig) -> &'static str {
    match config.get("metaDataFormat") {
        Some(Value::String(format)) if format == "toml" => " = ",
        _ => ": ",
    }
}

/// Print every setting sorted by key.
///
/// In verbose mode the listing is preceded by the keys grouped by origin
/// and each line is tagged `*` (flag) or `!` (config file).
pub fn print_settings(config: &FrozenConfig, verbose: bool, out: &mut impl Write) -> io::Result<()> {
    let settings = config.all_settings();
    let origins = config.all_origins();
    let separator = separator(config);

    if verbose {
        let mut overrides = Vec::new();
        let mut flags = Vec::new();
        let mut files = Vec::new();
        let mut defaults = Vec::new();
        // Keys are already sorted
        for (key, origin) in &origins {
            match origin {
                Origin::Override => overrides.push(key.as_str()),
                Origin::Flag => flags.push(key.as_str()),
                Origin::Config => files.push(key.as_str()),
                Origin::Default | Origin::Env => defaults.push(key.as_str()),
            }
        }
        for (tag, keys) in [
            ("override", overrides),
            ("flags", flags),
            ("config", files),
            ("default", defaults),
        ] {
            if keys.is_empty() {
                continue;
            }
            writeln!(out, "config from {}:", tag)?;
            for key in keys {
                writeln!(out, "  {}", key)?;
            }
        }
    }

    for (key, value) in &settings {
        let tag = match origins.get(key) {
            Some(Origin::Flag) if verbose => "*",
            Some(Origin::Config) if verbose => "!",
            _ => "",
        };
        match value {
            Value::String(s) => writeln!(out, "{}{}{}\"{}\"", tag, key, separator, s)?,
            other => writeln!(out, "{}{}{}{}", tag, key, separator, other)?,
        }
    }
    Ok(())
}

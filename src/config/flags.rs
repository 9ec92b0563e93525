//! Command-line flag binding.
//!
//! Flags are handed over already parsed, one [`FlagSet`] per command in the
//! invocation chain. Only flags the user actually typed contribute values;
//! a flag's compiled-in default never shadows a file or registry value.
//!
//! Flag sets are ordered leaf command first, then its parent, and so on up
//! to the root. Binding walks that list backwards so the leaf command is
//! written last and wins when two commands declare the same flag.

use super::origin::Origin;
use super::store::ConfigStore;
use super::value::Value;
use std::collections::BTreeSet;

/// A declared flag: its current value and whether the user set it.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    pub name: String,
    pub value: Value,
    pub changed: bool,
}

/// All flags declared by one command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSet {
    command: String,
    flags: Vec<Flag>,
}

impl FlagSet {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            flags: Vec::new(),
        }
    }

    /// Builder-style [`FlagSet::push`].
    pub fn with_flag(mut self, name: &str, value: impl Into<Value>, changed: bool) -> Self {
        self.push(name, value, changed);
        self
    }

    pub fn push(&mut self, name: &str, value: impl Into<Value>, changed: bool) {
        self.flags.push(Flag {
            name: name.to_string(),
            value: value.into(),
            changed,
        });
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Flags the user set on the command line.
    pub fn changed(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter().filter(|f| f.changed)
    }
}

/// Writes changed flags into a store with [`Origin::Flag`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagBinder;

impl FlagBinder {
    /// Bind every changed flag of `sets` (leaf first) into `store`.
    /// Returns the number of writes performed.
    pub fn bind(store: &mut ConfigStore, sets: &[FlagSet]) -> usize {
        let mut written = 0;
        for set in sets.iter().rev() {
            for flag in set.changed() {
                if store.set(&flag.name, flag.value.clone(), Origin::Flag) {
                    written += 1;
                }
            }
        }
        written
    }

    /// Value of `name` if some command in the chain had it changed; the leaf wins.
    pub fn changed_value<'a>(sets: &'a [FlagSet], name: &str) -> Option<&'a Value> {
        sets.iter()
            .filter_map(|set| set.lookup(name))
            .find(|flag| flag.changed)
            .map(|flag| &flag.value)
    }

    /// Lower-cased names of every flag the user changed, across all commands.
    pub fn changed_names(sets: &[FlagSet]) -> BTreeSet<String> {
        sets.iter()
            .flat_map(FlagSet::changed)
            .map(|f| f.name.to_lowercase())
            .collect()
    }
}

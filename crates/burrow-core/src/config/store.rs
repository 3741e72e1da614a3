//! Flat `key: value` store backing each workspace's `.ws/config`
//!
//! Repeated fields live on disk as several physical keys sharing a prefix
//! (`tag.0`, `tag.1`, `env.PATH`). In memory the store keeps the physical
//! mapping; [`Field`] is the logical view used when writing whole fields back.

use crate::error::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One logical field as written by a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Single `key: value` line
    Scalar { key: String, value: String },

    /// Ordered values stored as `<prefix>0..n-1`
    List {
        prefix: &'static str,
        values: Vec<String>,
    },

    /// Named values stored as `<prefix><name>`
    Map {
        prefix: &'static str,
        entries: BTreeMap<String, String>,
    },
}

impl Field {
    /// Scalar field helper
    pub fn scalar(key: impl Into<String>, value: impl Into<String>) -> Self {
        Field::Scalar {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Key/value store loaded from and saved to a single text file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigStore {
    entries: BTreeMap<String, String>,
}

impl ConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse store content
    ///
    /// Blank lines and `#` comments are skipped. The first `:` separates key
    /// from value, falling back to the first `=`; lines with neither are
    /// ignored. A value wrapped in double quotes loses them.
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(sep) = line.find(':').or_else(|| line.find('=')) else {
                continue;
            };

            let key = line[..sep].trim();
            let value = strip_quotes(line[sep + 1..].trim());
            entries.insert(key.to_string(), value.to_string());
        }

        Self { entries }
    }

    /// Replace the store's content with the file at `path`
    ///
    /// Returns `Ok(false)` when the file does not exist; callers fall back to
    /// defaults in that case.
    pub fn load(&mut self, path: &Path) -> Result<bool> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found");
            return Ok(false);
        }

        let content = fs::read_to_string(path)?;
        *self = Self::parse(&content);
        debug!(path = %path.display(), keys = self.entries.len(), "loaded config");
        Ok(true)
    }

    /// Canonical `key: value` rendering, sorted by key
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Write the store to `path` through a temporary file and rename
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = Path::new(&temp_name);

        fs::write(temp_path, self.render())?;
        fs::rename(temp_path, path)?;
        debug!(path = %path.display(), keys = self.entries.len(), "saved config");
        Ok(())
    }

    /// Raw value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value for `key`, or `default` when absent
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Set `key`, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Whether `key` is present
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Remove every key starting with `prefix`
    pub fn remove_prefix(&mut self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }

    /// Number of physical keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every value whose key starts with `prefix`
    ///
    /// Ordered by the suffix after the prefix: numeric suffixes ascending by
    /// value, then non-numeric suffixes in lexical order.
    pub fn get_list(&self, prefix: &str) -> Vec<String> {
        let mut items: Vec<(ListIndex<'_>, &String)> = self
            .entries
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .map(|suffix| (ListIndex::from_suffix(suffix), value))
            })
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items.into_iter().map(|(_, value)| value.clone()).collect()
    }

    /// Keys under `prefix` with the prefix stripped
    pub fn get_map(&self, prefix: &str) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), value.clone()))
            })
            .collect()
    }

    /// Write one logical field
    ///
    /// Repeated fields are re-derived from scratch: every key under the
    /// prefix is dropped before the new values are written, so a shrinking
    /// list leaves no stale indices behind.
    pub fn write_field(&mut self, field: Field) {
        match field {
            Field::Scalar { key, value } => self.set(key, value),
            Field::List { prefix, values } => {
                self.remove_prefix(prefix);
                for (i, value) in values.into_iter().enumerate() {
                    self.set(format!("{}{}", prefix, i), value);
                }
            }
            Field::Map { prefix, entries } => {
                self.remove_prefix(prefix);
                for (name, value) in entries {
                    self.set(format!("{}{}", prefix, name), value);
                }
            }
        }
    }
}

/// Sort key for list suffixes
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum ListIndex<'a> {
    Numeric(u64),
    Named(&'a str),
}

impl<'a> ListIndex<'a> {
    fn from_suffix(suffix: &'a str) -> Self {
        suffix
            .parse::<u64>()
            .map(ListIndex::Numeric)
            .unwrap_or(ListIndex::Named(suffix))
    }
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

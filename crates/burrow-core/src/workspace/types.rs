//! Workspace type definitions
//!
//! A [`WorkspaceRecord`] is assembled from a registry entry (name and path)
//! and the workspace's own `.ws/config` store.

use crate::config::{ConfigStore, Field};
use crate::error::{BurrowError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Directory inside every workspace holding burrow metadata
pub const META_DIR: &str = ".ws";

/// Language tag used when none is given
pub const DEFAULT_LANG: &str = "generic";

const ENV_PREFIX: &str = "env.";
const MOUNT_PREFIX: &str = "mount.";
const INIT_PREFIX: &str = "init.";
const TAG_PREFIX: &str = "tag.";

/// A named project workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceRecord {
    /// Unique identity, immutable after creation
    pub name: String,

    /// Root of the workspace tree
    pub path: PathBuf,

    /// Free-form language tag
    pub lang: String,

    pub display_name: String,
    pub description: String,

    /// Run sessions inside a private mount namespace
    pub isolated: bool,

    pub build_cmd: String,
    pub clean_cmd: String,
    pub run_cmd: String,
    pub test_cmd: String,

    /// Variables injected into sessions and delegated commands
    pub env_vars: BTreeMap<String, String>,

    /// `host:target` bind mounts applied in isolated sessions
    pub mounts: Vec<String>,

    /// Commands run before the interactive shell starts
    pub init_cmds: Vec<String>,

    pub tags: Vec<String>,

    /// Creation time, Unix epoch seconds
    pub created: String,

    pub author: String,
}

impl WorkspaceRecord {
    /// Bare record for a registry entry, before its config is loaded
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            lang: DEFAULT_LANG.to_string(),
            name,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Location of the backing config store
    pub fn config_path(&self) -> PathBuf {
        self.path.join(META_DIR).join("config")
    }

    /// Check if workspace path exists
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Populate fields from `.ws/config`
    ///
    /// Returns `Ok(false)` when the file is absent; the record then carries
    /// the named defaults.
    pub fn load_config(&mut self) -> Result<bool> {
        let mut store = ConfigStore::new();
        let found = store.load(&self.config_path())?;
        self.apply_store(&store);
        Ok(found)
    }

    /// Populate fields from an already loaded store
    pub fn apply_store(&mut self, store: &ConfigStore) {
        self.display_name = store.get_or("display_name", &self.name);
        self.description = store.get_or("description", "");
        self.lang = store.get_or("lang", DEFAULT_LANG);
        self.isolated = store.get("isolated") == Some("true");

        self.build_cmd = store.get_or("build_cmd", "");
        self.clean_cmd = store.get_or("clean_cmd", "");
        self.run_cmd = store.get_or("run_cmd", "");
        self.test_cmd = store.get_or("test_cmd", "");

        self.created = store.get_or("created", "");
        self.author = store.get_or("author", "");

        self.env_vars = store.get_map(ENV_PREFIX);
        self.mounts = store.get_list(MOUNT_PREFIX);
        self.init_cmds = store.get_list(INIT_PREFIX);
        self.tags = store.get_list(TAG_PREFIX);
    }

    /// Write fields back to `.ws/config`
    ///
    /// Keys burrow does not know about are kept. Optional scalars that are
    /// empty are removed rather than written.
    pub fn save_config(&self) -> Result<()> {
        let path = self.config_path();
        let mut store = ConfigStore::new();
        store.load(&path)?;
        self.write_to(&mut store);
        store.save(&path)
    }

    /// Apply every field to `store`
    pub fn write_to(&self, store: &mut ConfigStore) {
        for field in self.fields() {
            store.write_field(field);
        }

        for (key, value) in self.optional_scalars() {
            if value.is_empty() {
                store.remove(key);
            } else {
                store.set(key, value);
            }
        }
    }

    /// Fields written on every save, regardless of content
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::scalar("name", &self.name),
            Field::scalar("display_name", &self.display_name),
            Field::scalar("description", &self.description),
            Field::scalar("lang", &self.lang),
            Field::scalar("isolated", if self.isolated { "true" } else { "false" }),
            Field::Map {
                prefix: ENV_PREFIX,
                entries: self.env_vars.clone(),
            },
            Field::List {
                prefix: MOUNT_PREFIX,
                values: self.mounts.clone(),
            },
            Field::List {
                prefix: INIT_PREFIX,
                values: self.init_cmds.clone(),
            },
            Field::List {
                prefix: TAG_PREFIX,
                values: self.tags.clone(),
            },
        ]
    }

    fn optional_scalars(&self) -> [(&'static str, &str); 6] {
        [
            ("build_cmd", self.build_cmd.as_str()),
            ("clean_cmd", self.clean_cmd.as_str()),
            ("run_cmd", self.run_cmd.as_str()),
            ("test_cmd", self.test_cmd.as_str()),
            ("created", self.created.as_str()),
            ("author", self.author.as_str()),
        ]
    }

    /// Read a `config` key
    pub fn get_field(&self, key: &ConfigKey) -> Result<String> {
        let value = match key {
            ConfigKey::DisplayName => self.display_name.clone(),
            ConfigKey::Description => self.description.clone(),
            ConfigKey::BuildCmd => self.build_cmd.clone(),
            ConfigKey::RunCmd => self.run_cmd.clone(),
            ConfigKey::TestCmd => self.test_cmd.clone(),
            ConfigKey::CleanCmd => self.clean_cmd.clone(),
            ConfigKey::Isolated => self.isolated.to_string(),
            ConfigKey::Env(var) => self.env_vars.get(var).cloned().ok_or_else(|| {
                BurrowError::not_found(format!("environment variable not set: {}", var))
            })?,
        };
        Ok(value)
    }

    /// Set a `config` key
    ///
    /// Values must fit on one line of the config store.
    pub fn set_field(&mut self, key: &ConfigKey, value: &str) -> Result<()> {
        validate_value(&key.to_string(), value)?;
        let value = value.to_string();
        match key {
            ConfigKey::DisplayName => self.display_name = value,
            ConfigKey::Description => self.description = value,
            ConfigKey::BuildCmd => self.build_cmd = value,
            ConfigKey::RunCmd => self.run_cmd = value,
            ConfigKey::TestCmd => self.test_cmd = value,
            ConfigKey::CleanCmd => self.clean_cmd = value,
            ConfigKey::Isolated => self.isolated = value == "true" || value == "1",
            ConfigKey::Env(var) => {
                self.env_vars.insert(var.clone(), value);
            }
        }
        Ok(())
    }

    /// Check that every field can be stored without corrupting the store or the registry
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_value("path", &self.path.to_string_lossy())?;
        for field in self.fields() {
            match field {
                Field::Scalar { key, value } => validate_value(&key, &value)?,
                Field::List { prefix, values } => {
                    for value in &values {
                        validate_value(prefix, value)?;
                    }
                }
                Field::Map { entries, .. } => {
                    for (var, value) in &entries {
                        validate_env_name(var)?;
                        validate_value(var, value)?;
                    }
                }
            }
        }
        for (key, value) in self.optional_scalars() {
            validate_value(key, value)?;
        }
        Ok(())
    }
}

/// Keys accepted by `burrow config`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigKey {
    DisplayName,
    Description,
    BuildCmd,
    RunCmd,
    TestCmd,
    CleanCmd,
    Isolated,
    /// `env.<VAR>`
    Env(String),
}

impl ConfigKey {
    /// Every scalar key, listed when an unknown key is given
    pub const SCALARS: [&'static str; 7] = [
        "display_name",
        "description",
        "build_cmd",
        "run_cmd",
        "test_cmd",
        "clean_cmd",
        "isolated",
    ];
}

impl FromStr for ConfigKey {
    type Err = BurrowError;

    fn from_str(s: &str) -> Result<Self> {
        let key = match s {
            "display_name" => ConfigKey::DisplayName,
            "description" => ConfigKey::Description,
            "build_cmd" => ConfigKey::BuildCmd,
            "run_cmd" => ConfigKey::RunCmd,
            "test_cmd" => ConfigKey::TestCmd,
            "clean_cmd" => ConfigKey::CleanCmd,
            "isolated" => ConfigKey::Isolated,
            _ => match s.strip_prefix(ENV_PREFIX) {
                Some(var) if !var.is_empty() => {
                    validate_env_name(var)?;
                    ConfigKey::Env(var.to_string())
                }
                _ => {
                    return Err(BurrowError::UnknownKey(format!(
                        "{} (expected one of {}, or {}<VAR>)",
                        s,
                        ConfigKey::SCALARS.join(", "),
                        ENV_PREFIX
                    )))
                }
            },
        };
        Ok(key)
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigKey::DisplayName => f.write_str("display_name"),
            ConfigKey::Description => f.write_str("description"),
            ConfigKey::BuildCmd => f.write_str("build_cmd"),
            ConfigKey::RunCmd => f.write_str("run_cmd"),
            ConfigKey::TestCmd => f.write_str("test_cmd"),
            ConfigKey::CleanCmd => f.write_str("clean_cmd"),
            ConfigKey::Isolated => f.write_str("isolated"),
            ConfigKey::Env(var) => write!(f, "{}{}", ENV_PREFIX, var),
        }
    }
}

/// Reject names that would corrupt the registry format or the path layout
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name
            .chars()
            .any(|c| c == '/' || c == '[' || c == ']' || c.is_whitespace() || c.is_control());

    if bad {
        return Err(BurrowError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Reject environment variable names that cannot round-trip through `.ws/config`
pub fn validate_env_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name
            .chars()
            .any(|c| c == ':' || c == '=' || c.is_whitespace() || c.is_control());

    if bad {
        return Err(BurrowError::config(format!(
            "invalid environment variable name '{}'",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Stored values are single `key: value` lines
pub fn validate_value(key: &str, value: &str) -> Result<()> {
    if value.contains(|c: char| c == '\n' || c == '\r') {
        return Err(BurrowError::config(format!(
            "value for '{}' must not contain line breaks",
            key
        )));
    }
    Ok(())
}

/// Current time as Unix epoch seconds
pub fn now_epoch() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

/// Summary view of a workspace for listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceView {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub lang: String,
    pub path: PathBuf,
    pub isolated: bool,
    pub tags: Vec<String>,
    pub exists: bool,
}

impl From<&WorkspaceRecord> for WorkspaceView {
    fn from(ws: &WorkspaceRecord) -> Self {
        Self {
            name: ws.name.clone(),
            display_name: ws.display_name.clone(),
            description: ws.description.clone(),
            lang: ws.lang.clone(),
            path: ws.path.clone(),
            isolated: ws.isolated,
            tags: ws.tags.clone(),
            exists: ws.exists(),
        }
    }
}

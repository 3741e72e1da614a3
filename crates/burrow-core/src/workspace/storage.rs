//! Workspace persistence layer
//!
//! The registry file is a sectioned name → path index:
//!
//! ```text
//! [demo]
//! path=/home/me/.local/share/burrow/workspaces/demo
//!
//! ```
//!
//! Everything else about a workspace lives in its own `.ws/config`.

use super::types::{WorkspaceRecord, META_DIR};
use crate::config::BurrowPaths;
use crate::error::{BurrowError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Subdirectories created in every new workspace root
pub const WORKSPACE_DIRS: [&str; 4] = ["src", "build", "tests", META_DIR];

/// One `[name]` section of the registry file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    /// Empty when the section had no `path=` line
    pub path: PathBuf,
}

/// Name → path index of every known workspace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceRegistry {
    entries: Vec<RegistryEntry>,
}

impl WorkspaceRegistry {
    /// Parse registry file content
    ///
    /// Sections without a `path=` line produce an entry with an empty path.
    pub fn parse(content: &str) -> Self {
        let mut entries = Vec::new();
        let mut current: Option<RegistryEntry> = None;

        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                entries.extend(current.take().filter(|e| !e.name.is_empty()));
                current = Some(RegistryEntry {
                    name: name.to_string(),
                    path: PathBuf::new(),
                });
                continue;
            }

            if let (Some(entry), Some(("path", value))) = (current.as_mut(), line.split_once('=')) {
                entry.path = PathBuf::from(value);
            }
        }
        entries.extend(current.filter(|e| !e.name.is_empty()));

        Self { entries }
    }

    /// Render the registry in file format, in enumeration order
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!("[{}]\npath={}\n\n", entry.name, entry.path.display()));
        }
        out
    }

    /// First entry whose name matches exactly
    pub fn find(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Append a workspace to the registry
    pub fn add(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(BurrowError::already_exists(format!("workspace '{}'", name)));
        }
        self.entries.push(RegistryEntry {
            name,
            path: path.into(),
        });
        Ok(())
    }

    /// Remove every entry named `name`, returning the first
    pub fn remove(&mut self, name: &str) -> Option<RegistryEntry> {
        let removed = self.find(name).cloned();
        self.entries.retain(|e| e.name != name);
        removed
    }

    /// All entries in enumeration order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<&'a WorkspaceRecord> for WorkspaceRegistry {
    fn from_iter<I: IntoIterator<Item = &'a WorkspaceRecord>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|ws| RegistryEntry {
                    name: ws.name.clone(),
                    path: ws.path.clone(),
                })
                .collect(),
        }
    }
}

/// Storage backend for the registry file
///
/// Every operation is a whole-file read-modify-write with no locking; two
/// concurrent writers race and the last save wins.
#[derive(Debug, Clone)]
pub struct WorkspaceStorage {
    /// Per-user config root (~/.config/burrow)
    config_dir: PathBuf,

    /// Path to workspace registry file
    registry_path: PathBuf,
}

impl WorkspaceStorage {
    /// Create a storage instance for the resolved burrow paths
    pub fn new(paths: &BurrowPaths) -> Self {
        Self {
            config_dir: paths.config_dir.clone(),
            registry_path: paths.registry_file.clone(),
        }
    }

    /// Create with custom config directory (for testing)
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self {
            registry_path: config_dir.join("workspaces.conf"),
            config_dir,
        }
    }

    /// Path of the registry file
    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// Load workspace registry from disk
    pub fn load_registry(&self) -> Result<WorkspaceRegistry> {
        if !self.registry_path.exists() {
            return Ok(WorkspaceRegistry::default());
        }

        let content = fs::read_to_string(&self.registry_path)?;
        let registry = WorkspaceRegistry::parse(&content);
        debug!(entries = registry.len(), "loaded workspace registry");
        Ok(registry)
    }

    /// Save workspace registry to disk, replacing the whole file
    pub fn save_registry(&self, registry: &WorkspaceRegistry) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;

        // Write atomically using temp file
        let temp_path = self.registry_path.with_extension("conf.tmp");
        fs::write(&temp_path, registry.render())?;
        fs::rename(&temp_path, &self.registry_path)?;

        debug!(entries = registry.len(), "saved workspace registry");
        Ok(())
    }

    /// Load every registered workspace with its config hydrated
    ///
    /// A workspace whose config cannot be read still appears, carrying
    /// default field values.
    pub fn load_all(&self) -> Result<Vec<WorkspaceRecord>> {
        let registry = self.load_registry()?;
        Ok(registry.entries().iter().map(hydrate).collect())
    }

    /// Rewrite the registry from `records`, in slice order
    pub fn save_all(&self, records: &[WorkspaceRecord]) -> Result<()> {
        self.save_registry(&records.iter().collect())
    }

    /// Load a single workspace by name
    pub fn find(&self, name: &str) -> Result<Option<WorkspaceRecord>> {
        let registry = self.load_registry()?;
        Ok(registry.find(name).map(hydrate))
    }

    /// Load a single workspace by name, failing when it is unknown
    pub fn require(&self, name: &str) -> Result<WorkspaceRecord> {
        self.find(name)?
            .ok_or_else(|| BurrowError::not_found(format!("workspace '{}'", name)))
    }

    /// Register a workspace
    pub fn add(&self, record: &WorkspaceRecord) -> Result<()> {
        let mut registry = self.load_registry()?;
        registry.add(record.name.clone(), record.path.clone())?;
        self.save_registry(&registry)
    }

    /// Unregister a workspace
    pub fn remove(&self, name: &str) -> Result<Option<RegistryEntry>> {
        let mut registry = self.load_registry()?;
        let removed = registry.remove(name);
        if removed.is_some() {
            self.save_registry(&registry)?;
        }
        Ok(removed)
    }

    /// Initialize a new workspace directory structure
    pub fn init_workspace_dir(&self, workspace: &WorkspaceRecord) -> Result<()> {
        for dir in WORKSPACE_DIRS {
            fs::create_dir_all(workspace.path.join(dir))?;
        }
        Ok(())
    }
}

fn hydrate(entry: &RegistryEntry) -> WorkspaceRecord {
    let mut record = WorkspaceRecord::new(entry.name.clone(), entry.path.clone());
    if entry.path.as_os_str().is_empty() {
        warn!(workspace = %entry.name, "registry entry has no path");
        return record;
    }
    if let Err(e) = record.load_config() {
        warn!(workspace = %entry.name, error = %e, "failed to load workspace config, using defaults");
    }
    record
}

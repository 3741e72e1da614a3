//! Tool-level settings with environment variable expansion
//!
//! Loaded from `~/.config/burrow/config.toml`. Every field is optional; a
//! missing file yields the defaults.

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
});

/// Root settings structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Where workspaces without `--path` are created
    #[serde(default)]
    pub workspaces_dir: Option<PathBuf>,

    /// Author recorded when `--author` is not given
    #[serde(default)]
    pub default_author: Option<String>,

    /// Interactive session settings
    #[serde(default)]
    pub session: SessionSettings,
}

/// `[session]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Interpreter used when `SHELL` is unset
    #[serde(default)]
    pub shell: Option<PathBuf>,

    /// Path covered by the ephemeral tmpfs in isolated sessions
    #[serde(default = "default_tmp_path")]
    pub tmp_path: PathBuf,

    /// tmpfs `size=` option
    #[serde(default = "default_tmpfs_size")]
    pub tmpfs_size: String,

    /// Prompt template; `{name}` is replaced with the display name
    #[serde(default = "default_prompt_format")]
    pub prompt_format: String,
}

fn default_tmp_path() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_tmpfs_size() -> String {
    "256M".to_string()
}

fn default_prompt_format() -> String {
    "({name}) \\W $ ".to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            shell: None,
            tmp_path: default_tmp_path(),
            tmpfs_size: default_tmpfs_size(),
            prompt_format: default_prompt_format(),
        }
    }
}

impl Settings {
    /// Load settings from the user config directory
    ///
    /// Priority: environment overrides, then `config.toml`, then defaults.
    pub fn load(paths: &BurrowPaths) -> Result<Self> {
        let settings = if paths.settings_file.exists() {
            Self::load_from_file(&paths.settings_file)?
        } else {
            Self::default()
        };
        Ok(settings.apply_env_overrides())
    }

    /// Like [`load`](Self::load), but an unreadable file is logged and skipped
    pub fn load_or_default(paths: &BurrowPaths) -> Self {
        match Self::load(paths) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %paths.settings_file.display(), error = %e, "ignoring unreadable settings");
                Self::default().apply_env_overrides()
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings: Settings = toml::from_str(&content)?;
        settings.expand_env_vars();
        Ok(settings)
    }

    /// Directory new workspaces go into by default
    pub fn workspaces_dir(&self, paths: &BurrowPaths) -> PathBuf {
        self.workspaces_dir
            .clone()
            .unwrap_or_else(|| paths.workspaces_dir.clone())
    }

    /// Expand `${VAR}` patterns in string values
    fn expand_env_vars(&mut self) {
        if let Some(dir) = self.workspaces_dir.take() {
            self.workspaces_dir = Some(PathBuf::from(expand_string(&dir.to_string_lossy())));
        }
        if let Some(author) = self.default_author.take() {
            self.default_author = Some(expand_string(&author));
        }
        if let Some(shell) = self.session.shell.take() {
            self.session.shell = Some(PathBuf::from(expand_string(&shell.to_string_lossy())));
        }
        self.session.tmp_path = PathBuf::from(expand_string(&self.session.tmp_path.to_string_lossy()));
    }

    /// Apply environment variable overrides
    ///
    /// - BURROW_WORKSPACES_DIR -> workspaces_dir
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("BURROW_WORKSPACES_DIR") {
            if !dir.is_empty() {
                self.workspaces_dir = Some(PathBuf::from(dir));
            }
        }

        self
    }
}

/// Expand environment variables in a single string
///
/// Unknown variables are left as written.
pub fn expand_string(s: &str) -> String {
    ENV_VAR
        .replace_all(s, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
}

/// Filesystem locations used by burrow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurrowPaths {
    /// Per-user config root (`~/.config/burrow`)
    pub config_dir: PathBuf,

    /// Registry file (`~/.config/burrow/workspaces.conf`)
    pub registry_file: PathBuf,

    /// Settings file (`~/.config/burrow/config.toml`)
    pub settings_file: PathBuf,

    /// Default workspace storage (`~/.local/share/burrow/workspaces`)
    pub workspaces_dir: PathBuf,
}

impl BurrowPaths {
    /// Resolve locations from the user's home directory
    ///
    /// Falls back to `/tmp` when no home directory can be determined.
    pub fn from_home() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        Self::under(&home)
    }

    /// Resolve locations under an explicit home directory (for testing)
    pub fn under(home: &Path) -> Self {
        let config_dir = home.join(".config").join("burrow");
        Self {
            registry_file: config_dir.join("workspaces.conf"),
            settings_file: config_dir.join("config.toml"),
            workspaces_dir: home
                .join(".local")
                .join("share")
                .join("burrow")
                .join("workspaces"),
            config_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.session.tmp_path, PathBuf::from("/tmp"));
        assert_eq!(settings.session.tmpfs_size, "256M");
        assert!(settings.workspaces_dir.is_none());
    }

    #[test]
    fn test_expand_env_var() {
        std::env::set_var("BURROW_TEST_VAR", "test_value");
        let result = expand_string("prefix_${BURROW_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");
        std::env::remove_var("BURROW_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var() {
        let result = expand_string("${BURROW_NONEXISTENT_VAR}");
        assert_eq!(result, "${BURROW_NONEXISTENT_VAR}");
    }

    #[test]
    fn test_load_from_file_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_author = \"ada\"\n[session]\ntmpfs_size = \"64M\"\n").unwrap();

        let settings = Settings::load_from_file(&path).unwrap();
        assert_eq!(settings.default_author.as_deref(), Some("ada"));
        assert_eq!(settings.session.tmpfs_size, "64M");
        assert_eq!(settings.session.tmp_path, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "session = [").unwrap();

        let err = Settings::load_from_file(&path).unwrap_err();
        assert!(matches!(err, crate::error::BurrowError::Config(_)));
    }

    #[test]
    fn test_unreadable_settings_fall_back_to_defaults() {
        let home = TempDir::new().unwrap();
        let paths = BurrowPaths::under(home.path());
        std::fs::create_dir_all(&paths.config_dir).unwrap();
        std::fs::write(&paths.settings_file, "session = [").unwrap();

        assert!(Settings::load(&paths).is_err());
        let settings = Settings::load_or_default(&paths);
        assert_eq!(settings.session, SessionSettings::default());
        assert!(settings.default_author.is_none());
    }

    #[test]
    fn test_paths_under_home() {
        let paths = BurrowPaths::under(Path::new("/home/u"));
        assert_eq!(
            paths.registry_file,
            PathBuf::from("/home/u/.config/burrow/workspaces.conf")
        );
        assert_eq!(
            paths.workspaces_dir,
            PathBuf::from("/home/u/.local/share/burrow/workspaces")
        );
    }
}

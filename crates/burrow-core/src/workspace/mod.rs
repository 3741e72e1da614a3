//! Workspace management module
//!
//! A workspace is a named project directory with its own build/run/test
//! metadata and environment.
//!
//! # Architecture
//!
//! ```text
//! WorkspaceManager
//!     │
//!     ├── WorkspaceStorage (disk I/O)
//!     │   └── ~/.config/burrow/workspaces.conf (name → path registry)
//!     │
//!     ├── WorkspaceRecord
//!     │   └── <workspace>/.ws/config (per-workspace ConfigStore)
//!     │
//!     ├── templates (creation-time seed files)
//!     │
//!     └── ProcessRunner (build/run/test/clean, tar)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use burrow_core::workspace::{CreateOptions, Operation, WorkspaceManager};
//!
//! let manager = WorkspaceManager::new()?;
//!
//! let mut opts = CreateOptions::new("demo");
//! opts.lang = Some("go".into());
//! manager.create(opts)?;
//!
//! let status = manager.execute("demo", Operation::Build)?;
//! ```

mod manager;
mod storage;
mod templates;
mod types;

pub use manager::{detect_build, CreateOptions, Operation, WorkspaceManager, WorkspaceStatus};
pub use storage::{RegistryEntry, WorkspaceRegistry, WorkspaceStorage, WORKSPACE_DIRS};
pub use templates::{find_template, known_languages, LanguageTemplate};
pub use types::{validate_env_name, validate_name, validate_value, ConfigKey, WorkspaceRecord, WorkspaceView, DEFAULT_LANG, META_DIR};

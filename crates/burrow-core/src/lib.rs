//! Burrow Core - Backend library for burrow
//!
//! This crate provides the UI-agnostic backend functionality:
//! - Key/value config store backing each workspace (`.ws/config`)
//! - Workspace registry, records and language templates
//! - Process runner for delegated build/run/test/clean commands
//! - Session launcher with best-effort mount namespace isolation
//! - Tool settings loading
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐  operations   ┌──────────────────────┐
//! │   burrow CLI      │ ─────────────→│   WorkspaceManager   │
//! │                   │               │  registry + records  │
//! │                   │ ←─────────────│                      │
//! └───────────────────┘ records/codes └──────────┬───────────┘
//!                                                │ enter
//!                                     ┌──────────▼───────────┐
//!                                     │   SessionLauncher    │
//!                                     │ fork, unshare, exec  │
//!                                     └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use burrow_core::{CreateOptions, WorkspaceManager};
//!
//! let manager = WorkspaceManager::new()?;
//! manager.create(CreateOptions::new("demo"))?;
//!
//! let ws = manager.require("demo")?;
//! let code = manager.launcher().launch(&ws)?;
//! ```

pub mod config;
pub mod error;
pub mod runner;
pub mod session;
pub mod workspace;

// Re-export commonly used types
pub use error::{BurrowError, Result};

pub use config::{BurrowPaths, ConfigStore, SessionSettings, Settings};

pub use runner::{Invocation, ProcessRunner, Program, ShellRunner};

pub use session::{ExecutionContext, IsolationOutcome, SessionEvent, SessionLauncher};

pub use workspace::{
    ConfigKey, CreateOptions, Operation, WorkspaceManager, WorkspaceRecord, WorkspaceStatus,
    WorkspaceView,
};

//! Interactive sessions inside a workspace
//!
//! A session resolves an [`ExecutionContext`] from a workspace record, runs
//! the workspace's init commands, then replaces the process image with the
//! interpreter. Isolated workspaces fork first so the private mount
//! namespace lives and dies with the child.

mod context;
mod isolation;
mod launcher;

pub use context::{resolve_interpreter, workspace_env, ExecutionContext, FALLBACK_INTERPRETER};
pub use isolation::{BindMount, IsolationOutcome, IsolationPlan};
pub use launcher::SessionLauncher;

/// Progress notifications emitted while a session starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Private namespace and tmpfs are in place
    Isolated,

    /// Isolation failed; the session continues without it
    IsolationDegraded { reason: String },

    /// An init command exited non-zero; startup continues
    InitFailed { command: String, code: i32 },

    /// About to hand control to the interpreter
    Entering { workspace: String, interpreter: String },
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::Isolated => write!(f, "isolated mount namespace active"),
            SessionEvent::IsolationDegraded { reason } => {
                write!(f, "isolation unavailable ({}), continuing without it", reason)
            }
            SessionEvent::InitFailed { command, code } => {
                write!(f, "init command '{}' exited with {}", command, code)
            }
            SessionEvent::Entering {
                workspace,
                interpreter,
            } => write!(f, "entering {} with {}", workspace, interpreter),
        }
    }
}

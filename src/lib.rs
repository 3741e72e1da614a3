//! Burrow - named project workspaces with isolated shell sessions
//!
//! The CLI layer over `burrow-core`:
//! - `cli`: clap definition of the command surface
//! - `commands`: handlers composing the workspace manager and session launcher
//! - `ui`: styled status lines and reports

pub mod cli;
pub mod commands;
pub mod ui;

pub use cli::{Cli, Commands};

use burrow_core::WorkspaceManager;

/// Run a parsed command line and return the process exit status
pub fn run(cli: Cli) -> i32 {
    // Listing only needs the registry, so broken settings must not hide it
    let result = match cli.command {
        Commands::List { .. } | Commands::Status { name: None, .. } => {
            commands::dispatch(&WorkspaceManager::new_tolerant(), cli.command)
        }
        command => WorkspaceManager::new().and_then(|manager| commands::dispatch(&manager, command)),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            ui::error(e.to_string());
            if let Some(hint) = e.hint() {
                ui::info(format!("Set one with: {}", hint));
            }
            e.exit_code()
        }
    }
}

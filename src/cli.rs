//! Command-line definition

use burrow_core::workspace::{validate_env_name, validate_value};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "burrow", version)]
#[command(about = "Named project workspaces with durable config and isolated shell sessions", long_about = None)]
pub struct Cli {
    /// Log debug diagnostics to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create and register a new workspace
    Create {
        name: String,

        /// Workspace root (default: ~/.local/share/burrow/workspaces/<name>)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Language tag; c, cpp, rust, python, go and node get a template
        #[arg(long)]
        lang: Option<String>,

        /// Enter sessions in a private mount namespace
        #[arg(long)]
        isolated: bool,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// Build command, overriding the template's
        #[arg(long)]
        build: Option<String>,

        /// Run command, overriding the template's
        #[arg(long)]
        run: Option<String>,

        /// Session environment variable (repeatable)
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
    },

    /// List registered workspaces
    List {
        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Start a shell inside a workspace
    Enter { name: String },

    /// Delete a workspace and its files
    Delete {
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Run the build command (defaults to the active workspace)
    Build { name: Option<String> },

    /// Run the run command (defaults to the active workspace)
    Run { name: Option<String> },

    /// Run the test command (defaults to the active workspace)
    Test { name: Option<String> },

    /// Run the clean command (defaults to the active workspace)
    Clean { name: Option<String> },

    /// Show workspace details; lists all without a name or active session
    Status {
        name: Option<String>,

        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Get or set a workspace config key (display_name, build_cmd, env.KEY, ...)
    Config {
        name: String,
        key: String,
        value: Option<String>,
    },

    /// Copy a workspace under a new name
    Clone { src: String, dst: String },

    /// Archive a workspace with tar
    Export { name: String, archive: PathBuf },

    /// Create a workspace from an archive
    Import { archive: PathBuf, name: String },
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{}'", s));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("expected KEY=VALUE, got '{}'", s));
    }
    validate_env_name(key).map_err(|e| e.to_string())?;
    validate_value(key, value).map_err(|e| e.to_string())?;
    Ok((key.to_string(), value.to_string()))
}

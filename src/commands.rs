//! Command handlers
//!
//! Each handler returns the process exit status for its command; errors are
//! rendered by the caller.

use crate::cli::Commands;
use crate::ui;
use burrow_core::workspace::{find_template, known_languages, DEFAULT_LANG};
use burrow_core::{
    BurrowError, CreateOptions, Operation, Result, SessionEvent, WorkspaceManager, WorkspaceView,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Environment marker set inside every session
const ACTIVE_WORKSPACE_VAR: &str = "WS_NAME";

/// Execute one parsed command
pub fn dispatch(manager: &WorkspaceManager, command: Commands) -> Result<i32> {
    match command {
        Commands::Create {
            name,
            path,
            lang,
            isolated,
            description,
            author,
            build,
            run,
            env,
        } => create(
            manager,
            CreateOptions {
                name,
                path,
                lang,
                isolated,
                description,
                author,
                build,
                run,
                env,
            },
        ),
        Commands::List { json } => list(manager, json),
        Commands::Enter { name } => enter(manager, &name),
        Commands::Delete { name, force } => delete(manager, &name, force),
        Commands::Build { name } => execute(manager, name, Operation::Build),
        Commands::Run { name } => execute(manager, name, Operation::Run),
        Commands::Test { name } => execute(manager, name, Operation::Test),
        Commands::Clean { name } => execute(manager, name, Operation::Clean),
        Commands::Status { name, json } => status(manager, name.or_else(active_workspace), json),
        Commands::Config { name, key, value } => config(manager, &name, &key, value.as_deref()),
        Commands::Clone { src, dst } => clone(manager, &src, &dst),
        Commands::Export { name, archive } => export(manager, &name, &archive),
        Commands::Import { archive, name } => import(manager, &archive, &name),
    }
}

/// Workspace of the session we are running in, if any
fn active_workspace() -> Option<String> {
    std::env::var(ACTIVE_WORKSPACE_VAR)
        .ok()
        .filter(|name| !name.is_empty())
}

fn resolve_name(name: Option<String>) -> Result<String> {
    name.or_else(active_workspace).ok_or_else(|| {
        BurrowError::not_found("workspace name (none given and no active session)")
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(io::Error::from)?;
    println!("{}", rendered);
    Ok(())
}

fn create(manager: &WorkspaceManager, opts: CreateOptions) -> Result<i32> {
    let ws = manager.create(opts)?;
    ui::success(format!("Created workspace '{}' ({})", ws.name, ws.lang));
    if ws.lang != DEFAULT_LANG && find_template(&ws.lang).is_none() {
        let known: Vec<_> = known_languages().collect();
        ui::info(format!("No template for '{}' (templates: {})", ws.lang, known.join(", ")));
    }
    ui::info(format!("Path: {}", ws.path.display()));
    ui::info(format!("Enter it with: burrow enter {}", ws.name));
    Ok(0)
}

fn list(manager: &WorkspaceManager, json: bool) -> Result<i32> {
    let workspaces = manager.list()?;
    if json {
        let views: Vec<WorkspaceView> = workspaces.iter().map(WorkspaceView::from).collect();
        print_json(&views)?;
    } else {
        ui::print_list(&workspaces);
    }
    Ok(0)
}

fn report_session_event(event: &SessionEvent) {
    match event {
        SessionEvent::IsolationDegraded { .. } | SessionEvent::InitFailed { .. } => {
            ui::warn(event.to_string())
        }
        SessionEvent::Isolated => ui::info("Isolated: private /tmp, mounts do not leak"),
        SessionEvent::Entering { workspace, .. } => {
            ui::success(format!("Entering workspace: {}", workspace))
        }
    }
}

fn enter(manager: &WorkspaceManager, name: &str) -> Result<i32> {
    let ws = manager.require(name)?;
    let launcher = manager.launcher().with_reporter(&report_session_event);

    let code = launcher.launch(&ws)?;
    ui::info(format!("Left workspace '{}' (exit {})", ws.name, code));
    Ok(code)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}

fn delete(manager: &WorkspaceManager, name: &str, force: bool) -> Result<i32> {
    let Some(ws) = manager.find(name)? else {
        return Err(BurrowError::not_found(format!("workspace '{}'", name)));
    };

    let prompt = format!(
        "Delete workspace '{}' and everything under {}?",
        name,
        ws.path.display()
    );
    if !force && !confirm(&prompt)? {
        ui::info("Cancelled");
        return Ok(0);
    }

    manager.delete(name)?;
    ui::success(format!("Deleted workspace '{}'", name));
    Ok(0)
}

fn execute(manager: &WorkspaceManager, name: Option<String>, op: Operation) -> Result<i32> {
    let name = resolve_name(name)?;
    ui::header(format!("{}: {}", op.name(), name));

    let code = manager.execute(&name, op)?;
    if code == 0 {
        ui::success(format!("{} finished", op.name()));
    } else {
        ui::error(format!("{} failed (exit {})", op.name(), code));
    }
    Ok(code)
}

fn status(manager: &WorkspaceManager, name: Option<String>, json: bool) -> Result<i32> {
    let Some(name) = name else {
        return list(manager, json);
    };

    let status = manager.status(&name)?;
    if json {
        print_json(&status)?;
    } else {
        ui::print_status(&status);
    }
    Ok(0)
}

fn config(manager: &WorkspaceManager, name: &str, key: &str, value: Option<&str>) -> Result<i32> {
    match value {
        Some(value) => {
            manager.config_set(name, key, value)?;
            ui::success(format!("{}.{} = {}", name, key, value));
        }
        None => println!("{}", manager.config_get(name, key)?),
    }
    Ok(0)
}

fn clone(manager: &WorkspaceManager, src: &str, dst: &str) -> Result<i32> {
    let ws = manager.clone_workspace(src, dst)?;
    ui::success(format!("Cloned '{}' to '{}'", src, dst));
    ui::info(format!("Path: {}", ws.path.display()));
    Ok(0)
}

fn export(manager: &WorkspaceManager, name: &str, archive: &Path) -> Result<i32> {
    manager.export(name, archive)?;
    ui::success(format!("Exported '{}' to {}", name, archive.display()));
    Ok(0)
}

fn import(manager: &WorkspaceManager, archive: &Path, name: &str) -> Result<i32> {
    let ws = manager.import(archive, name)?;
    ui::success(format!("Imported '{}' from {}", name, archive.display()));
    ui::info(format!("Path: {}", ws.path.display()));
    Ok(0)
}

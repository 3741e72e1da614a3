//! Execution context handed to a session's interpreter
//!
//! The context is built once per session and never mutates the calling
//! process: cwd and environment are applied to the interpreter's `Command`
//! at hand-off.

use crate::config::SessionSettings;
use crate::error::{BurrowError, Result};
use crate::runner::{Invocation, Program};
use crate::workspace::WorkspaceRecord;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Interpreter used when neither `SHELL` nor settings name one
pub const FALLBACK_INTERPRETER: &str = "/bin/sh";

/// Resolved (interpreter, cwd, environment, prompt) for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub interpreter: PathBuf,
    pub cwd: PathBuf,
    /// Added on top of the inherited environment
    pub env: BTreeMap<String, String>,
    pub prompt: String,
    pub init_cmds: Vec<String>,
}

impl ExecutionContext {
    /// Build the context for entering `ws`
    pub fn for_session(
        ws: &WorkspaceRecord,
        interpreter: PathBuf,
        settings: &SessionSettings,
    ) -> Self {
        let prompt = settings.prompt_format.replace("{name}", &ws.display_name);

        let mut env = BTreeMap::new();
        env.insert("WS_NAME".to_string(), ws.name.clone());
        env.insert("WS_PATH".to_string(), ws.path.display().to_string());
        env.insert("WS_LANG".to_string(), ws.lang.clone());
        if ws.isolated {
            env.insert("WS_ISOLATED".to_string(), "1".to_string());
        }
        env.extend(ws.env_vars.clone());
        env.insert("PS1".to_string(), prompt.clone());

        Self {
            interpreter,
            cwd: ws.path.clone(),
            env,
            prompt,
            init_cmds: ws.init_cmds.clone(),
        }
    }

    /// Init commands as runner invocations, in order
    pub fn init_invocations(&self) -> impl Iterator<Item = Invocation> + '_ {
        self.init_cmds.iter().map(|cmd| {
            Invocation::new(Program::Shell(cmd.clone()), &self.cwd).with_env(self.env.clone())
        })
    }

    /// `Command` that starts the interpreter inside this context
    pub fn interpreter_command(&self) -> Command {
        let mut command = Command::new(&self.interpreter);
        command.current_dir(&self.cwd).envs(&self.env);
        command
    }
}

/// Environment shared by delegated build/run/test/clean commands
pub fn workspace_env(ws: &WorkspaceRecord) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert("WS_NAME".to_string(), ws.name.clone());
    env.insert("WS_PATH".to_string(), ws.path.display().to_string());
    env.insert("WS_LANG".to_string(), ws.lang.clone());
    env.extend(ws.env_vars.clone());
    env
}

/// Pick the session interpreter
///
/// `shell` is the user's `SHELL`; when unset or empty the settings value is
/// used, then [`FALLBACK_INTERPRETER`].
pub fn resolve_interpreter(shell: Option<OsString>, settings: &SessionSettings) -> PathBuf {
    shell
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| settings.shell.clone())
        .unwrap_or_else(|| PathBuf::from(FALLBACK_INTERPRETER))
}

/// Find the file `exec` would run for `interpreter`
///
/// Bare names are searched on `PATH`; anything with a directory part is
/// checked as written.
#[cfg(unix)]
pub fn locate_interpreter(interpreter: &Path) -> Result<PathBuf> {
    let not_runnable = |source: io::Error| BurrowError::Interpreter {
        path: interpreter.to_path_buf(),
        source,
    };

    if interpreter.components().count() > 1 {
        return check_executable(interpreter)
            .map(|()| interpreter.to_path_buf())
            .map_err(not_runnable);
    }

    std::env::var_os("PATH")
        .and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join(interpreter))
                .find(|candidate| check_executable(candidate).is_ok())
        })
        .ok_or_else(|| not_runnable(io::Error::new(io::ErrorKind::NotFound, "not found on PATH")))
}

#[cfg(not(unix))]
pub fn locate_interpreter(interpreter: &Path) -> Result<PathBuf> {
    Ok(interpreter.to_path_buf())
}

#[cfg(unix)]
fn check_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = path.metadata()?;
    if !metadata.is_file() || metadata.permissions().mode() & 0o111 == 0 {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "not an executable file",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> WorkspaceRecord {
        let mut ws = WorkspaceRecord::new("demo", "/w/demo");
        ws.display_name = "Demo".into();
        ws.lang = "go".into();
        ws.env_vars.insert("GOFLAGS".into(), "-mod=vendor".into());
        ws.init_cmds = vec!["echo hi".into(), "false".into()];
        ws
    }

    #[test]
    fn test_context_environment() {
        let ctx = ExecutionContext::for_session(
            &record(),
            PathBuf::from("/bin/bash"),
            &SessionSettings::default(),
        );

        assert_eq!(ctx.cwd, PathBuf::from("/w/demo"));
        assert_eq!(ctx.prompt, "(Demo) \\W $ ");
        assert_eq!(ctx.env["WS_NAME"], "demo");
        assert_eq!(ctx.env["WS_PATH"], "/w/demo");
        assert_eq!(ctx.env["WS_LANG"], "go");
        assert_eq!(ctx.env["GOFLAGS"], "-mod=vendor");
        assert_eq!(ctx.env["PS1"], ctx.prompt);
        assert!(!ctx.env.contains_key("WS_ISOLATED"));
    }

    #[test]
    fn test_isolated_marker() {
        let mut ws = record();
        ws.isolated = true;
        let ctx = ExecutionContext::for_session(&ws, PathBuf::from("/bin/sh"), &SessionSettings::default());
        assert_eq!(ctx.env["WS_ISOLATED"], "1");
    }

    #[test]
    fn test_init_invocations_keep_order_and_context() {
        let ctx = ExecutionContext::for_session(&record(), PathBuf::from("/bin/sh"), &SessionSettings::default());
        let invocations: Vec<_> = ctx.init_invocations().collect();

        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].program, Program::Shell("echo hi".into()));
        assert_eq!(invocations[1].program, Program::Shell("false".into()));
        assert_eq!(invocations[0].cwd, ctx.cwd);
        assert_eq!(invocations[0].env, ctx.env);
    }

    #[test]
    fn test_resolve_interpreter() {
        let mut settings = SessionSettings::default();
        assert_eq!(
            resolve_interpreter(Some("/bin/zsh".into()), &settings),
            PathBuf::from("/bin/zsh")
        );
        assert_eq!(
            resolve_interpreter(Some("".into()), &settings),
            PathBuf::from(FALLBACK_INTERPRETER)
        );

        settings.shell = Some(PathBuf::from("/usr/bin/fish"));
        assert_eq!(
            resolve_interpreter(None, &settings),
            PathBuf::from("/usr/bin/fish")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_interpreter() {
        use std::os::unix::fs::PermissionsExt;

        let found = locate_interpreter(Path::new("sh")).unwrap();
        assert!(found.is_absolute());
        assert!(found.ends_with("sh"));

        let err = locate_interpreter(Path::new("/nonexistent/shell")).unwrap_err();
        assert!(matches!(err, BurrowError::Interpreter { .. }));
        assert!(locate_interpreter(Path::new("burrow-no-such-shell")).is_err());

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("shell");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(locate_interpreter(&script).is_err());
        assert!(locate_interpreter(dir.path()).is_err());

        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(locate_interpreter(&script).unwrap(), script);
    }
}

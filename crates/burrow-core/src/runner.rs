//! External process runner
//!
//! Build/run/test/clean commands, init hooks and the archiver all go through
//! [`ProcessRunner`]. The runner only reports an exit status; output goes
//! straight to the inherited terminal and is never parsed.

use crate::error::Result;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use tracing::{debug, warn};

/// Exit status reported when a program cannot be found, as a shell would
pub const NOT_FOUND_STATUS: i32 = 127;

/// Something to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// Opaque command line handed to `sh -c`
    Shell(String),

    /// Program and arguments, no shell involved
    Exec { program: String, args: Vec<String> },
}

impl Program {
    /// Program with arguments
    pub fn exec<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Program::Exec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Short name used in errors and logs
    pub fn name(&self) -> &str {
        match self {
            Program::Shell(_) => "sh",
            Program::Exec { program, .. } => program,
        }
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Program::Shell(cmd) => f.write_str(cmd),
            Program::Exec { program, args } => {
                f.write_str(program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// A program plus the context it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: Program,
    pub cwd: PathBuf,
    /// Added on top of the inherited environment
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Invocation with no extra environment
    pub fn new(program: Program, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program,
            cwd: cwd.into(),
            env: BTreeMap::new(),
        }
    }

    /// Replace the extra environment
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

/// Runs external programs to completion
pub trait ProcessRunner {
    /// Run `invocation` and return its exit status
    fn run(&self, invocation: &Invocation) -> Result<i32>;
}

/// Runs programs as child processes sharing the caller's terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32> {
        let mut command = match &invocation.program {
            Program::Shell(line) => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(line);
                c
            }
            Program::Exec { program, args } => {
                let mut c = Command::new(program);
                c.args(args);
                c
            }
        };
        command.current_dir(&invocation.cwd).envs(&invocation.env);

        debug!(program = %invocation.program, cwd = %invocation.cwd.display(), "running");
        match command.status() {
            Ok(status) => Ok(exit_code(status)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(program = invocation.program.name(), "program not found");
                Ok(NOT_FOUND_STATUS)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Collapse an exit status to a single code; signals map to 128 + signo
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

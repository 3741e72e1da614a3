//! Session lifecycle: init hooks, optional fork + isolation, interpreter hand-off

use super::context::{locate_interpreter, resolve_interpreter, ExecutionContext};
use super::isolation::{IsolationOutcome, IsolationPlan};
use super::SessionEvent;
use crate::config::SessionSettings;
use crate::error::{BurrowError, Result};
use crate::runner::ProcessRunner;
use crate::workspace::WorkspaceRecord;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Starts sessions for workspace records
pub struct SessionLauncher<'a> {
    runner: &'a dyn ProcessRunner,
    settings: &'a SessionSettings,
    interpreter: PathBuf,
    reporter: &'a dyn Fn(&SessionEvent),
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::IsolationDegraded { .. } | SessionEvent::InitFailed { .. } => {
            warn!("{}", event)
        }
        _ => info!("{}", event),
    }
}

impl<'a> SessionLauncher<'a> {
    /// Launcher using the user's `SHELL` (or the configured fallback)
    pub fn new(runner: &'a dyn ProcessRunner, settings: &'a SessionSettings) -> Self {
        Self {
            runner,
            settings,
            interpreter: resolve_interpreter(std::env::var_os("SHELL"), settings),
            reporter: &log_event,
        }
    }

    /// Use a specific interpreter instead of the resolved one
    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Route session events to `reporter` instead of the log
    pub fn with_reporter(mut self, reporter: &'a dyn Fn(&SessionEvent)) -> Self {
        self.reporter = reporter;
        self
    }

    /// Execution context `ws` would be entered with
    pub fn context(&self, ws: &WorkspaceRecord) -> ExecutionContext {
        ExecutionContext::for_session(ws, self.interpreter.clone(), self.settings)
    }

    /// Enter `ws` and return the session's exit status
    ///
    /// Unisolated sessions replace the current process, so this only returns
    /// on failure. Isolated sessions return once the forked child exits. A
    /// missing or non-executable interpreter fails before anything runs.
    pub fn launch(&self, ws: &WorkspaceRecord) -> Result<i32> {
        let interpreter = locate_interpreter(&self.interpreter)?;
        let ctx = ExecutionContext::for_session(ws, interpreter, self.settings);
        debug!(workspace = %ws.name, interpreter = %ctx.interpreter.display(), isolated = ws.isolated, "launching session");

        if ws.isolated {
            let plan = IsolationPlan::for_workspace(ws, self.settings);
            self.launch_isolated(ws, &ctx, &plan)
        } else {
            self.hand_off(ws, &ctx)
        }
    }

    #[cfg(unix)]
    fn launch_isolated(
        &self,
        ws: &WorkspaceRecord,
        ctx: &ExecutionContext,
        plan: &IsolationPlan,
    ) -> Result<i32> {
        use nix::unistd::{fork, ForkResult};

        // SAFETY: the CLI is single-threaded here; the child only sets up
        // mounts, spawns init commands and execs or exits.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = %child, "waiting for isolated session");
                ignore_interactive_signals();
                wait_for(child)
            }
            Ok(ForkResult::Child) => {
                self.report_isolation(plan.apply());
                if let Err(e) = self.hand_off(ws, ctx) {
                    error!(workspace = %ws.name, error = %e, "session hand-off failed");
                }
                std::process::exit(1)
            }
            Err(e) => Err(BurrowError::Fork(e.to_string())),
        }
    }

    #[cfg(not(unix))]
    fn launch_isolated(
        &self,
        ws: &WorkspaceRecord,
        ctx: &ExecutionContext,
        plan: &IsolationPlan,
    ) -> Result<i32> {
        self.report_isolation(plan.apply());
        self.hand_off(ws, ctx)
    }

    fn report_isolation(&self, outcome: IsolationOutcome) {
        match outcome {
            IsolationOutcome::Isolated => (self.reporter)(&SessionEvent::Isolated),
            IsolationOutcome::Degraded { reason } => {
                (self.reporter)(&SessionEvent::IsolationDegraded { reason })
            }
        }
    }

    /// Run init commands in order; failures are reported, never fatal
    pub(crate) fn run_init(&self, ctx: &ExecutionContext) {
        for invocation in ctx.init_invocations() {
            match self.runner.run(&invocation) {
                Ok(0) => {}
                Ok(code) => (self.reporter)(&SessionEvent::InitFailed {
                    command: invocation.program.to_string(),
                    code,
                }),
                Err(e) => {
                    warn!(command = %invocation.program, error = %e, "init command could not run");
                    (self.reporter)(&SessionEvent::InitFailed {
                        command: invocation.program.to_string(),
                        code: -1,
                    })
                }
            }
        }
    }

    #[cfg(unix)]
    fn hand_off(&self, ws: &WorkspaceRecord, ctx: &ExecutionContext) -> Result<i32> {
        use std::os::unix::process::CommandExt;

        self.run_init(ctx);
        (self.reporter)(&SessionEvent::Entering {
            workspace: ws.display_name.clone(),
            interpreter: ctx.interpreter.display().to_string(),
        });

        let source = ctx.interpreter_command().exec();
        Err(BurrowError::Interpreter {
            path: ctx.interpreter.clone(),
            source,
        })
    }

    #[cfg(not(unix))]
    fn hand_off(&self, ws: &WorkspaceRecord, ctx: &ExecutionContext) -> Result<i32> {
        self.run_init(ctx);
        (self.reporter)(&SessionEvent::Entering {
            workspace: ws.display_name.clone(),
            interpreter: ctx.interpreter.display().to_string(),
        });

        ctx.interpreter_command()
            .status()
            .map(crate::runner::exit_code)
            .map_err(|source| BurrowError::Interpreter {
                path: ctx.interpreter.clone(),
                source,
            })
    }
}

/// Keyboard interrupts belong to the session; the waiting parent ignores them
#[cfg(unix)]
fn ignore_interactive_signals() {
    use nix::sys::signal::{signal, SigHandler, Signal};

    for sig in [Signal::SIGINT, Signal::SIGQUIT] {
        // SAFETY: SigIgn installs no handler code
        if let Err(e) = unsafe { signal(sig, SigHandler::SigIgn) } {
            debug!(signal = %sig, error = %e, "could not ignore signal");
        }
    }
}

#[cfg(unix)]
fn wait_for(child: nix::unistd::Pid) -> Result<i32> {
    use nix::errno::Errno;
    use nix::sys::wait::waitpid;

    loop {
        match waitpid(child, None) {
            Ok(status) => {
                if let Some(code) = session_status(status) {
                    return Ok(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(BurrowError::Fork(format!("waiting for session: {}", e))),
        }
    }
}

/// Exit code for a terminal wait status, `None` while the child is still alive
#[cfg(unix)]
fn session_status(status: nix::sys::wait::WaitStatus) -> Option<i32> {
    use nix::sys::wait::WaitStatus;

    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(128 + signal as i32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{Invocation, Program};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Records invocations and fails every command containing "fail"
    #[derive(Default)]
    struct RecordingRunner {
        seen: RefCell<Vec<Invocation>>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> Result<i32> {
            self.seen.borrow_mut().push(invocation.clone());
            Ok(if invocation.program.to_string().contains("fail") {
                2
            } else {
                0
            })
        }
    }

    #[test]
    fn test_context_uses_override_interpreter() {
        let runner = RecordingRunner::default();
        let settings = SessionSettings::default();
        let launcher = SessionLauncher::new(&runner, &settings).with_interpreter("/opt/bin/shell");

        let ws = WorkspaceRecord::new("demo", "/w/demo");
        let ctx = launcher.context(&ws);
        assert_eq!(ctx.interpreter, PathBuf::from("/opt/bin/shell"));
        assert_eq!(ctx.cwd, PathBuf::from("/w/demo"));
        assert_eq!(ctx.prompt, "(demo) \\W $ ");
    }

    #[test]
    fn test_init_failures_are_reported_not_fatal() {
        let runner = RecordingRunner::default();
        let settings = SessionSettings::default();
        let events = RefCell::new(Vec::new());
        let reporter = |e: &SessionEvent| events.borrow_mut().push(e.clone());
        let launcher = SessionLauncher::new(&runner, &settings).with_reporter(&reporter);

        let mut ws = WorkspaceRecord::new("demo", "/w/demo");
        ws.init_cmds = vec!["make fail".into(), "echo ok".into()];
        launcher.run_init(&launcher.context(&ws));

        let seen = runner.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].program, Program::Shell("echo ok".into()));
        assert_eq!(seen[1].env["WS_NAME"], "demo");

        assert_eq!(
            *events.borrow(),
            vec![SessionEvent::InitFailed {
                command: "make fail".into(),
                code: 2
            }]
        );
    }

    #[test]
    fn test_missing_interpreter_fails_before_session_starts() {
        let runner = RecordingRunner::default();
        let settings = SessionSettings::default();
        let events = RefCell::new(Vec::new());
        let reporter = |e: &SessionEvent| events.borrow_mut().push(e.clone());
        let launcher = SessionLauncher::new(&runner, &settings)
            .with_interpreter("/nonexistent/shell")
            .with_reporter(&reporter);

        let mut ws = WorkspaceRecord::new("box", "/w/box");
        ws.isolated = true;
        ws.init_cmds = vec!["echo hi".into()];

        let err = launcher.launch(&ws).unwrap_err();
        assert!(matches!(
            err,
            BurrowError::Interpreter { ref path, .. } if path == &PathBuf::from("/nonexistent/shell")
        ));
        assert_eq!(err.exit_code(), 1);
        assert!(runner.seen.borrow().is_empty());
        assert!(events.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_session_status_mapping() {
        use nix::sys::signal::Signal;
        use nix::sys::wait::WaitStatus;
        use nix::unistd::Pid;

        let pid = Pid::from_raw(42);
        assert_eq!(session_status(WaitStatus::Exited(pid, 7)), Some(7));
        assert_eq!(
            session_status(WaitStatus::Signaled(pid, Signal::SIGKILL, false)),
            Some(137)
        );
        assert_eq!(session_status(WaitStatus::StillAlive), None);
    }
}

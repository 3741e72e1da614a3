//! WorkspaceManager - Central coordinator for workspace lifecycle
//!
//! Composes the registry, per-workspace config and the process runner into
//! the operations the CLI exposes.

use super::storage::{WorkspaceStorage, WORKSPACE_DIRS};
use super::templates::find_template;
use super::types::{now_epoch, validate_name, validate_value, ConfigKey, WorkspaceRecord};
use crate::config::{BurrowPaths, Settings};
use crate::error::{BurrowError, Result};
use crate::runner::{Invocation, ProcessRunner, Program, ShellRunner};
use crate::session::{workspace_env, SessionLauncher};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Build descriptors probed when no `build_cmd` is configured, in order
const BUILD_DESCRIPTORS: &[(&str, &str)] = &[
    ("Makefile", "make"),
    (
        "CMakeLists.txt",
        "mkdir -p build && cd build && cmake .. && make",
    ),
    ("Cargo.toml", "cargo build"),
    ("package.json", "npm run build"),
    ("setup.py", "pip install -e ."),
];

/// Inputs to [`WorkspaceManager::create`]
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub name: String,
    /// Defaults to `<workspaces_dir>/<name>`
    pub path: Option<PathBuf>,
    pub lang: Option<String>,
    pub isolated: bool,
    pub description: Option<String>,
    pub author: Option<String>,
    /// Overrides the template's build command
    pub build: Option<String>,
    /// Overrides the template's run command
    pub run: Option<String>,
    pub env: Vec<(String, String)>,
}

impl CreateOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Snapshot reported by `status`
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceStatus {
    #[serde(flatten)]
    pub record: WorkspaceRecord,
    pub files: u64,
    pub bytes: u64,
}

/// Delegated operations with a configurable command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Build,
    Run,
    Test,
    Clean,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Build => "build",
            Operation::Run => "run",
            Operation::Test => "test",
            Operation::Clean => "clean",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Operation::Build => "build_cmd",
            Operation::Run => "run_cmd",
            Operation::Test => "test_cmd",
            Operation::Clean => "clean_cmd",
        }
    }

    fn configured(self, ws: &WorkspaceRecord) -> &str {
        match self {
            Operation::Build => &ws.build_cmd,
            Operation::Run => &ws.run_cmd,
            Operation::Test => &ws.test_cmd,
            Operation::Clean => &ws.clean_cmd,
        }
    }
}

/// Manages registered workspaces
pub struct WorkspaceManager {
    /// Registry backend
    storage: WorkspaceStorage,

    /// Resolved filesystem locations
    paths: BurrowPaths,

    /// Tool settings
    settings: Settings,

    /// Runs delegated commands and init hooks
    runner: Box<dyn ProcessRunner>,
}

impl WorkspaceManager {
    /// Create a manager for the current user
    pub fn new() -> Result<Self> {
        let paths = BurrowPaths::from_home();
        let settings = Settings::load(&paths)?;
        Ok(Self::with_parts(paths, settings, Box::new(ShellRunner)))
    }

    /// Like [`new`](Self::new), but unreadable settings fall back to defaults
    pub fn new_tolerant() -> Self {
        let paths = BurrowPaths::from_home();
        let settings = Settings::load_or_default(&paths);
        Self::with_parts(paths, settings, Box::new(ShellRunner))
    }

    /// Create with explicit locations, settings and runner (for testing)
    pub fn with_parts(
        paths: BurrowPaths,
        settings: Settings,
        runner: Box<dyn ProcessRunner>,
    ) -> Self {
        Self {
            storage: WorkspaceStorage::new(&paths),
            paths,
            settings,
            runner,
        }
    }

    /// Directory new workspaces are created in
    pub fn workspaces_dir(&self) -> PathBuf {
        self.settings.workspaces_dir(&self.paths)
    }

    // ========== Registry ==========

    /// Every registered workspace in registry order
    pub fn list(&self) -> Result<Vec<WorkspaceRecord>> {
        self.storage.load_all()
    }

    /// Look up a workspace without checking its path
    pub fn find(&self, name: &str) -> Result<Option<WorkspaceRecord>> {
        self.storage.find(name)
    }

    /// Look up a workspace whose root exists on disk
    pub fn require(&self, name: &str) -> Result<WorkspaceRecord> {
        let ws = self.storage.require(name)?;
        if !ws.exists() {
            return Err(BurrowError::not_found(format!(
                "workspace path {} for '{}'",
                ws.path.display(),
                name
            )));
        }
        Ok(ws)
    }

    /// Create, seed and register a new workspace
    pub fn create(&self, opts: CreateOptions) -> Result<WorkspaceRecord> {
        validate_name(&opts.name)?;
        if self.storage.load_registry()?.contains(&opts.name) {
            return Err(BurrowError::already_exists(format!(
                "workspace '{}'",
                opts.name
            )));
        }

        let path = match opts.path {
            Some(p) => absolute(p)?,
            None => self.workspaces_dir().join(&opts.name),
        };

        let mut ws = WorkspaceRecord::new(opts.name.clone(), path);
        if let Some(lang) = opts.lang.filter(|l| !l.is_empty()) {
            ws.lang = lang;
        }
        ws.isolated = opts.isolated;
        ws.description = opts.description.unwrap_or_default();
        ws.author = opts
            .author
            .or_else(|| self.settings.default_author.clone())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_default();
        ws.created = now_epoch();
        ws.env_vars.extend(opts.env);
        if let Some(build) = &opts.build {
            validate_value("build_cmd", build)?;
        }
        if let Some(run) = &opts.run {
            validate_value("run_cmd", run)?;
        }
        ws.validate()?;

        self.storage.init_workspace_dir(&ws)?;

        if let Some(template) = find_template(&ws.lang) {
            debug!(lang = template.lang, "applying language template");
            template.write_files(&ws.path, &ws.name)?;
            ws.build_cmd = template.build_cmd.to_string();
            ws.run_cmd = template.run_cmd.to_string();
            ws.clean_cmd = template.clean_cmd.to_string();
            ws.test_cmd = template.test_cmd.to_string();
        }
        if let Some(build) = opts.build {
            ws.build_cmd = build;
        }
        if let Some(run) = opts.run {
            ws.run_cmd = run;
        }

        ws.save_config()?;
        self.storage.add(&ws)?;

        info!(workspace = %ws.name, path = %ws.path.display(), "workspace created");
        Ok(ws)
    }

    /// Remove a workspace's tree and its registry entry
    ///
    /// A workspace whose root is already gone is still unregistered.
    pub fn delete(&self, name: &str) -> Result<WorkspaceRecord> {
        let ws = self.storage.require(name)?;

        if ws.exists() {
            fs::remove_dir_all(&ws.path)?;
        } else {
            warn!(workspace = %name, path = %ws.path.display(), "workspace root already missing");
        }
        self.storage.remove(name)?;

        info!(workspace = %name, "workspace deleted");
        Ok(ws)
    }

    // ========== Delegated commands ==========

    /// Run the configured command for `op` and return its exit status
    ///
    /// Fails with an unconfigured-operation error, without touching the
    /// tree, when nothing is configured or detectable.
    pub fn execute(&self, name: &str, op: Operation) -> Result<i32> {
        let ws = self.require(name)?;

        let configured = op.configured(&ws);
        let command = if !configured.is_empty() {
            configured.to_string()
        } else {
            match op {
                Operation::Build => detect_build(&ws.path)
                    .ok_or_else(|| BurrowError::unconfigured(op.name(), name, op.key()))?
                    .to_string(),
                Operation::Clean => return self.reset_build_dir(&ws),
                _ => return Err(BurrowError::unconfigured(op.name(), name, op.key())),
            }
        };

        let invocation =
            Invocation::new(Program::Shell(command), &ws.path).with_env(workspace_env(&ws));
        let code = self.runner.run(&invocation)?;
        debug!(workspace = %name, operation = op.name(), code, "delegated command finished");
        Ok(code)
    }

    fn reset_build_dir(&self, ws: &WorkspaceRecord) -> Result<i32> {
        let build = ws.path.join("build");
        if !build.is_dir() {
            return Err(BurrowError::unconfigured(
                Operation::Clean.name(),
                &ws.name,
                Operation::Clean.key(),
            ));
        }

        fs::remove_dir_all(&build)?;
        fs::create_dir_all(&build)?;
        debug!(workspace = %ws.name, "build directory reset");
        Ok(0)
    }

    // ========== Inspection and config ==========

    /// Record plus tree statistics
    pub fn status(&self, name: &str) -> Result<WorkspaceStatus> {
        let record = self.require(name)?;
        let (files, bytes) = tree_stats(&record.path);
        Ok(WorkspaceStatus {
            record,
            files,
            bytes,
        })
    }

    /// Read a `config` key
    pub fn config_get(&self, name: &str, key: &str) -> Result<String> {
        let key: ConfigKey = key.parse()?;
        self.require(name)?.get_field(&key)
    }

    /// Set a `config` key and persist the workspace config
    pub fn config_set(&self, name: &str, key: &str, value: &str) -> Result<WorkspaceRecord> {
        let key: ConfigKey = key.parse()?;
        let mut ws = self.require(name)?;
        ws.set_field(&key, value)?;
        ws.save_config()?;
        debug!(workspace = %name, key = %key, "config updated");
        Ok(ws)
    }

    // ========== Derived workspaces ==========

    /// Copy `src` into a new workspace `dst`
    pub fn clone_workspace(&self, src: &str, dst: &str) -> Result<WorkspaceRecord> {
        validate_name(dst)?;
        let source = self.require(src)?;
        if self.storage.load_registry()?.contains(dst) {
            return Err(BurrowError::already_exists(format!("workspace '{}'", dst)));
        }

        let target = self.workspaces_dir().join(dst);
        if target.exists() {
            return Err(BurrowError::already_exists(format!(
                "path {}",
                target.display()
            )));
        }

        copy_tree(&source.path, &target)?;

        let mut ws = source.clone();
        ws.name = dst.to_string();
        ws.display_name = dst.to_string();
        ws.path = target;
        ws.created = now_epoch();
        ws.save_config()?;
        self.storage.add(&ws)?;

        info!(source = %src, workspace = %dst, "workspace cloned");
        Ok(ws)
    }

    /// Archive a workspace tree with `tar`
    pub fn export(&self, name: &str, archive: &Path) -> Result<()> {
        let ws = self.require(name)?;
        let archive = absolute(archive.to_path_buf())?;

        let parent = ws.path.parent().unwrap_or_else(|| Path::new("/"));
        let base = ws
            .path
            .file_name()
            .map(|b| b.to_string_lossy().into_owned())
            .ok_or_else(|| {
                BurrowError::config(format!("cannot archive {}", ws.path.display()))
            })?;

        let program = Program::exec(
            "tar",
            [
                "czf".to_string(),
                archive.display().to_string(),
                "-C".to_string(),
                parent.display().to_string(),
                base,
            ],
        );
        self.delegate(Invocation::new(program, parent))?;

        info!(workspace = %name, archive = %archive.display(), "workspace exported");
        Ok(())
    }

    /// Extract an archive into a new workspace `name`
    ///
    /// A failed extraction leaves nothing behind.
    pub fn import(&self, archive: &Path, name: &str) -> Result<WorkspaceRecord> {
        validate_name(name)?;
        if self.storage.load_registry()?.contains(name) {
            return Err(BurrowError::already_exists(format!("workspace '{}'", name)));
        }
        let archive = absolute(archive.to_path_buf())?;
        if !archive.is_file() {
            return Err(BurrowError::not_found(format!(
                "archive {}",
                archive.display()
            )));
        }

        let target = self.workspaces_dir().join(name);
        if target.exists() {
            return Err(BurrowError::already_exists(format!(
                "path {}",
                target.display()
            )));
        }
        fs::create_dir_all(&target)?;

        let program = Program::exec(
            "tar",
            [
                "xzf".to_string(),
                archive.display().to_string(),
                "-C".to_string(),
                target.display().to_string(),
                "--strip-components=1".to_string(),
            ],
        );
        if let Err(e) = self.delegate(Invocation::new(program, &target)) {
            if let Err(cleanup) = fs::remove_dir_all(&target) {
                warn!(path = %target.display(), error = %cleanup, "failed to remove partial import");
            }
            return Err(e);
        }

        let mut ws = WorkspaceRecord::new(name, target);
        ws.load_config()?;
        self.storage.init_workspace_dir(&ws)?;
        ws.save_config()?;
        self.storage.add(&ws)?;

        info!(workspace = %name, archive = %archive.display(), "workspace imported");
        Ok(ws)
    }

    // ========== Sessions ==========

    /// Session launcher sharing this manager's runner and settings
    pub fn launcher(&self) -> SessionLauncher<'_> {
        SessionLauncher::new(self.runner.as_ref(), &self.settings.session)
    }

    /// Run an invocation, mapping a non-zero status to a delegate error
    fn delegate(&self, invocation: Invocation) -> Result<()> {
        match self.runner.run(&invocation)? {
            0 => Ok(()),
            code => Err(BurrowError::Delegate {
                program: invocation.program.name().to_string(),
                code,
            }),
        }
    }
}

/// First build command whose descriptor exists under `root`
pub fn detect_build(root: &Path) -> Option<&'static str> {
    BUILD_DESCRIPTORS
        .iter()
        .find(|(file, _)| root.join(file).exists())
        .map(|(_, cmd)| *cmd)
}

/// Regular file count and total size under `root`
fn tree_stats(root: &Path) -> (u64, u64) {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .fold((0, 0), |(files, bytes), meta| (files + 1, bytes + meta.len()))
}

/// Recursively copy `src` to a new directory `dst`
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            #[cfg(unix)]
            std::os::unix::fs::symlink(fs::read_link(entry.path())?, &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    // Guarantee the standard layout even if the source lost part of it
    for dir in WORKSPACE_DIRS {
        fs::create_dir_all(dst.join(dir))?;
    }
    Ok(())
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    type Log = Rc<RefCell<Vec<Invocation>>>;

    /// Records invocations and answers every one with a fixed status
    struct FakeRunner {
        log: Log,
        status: i32,
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> Result<i32> {
            self.log.borrow_mut().push(invocation.clone());
            Ok(self.status)
        }
    }

    fn manager_with_status(home: &TempDir, status: i32) -> (WorkspaceManager, Log) {
        let log = Log::default();
        let runner = FakeRunner {
            log: log.clone(),
            status,
        };
        let manager = WorkspaceManager::with_parts(
            BurrowPaths::under(home.path()),
            Settings::default(),
            Box::new(runner),
        );
        (manager, log)
    }

    fn manager(home: &TempDir) -> (WorkspaceManager, Log) {
        manager_with_status(home, 0)
    }

    fn tree(root: &Path) -> Vec<PathBuf> {
        let mut entries: Vec<_> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .collect();
        entries.sort();
        entries
    }

    #[test]
    fn test_create_defaults() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);

        let ws = manager.create(CreateOptions::new("demo")).unwrap();
        assert_eq!(ws.lang, "generic");
        assert_eq!(ws.display_name, "demo");
        assert!(!ws.isolated);
        assert_eq!(ws.path, manager.workspaces_dir().join("demo"));
        for dir in WORKSPACE_DIRS {
            assert!(ws.path.join(dir).is_dir(), "missing {}", dir);
        }

        let loaded = manager.require("demo").unwrap();
        assert_eq!(loaded.lang, "generic");
        assert_eq!(loaded.display_name, "demo");
        assert!(!loaded.isolated);
        assert_eq!(loaded.created, ws.created);
    }

    #[test]
    fn test_create_go_template() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);

        let mut opts = CreateOptions::new("demo");
        opts.lang = Some("go".into());
        let ws = manager.create(opts).unwrap();

        let go_mod = fs::read_to_string(ws.path.join("go.mod")).unwrap();
        assert!(go_mod.starts_with("module demo"));
        let main = fs::read_to_string(ws.path.join("src/main.go")).unwrap();
        assert!(main.contains("Hello from demo!"));

        let loaded = manager.require("demo").unwrap();
        assert_eq!(loaded.build_cmd, "go build -o build/main ./src");
        assert_eq!(loaded.run_cmd, "./build/main");
        assert_eq!(loaded.test_cmd, "go test ./...");
    }

    #[test]
    fn test_create_overrides_and_author() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);

        let mut opts = CreateOptions::new("demo");
        opts.lang = Some("rust".into());
        opts.build = Some("cargo build".into());
        opts.author = Some("ada".into());
        opts.isolated = true;
        opts.env = vec![("RUST_LOG".into(), "debug".into())];
        manager.create(opts).unwrap();

        let ws = manager.require("demo").unwrap();
        assert_eq!(ws.build_cmd, "cargo build");
        assert_eq!(ws.run_cmd, "cargo run");
        assert_eq!(ws.clean_cmd, "cargo clean");
        assert_eq!(ws.author, "ada");
        assert!(ws.isolated);
        assert_eq!(ws.env_vars["RUST_LOG"], "debug");
    }

    #[test]
    fn test_create_rejects_duplicates_and_bad_names() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);

        manager.create(CreateOptions::new("demo")).unwrap();
        assert!(matches!(
            manager.create(CreateOptions::new("demo")),
            Err(BurrowError::AlreadyExists(_))
        ));
        assert!(matches!(
            manager.create(CreateOptions::new("bad name")),
            Err(BurrowError::InvalidName(_))
        ));
    }

    #[test]
    fn test_registry_isolation_on_delete() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);

        manager.create(CreateOptions::new("a")).unwrap();
        manager.create(CreateOptions::new("b")).unwrap();
        manager.config_set("b", "description", "kept").unwrap();

        let removed = manager.delete("a").unwrap();
        assert!(!removed.path.exists());

        let names: Vec<_> = manager.list().unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["b".to_string()]);
        assert_eq!(manager.require("b").unwrap().description, "kept");
    }

    #[test]
    fn test_require_missing_path() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);

        let ws = manager.create(CreateOptions::new("demo")).unwrap();
        fs::remove_dir_all(&ws.path).unwrap();

        assert!(matches!(
            manager.require("demo"),
            Err(BurrowError::NotFound(_))
        ));
        assert!(matches!(
            manager.require("ghost"),
            Err(BurrowError::NotFound(_))
        ));
        // Still deletable
        manager.delete("demo").unwrap();
        assert!(manager.find("demo").unwrap().is_none());
    }

    #[test]
    fn test_unconfigured_build_touches_nothing() {
        let home = TempDir::new().unwrap();
        let (manager, log) = manager(&home);

        let ws = manager.create(CreateOptions::new("demo")).unwrap();
        let before = tree(&ws.path);

        let err = manager.execute("demo", Operation::Build).unwrap_err();
        assert!(matches!(err, BurrowError::Unconfigured { .. }));
        assert_eq!(err.hint(), Some("burrow config demo build_cmd \"your command\""));
        assert_eq!(err.exit_code(), 1);

        assert_eq!(tree(&ws.path), before);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_build_autodetect() {
        let home = TempDir::new().unwrap();
        let (manager, log) = manager(&home);

        let ws = manager.create(CreateOptions::new("demo")).unwrap();
        fs::write(ws.path.join("Cargo.toml"), "").unwrap();
        assert_eq!(detect_build(&ws.path), Some("cargo build"));

        fs::write(ws.path.join("Makefile"), "all:\n").unwrap();
        manager.execute("demo", Operation::Build).unwrap();

        let log = log.borrow();
        assert_eq!(log[0].program, Program::Shell("make".into()));
        assert_eq!(log[0].cwd, ws.path);
        assert_eq!(log[0].env["WS_NAME"], "demo");
    }

    #[test]
    fn test_delegated_status_is_verbatim() {
        let home = TempDir::new().unwrap();
        let (manager, log) = manager_with_status(&home, 3);

        manager.create(CreateOptions::new("demo")).unwrap();
        manager.config_set("demo", "test_cmd", "./check.sh").unwrap();
        manager.config_set("demo", "env.MODE", "ci").unwrap();

        assert_eq!(manager.execute("demo", Operation::Test).unwrap(), 3);
        assert_eq!(log.borrow()[0].program, Program::Shell("./check.sh".into()));
        assert_eq!(log.borrow()[0].env["MODE"], "ci");

        assert!(matches!(
            manager.execute("demo", Operation::Run),
            Err(BurrowError::Unconfigured { operation: "run", .. })
        ));
    }

    #[test]
    fn test_default_clean_resets_build_dir() {
        let home = TempDir::new().unwrap();
        let (manager, log) = manager(&home);

        let ws = manager.create(CreateOptions::new("demo")).unwrap();
        fs::write(ws.path.join("build/artifact"), "x").unwrap();

        assert_eq!(manager.execute("demo", Operation::Clean).unwrap(), 0);
        assert!(ws.path.join("build").is_dir());
        assert!(!ws.path.join("build/artifact").exists());
        assert!(log.borrow().is_empty());

        fs::remove_dir_all(ws.path.join("build")).unwrap();
        assert!(matches!(
            manager.execute("demo", Operation::Clean),
            Err(BurrowError::Unconfigured { .. })
        ));
    }

    #[test]
    fn test_config_get_set() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);
        manager.create(CreateOptions::new("demo")).unwrap();

        manager.config_set("demo", "isolated", "1").unwrap();
        assert_eq!(manager.config_get("demo", "isolated").unwrap(), "true");

        manager.config_set("demo", "build_cmd", "make").unwrap();
        assert_eq!(manager.config_get("demo", "build_cmd").unwrap(), "make");

        assert!(matches!(
            manager.config_set("demo", "colour", "blue"),
            Err(BurrowError::UnknownKey(_))
        ));
        assert!(matches!(
            manager.config_get("demo", "env.UNSET"),
            Err(BurrowError::NotFound(_))
        ));
    }

    #[test]
    fn test_config_set_keeps_store_line_based() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);
        manager.create(CreateOptions::new("demo")).unwrap();

        assert!(matches!(
            manager.config_set("demo", "description", "hello\nbuild_cmd: touch PWNED"),
            Err(BurrowError::Config(_))
        ));
        assert!(manager.config_set("demo", "env.A:B", "v").is_err());

        let ws = manager.require("demo").unwrap();
        assert_eq!(ws.description, "");
        assert_eq!(ws.build_cmd, "");
        assert!(ws.env_vars.is_empty());
    }

    #[test]
    fn test_create_rejects_unstorable_values() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);

        let mut opts = CreateOptions::new("demo");
        opts.env = vec![("A:B".into(), "v".into())];
        assert!(manager.create(opts).is_err());

        let mut opts = CreateOptions::new("demo");
        opts.description = Some("two\nlines".into());
        assert!(manager.create(opts).is_err());

        assert!(!manager.workspaces_dir().join("demo").exists());
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn test_status_counts_files() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);

        let ws = manager.create(CreateOptions::new("demo")).unwrap();
        fs::write(ws.path.join("src/a.txt"), "12345").unwrap();

        let status = manager.status("demo").unwrap();
        // a.txt plus .ws/config
        assert_eq!(status.files, 2);
        let config_len = fs::metadata(ws.config_path()).unwrap().len();
        assert_eq!(status.bytes, 5 + config_len);
    }

    #[test]
    fn test_clone_workspace() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager(&home);

        let mut opts = CreateOptions::new("src");
        opts.lang = Some("python".into());
        manager.create(opts).unwrap();
        manager.config_set("src", "display_name", "Original").unwrap();

        let copy = manager.clone_workspace("src", "dst").unwrap();
        assert!(copy.path.join("src/main.py").is_file());

        let loaded = manager.require("dst").unwrap();
        assert_eq!(loaded.display_name, "dst");
        assert_eq!(loaded.lang, "python");
        assert_eq!(loaded.run_cmd, "python src/main.py");
        assert_eq!(manager.require("src").unwrap().display_name, "Original");

        assert!(matches!(
            manager.clone_workspace("src", "dst"),
            Err(BurrowError::AlreadyExists(_))
        ));
        assert!(matches!(
            manager.clone_workspace("ghost", "other"),
            Err(BurrowError::NotFound(_))
        ));
    }

    #[test]
    fn test_export_invokes_tar() {
        let home = TempDir::new().unwrap();
        let (manager, log) = manager(&home);
        let ws = manager.create(CreateOptions::new("demo")).unwrap();

        let archive = home.path().join("demo.tgz");
        manager.export("demo", &archive).unwrap();

        let expected = Program::exec(
            "tar",
            [
                "czf".to_string(),
                archive.display().to_string(),
                "-C".to_string(),
                manager.workspaces_dir().display().to_string(),
                "demo".to_string(),
            ],
        );
        assert_eq!(log.borrow()[0].program, expected);
        assert_eq!(log.borrow()[0].cwd, manager.workspaces_dir());
        assert!(ws.exists());
    }

    #[test]
    fn test_failed_import_cleans_up() {
        let home = TempDir::new().unwrap();
        let (manager, _) = manager_with_status(&home, 2);

        let archive = home.path().join("in.tgz");
        fs::write(&archive, "not really gzip").unwrap();

        let err = manager.import(&archive, "restored").unwrap_err();
        assert!(matches!(err, BurrowError::Delegate { code: 2, .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(!manager.workspaces_dir().join("restored").exists());
        assert!(manager.find("restored").unwrap().is_none());

        assert!(matches!(
            manager.import(&home.path().join("missing.tgz"), "other"),
            Err(BurrowError::NotFound(_))
        ));
    }
}

//! Best-effort filesystem isolation for a session
//!
//! Runs in the forked child only. A private mount namespace is entered, then
//! a fresh tmpfs is mounted over the temp directory, then any configured bind
//! mounts are applied. Anything that fails short of the tmpfs leaves the
//! session running unisolated; the caller gets [`IsolationOutcome::Degraded`]
//! and decides how to surface it.

use crate::config::SessionSettings;
use crate::error::{BurrowError, Result};
use crate::workspace::WorkspaceRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What isolation actually achieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsolationOutcome {
    /// Private namespace with a private temp directory
    Isolated,

    /// Session continues without isolation
    Degraded { reason: String },
}

impl IsolationOutcome {
    pub fn degraded(reason: impl Into<String>) -> Self {
        IsolationOutcome::Degraded {
            reason: reason.into(),
        }
    }
}

/// A `host:target` bind mount from `mount.N` config entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl BindMount {
    /// Parse `host:target`; a relative host path is taken from the workspace root
    pub fn parse(spec: &str, root: &Path) -> Result<Self> {
        let (source, target) = spec
            .split_once(':')
            .ok_or_else(|| BurrowError::config(format!("bind mount '{}' is not host:target", spec)))?;

        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() {
            return Err(BurrowError::config(format!(
                "bind mount '{}' is not host:target",
                spec
            )));
        }

        let target = PathBuf::from(target);
        if !target.is_absolute() {
            return Err(BurrowError::config(format!(
                "bind mount target '{}' must be absolute",
                target.display()
            )));
        }

        let source = Path::new(source);
        let source = if source.is_absolute() {
            source.to_path_buf()
        } else {
            root.join(source)
        };

        Ok(Self { source, target })
    }
}

/// Everything the child needs to isolate itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolationPlan {
    pub tmp_path: PathBuf,
    pub tmpfs_size: String,
    pub mounts: Vec<BindMount>,
}

impl IsolationPlan {
    /// Plan for `ws`; malformed mount entries are dropped with a warning
    pub fn for_workspace(ws: &WorkspaceRecord, settings: &SessionSettings) -> Self {
        let mounts = ws
            .mounts
            .iter()
            .filter_map(|spec| match BindMount::parse(spec, &ws.path) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!(workspace = %ws.name, error = %e, "ignoring bind mount");
                    None
                }
            })
            .collect();

        Self {
            tmp_path: settings.tmp_path.clone(),
            tmpfs_size: settings.tmpfs_size.clone(),
            mounts,
        }
    }

    /// Apply the plan to the current process
    #[cfg(target_os = "linux")]
    pub fn apply(&self) -> IsolationOutcome {
        use nix::mount::{mount, MsFlags};
        use nix::sched::{unshare, CloneFlags};

        if let Err(e) = unshare(CloneFlags::CLONE_NEWNS) {
            return IsolationOutcome::degraded(format!("cannot create mount namespace: {}", e));
        }

        // Without private propagation the tmpfs would leak into the host namespace
        if let Err(e) = mount(
            None::<&str>,
            "/",
            None::<&str>,
            MsFlags::MS_REC | MsFlags::MS_PRIVATE,
            None::<&str>,
        ) {
            return IsolationOutcome::degraded(format!("cannot make mounts private: {}", e));
        }

        let options = format!("size={}", self.tmpfs_size);
        if let Err(e) = mount(
            Some("tmpfs"),
            &self.tmp_path,
            Some("tmpfs"),
            MsFlags::empty(),
            Some(options.as_str()),
        ) {
            return IsolationOutcome::degraded(format!(
                "cannot mount tmpfs on {}: {}",
                self.tmp_path.display(),
                e
            ));
        }
        debug!(tmp = %self.tmp_path.display(), size = %self.tmpfs_size, "private tmpfs mounted");

        for bind in &self.mounts {
            if !bind.target.exists() {
                warn!(target = %bind.target.display(), "bind mount target missing, skipped");
                continue;
            }
            match mount(
                Some(bind.source.as_path()),
                bind.target.as_path(),
                None::<&str>,
                MsFlags::MS_BIND | MsFlags::MS_REC,
                None::<&str>,
            ) {
                Ok(()) => debug!(
                    source = %bind.source.display(),
                    target = %bind.target.display(),
                    "bind mounted"
                ),
                Err(e) => warn!(
                    source = %bind.source.display(),
                    target = %bind.target.display(),
                    error = %e,
                    "bind mount failed"
                ),
            }
        }

        IsolationOutcome::Isolated
    }

    #[cfg(not(target_os = "linux"))]
    pub fn apply(&self) -> IsolationOutcome {
        IsolationOutcome::degraded("mount namespaces are only available on Linux")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bind_mount_parse() {
        let root = Path::new("/w/demo");

        let m = BindMount::parse("data:/mnt/data", root).unwrap();
        assert_eq!(m.source, PathBuf::from("/w/demo/data"));
        assert_eq!(m.target, PathBuf::from("/mnt/data"));

        let m = BindMount::parse("/srv/cache:/cache", root).unwrap();
        assert_eq!(m.source, PathBuf::from("/srv/cache"));

        assert!(BindMount::parse("no-colon", root).is_err());
        assert!(BindMount::parse("data:relative", root).is_err());
        assert!(BindMount::parse(":/mnt", root).is_err());
    }

    #[test]
    fn test_plan_skips_malformed_mounts() {
        let mut ws = WorkspaceRecord::new("demo", "/w/demo");
        ws.mounts = vec!["data:/mnt/data".into(), "broken".into()];

        let plan = IsolationPlan::for_workspace(&ws, &SessionSettings::default());
        assert_eq!(plan.tmp_path, PathBuf::from("/tmp"));
        assert_eq!(plan.tmpfs_size, "256M");
        assert_eq!(plan.mounts.len(), 1);
    }

    #[test]
    fn test_outcome_helpers() {
        let degraded = IsolationOutcome::degraded("no privileges");
        assert_ne!(degraded, IsolationOutcome::Isolated);
        assert_eq!(
            degraded,
            IsolationOutcome::Degraded {
                reason: "no privileges".into()
            }
        );
    }
}

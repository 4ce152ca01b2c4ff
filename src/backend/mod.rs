// Backends: where a logger's records end up
//
// `Backend` is the mode switch. Each enabled variant implements `RunBackend`,
// so the logger dispatches once instead of branching on the mode everywhere.

mod http;
mod local;
mod remote;
mod tracking;

pub use http::HttpTrackingService;
pub use local::LocalBackend;
pub use remote::RemoteBackend;
pub use tracking::{SavePolicy, SessionInit, TrackingService, TrackingSession};

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::metrics::{MetricGroup, MetricRecord};

/// Capabilities shared by the enabled backends.
pub trait RunBackend {
    /// Record one row for `group`. Key checks have already happened.
    fn log(&mut self, group: &MetricGroup, record: &MetricRecord) -> Result<()>;

    fn log_file(&mut self, path: &Path) -> Result<()>;

    /// Release every resource held for the run.
    fn finish(&mut self) -> Result<()>;

    fn dirs(&self) -> &RunDirs;
}

/// The backend selected by the log mode.
pub enum Backend {
    Disabled,
    Local(LocalBackend),
    Remote(RemoteBackend),
}

impl Backend {
    /// The enabled backend, or `None` when disabled.
    pub fn active_mut(&mut self) -> Option<&mut dyn RunBackend> {
        match self {
            Backend::Disabled => None,
            Backend::Local(local) => Some(local),
            Backend::Remote(remote) => Some(remote),
        }
    }

    pub fn active(&self) -> Option<&dyn RunBackend> {
        match self {
            Backend::Disabled => None,
            Backend::Local(local) => Some(local),
            Backend::Remote(remote) => Some(remote),
        }
    }
}

/// Scaffolding directories every run gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirs {
    pub root: PathBuf,
    pub temp: PathBuf,
    pub files: PathBuf,
    pub artifacts: PathBuf,
}

impl RunDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            temp: root.join("temp"),
            files: root.join("files"),
            artifacts: root.join("artifacts"),
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_dirs_layout() {
        let dirs = RunDirs::new("/tmp/runs/ppo");
        assert_eq!(dirs.temp, PathBuf::from("/tmp/runs/ppo/temp"));
        assert_eq!(dirs.files, PathBuf::from("/tmp/runs/ppo/files"));
        assert_eq!(dirs.artifacts, PathBuf::from("/tmp/runs/ppo/artifacts"));
    }

    #[test]
    fn test_disabled_has_no_active_backend() {
        let mut backend = Backend::Disabled;
        assert!(backend.active_mut().is_none());
        assert!(backend.active().is_none());
    }
}

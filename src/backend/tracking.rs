// Tracking service contract
//
// The remote backend talks to a third-party experiment tracker through these
// two traits. `HttpTrackingService` is the built-in implementation; tests and
// embedders can supply their own.

use serde::Serialize;
use std::path::Path;

use crate::config::{LoggerConfig, RemoteMode};
use crate::error::Result;
use crate::metrics::MetricRecord;

/// Upload policy for files handed to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SavePolicy {
    /// Upload now and again whenever the file changes
    Live,
    /// Upload once, immediately
    Now,
    /// Upload when the session finishes
    End,
}

/// Metadata a session is opened with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInit {
    pub name: String,
    pub job_type: Option<String>,
    pub project: Option<String>,
    pub entity: Option<String>,
    pub group: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
    pub config: serde_json::Value,
    pub reinit: bool,
    pub mode: RemoteMode,
}

impl SessionInit {
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self {
            name: config.name.clone(),
            job_type: config.job_type.clone(),
            project: config.project.clone(),
            entity: config.entity.clone(),
            group: config.group.clone(),
            tags: config.tags.clone(),
            notes: config.notes.clone(),
            config: config.config.clone(),
            reinit: config.reinit,
            mode: config.remote.mode,
        }
    }
}

/// Opens tracking sessions.
pub trait TrackingService {
    fn init(&self, init: &SessionInit) -> Result<Box<dyn TrackingSession>>;
}

/// One open run on a tracking service.
pub trait TrackingSession: Send {
    /// Local directory the session stages files in.
    fn run_dir(&self) -> &Path;

    /// Declare `name` as plotted against `step_metric`.
    fn define_metric(&mut self, name: &str, step_metric: &str) -> Result<()>;

    fn log(&mut self, record: &MetricRecord, commit: bool) -> Result<()>;

    /// Hand over a file under `base_path`; its name on the service is the
    /// path relative to `base_path`.
    fn save_file(&mut self, path: &Path, base_path: &Path, policy: SavePolicy) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

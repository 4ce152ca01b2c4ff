// Remote backend: forwards records to a tracking session

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::tracking::{SavePolicy, SessionInit, TrackingService, TrackingSession};
use super::{RunBackend, RunDirs};
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};
use crate::fsutil;
use crate::metrics::{MetricGroup, MetricGroups, MetricRecord};

pub struct RemoteBackend {
    session: Box<dyn TrackingSession>,
    dirs: RunDirs,
}

impl RemoteBackend {
    /// Open a session, declare every metric against its step metric and
    /// prepare the staging directories.
    pub fn setup(
        config: &LoggerConfig,
        groups: &MetricGroups,
        service: &dyn TrackingService,
    ) -> Result<Self> {
        let mut session = service.init(&SessionInit::from_config(config))?;

        let dirs = RunDirs::new(session.run_dir());
        for dir in [&dirs.temp, &dirs.files, &dirs.artifacts] {
            fsutil::clear_dir(dir)?;
        }

        for group in groups.iter() {
            for metric in group.metrics() {
                session.define_metric(metric, group.step_metric())?;
            }
        }

        info!(run_dir = %dirs.root.display(), "Remote run started");
        Ok(Self { session, dirs })
    }
}

impl RunBackend for RemoteBackend {
    fn log(&mut self, _group: &MetricGroup, record: &MetricRecord) -> Result<()> {
        self.session.log(record, true)
    }

    fn log_file(&mut self, path: &Path) -> Result<()> {
        let file_name = path.file_name().ok_or_else(|| {
            LoggerError::validation(format!("not a file path: {}", path.display()))
        })?;
        let dest = self.dirs.files.join(file_name);

        fs::copy(path, &dest)?;
        debug!(dest = %dest.display(), "Staged file for upload");
        self.session.save_file(&dest, &self.dirs.files, SavePolicy::Live)
    }

    fn finish(&mut self) -> Result<()> {
        self.session.finish()?;
        info!(run_dir = %self.dirs.root.display(), "Remote run finished");
        Ok(())
    }

    fn dirs(&self) -> &RunDirs {
        &self.dirs
    }
}

// Metric logger: the entry point callers feed records into

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use super::state::LoggerState;
use crate::backend::{
    Backend, HttpTrackingService, LocalBackend, RemoteBackend, TrackingService,
};
use crate::config::{LogMode, LoggerConfig};
use crate::error::{LoggerError, Result};
use crate::metrics::{BinAccumulator, MetricGroups, MetricRecord, RunSummary};

/// Records metric groups for one run, to disk or to a tracking service.
///
/// All calls block until their I/O is done. The logger takes `&mut self`
/// everywhere and does no locking of its own.
///
/// # Example
///
/// ```no_run
/// use rlbench::config::{LogMode, LoggerConfig};
/// use rlbench::metrics::record;
/// use rlbench::MetricLogger;
///
/// # fn main() -> rlbench::Result<()> {
/// let config = LoggerConfig::new(LogMode::Local, "ppo-cartpole")
///     .metric_group("train", "step", ["loss", "reward"])
///     .base_dir("runs");
/// let mut logger = MetricLogger::new(config)?;
///
/// logger.log(&record([("step", 1.into()), ("loss", 0.3.into())]), "train", true)?;
/// logger.finish()?;
/// # Ok(())
/// # }
/// ```
pub struct MetricLogger {
    name: String,
    mode: LogMode,
    groups: MetricGroups,
    bins: Option<BTreeMap<String, BinAccumulator>>,
    backend: Backend,
    state: LoggerState,
}

impl MetricLogger {
    /// Build a logger. Remote mode talks to the HTTP tracking service named
    /// in `config.remote`.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        if config.mode == LogMode::Remote {
            config.validate()?;
            let service = HttpTrackingService::from_config(&config.remote)?;
            return Self::build(config, Some(&service));
        }
        Self::build(config, None)
    }

    /// Build a logger whose remote mode uses `service`. The service is
    /// ignored in the other modes.
    pub fn with_tracking_service(config: LoggerConfig, service: &dyn TrackingService) -> Result<Self> {
        Self::build(config, Some(service))
    }

    fn build(config: LoggerConfig, service: Option<&dyn TrackingService>) -> Result<Self> {
        config.validate()?;
        let groups = config.metric_groups()?;

        let backend = match config.mode {
            LogMode::Disabled => Backend::Disabled,
            LogMode::Local => Backend::Local(LocalBackend::setup(&config, &groups)?),
            LogMode::Remote => {
                let service = service.ok_or_else(|| {
                    LoggerError::config("remote mode needs a tracking service")
                })?;
                Backend::Remote(RemoteBackend::setup(&config, &groups, service)?)
            }
        };

        let bins = match config.mode {
            LogMode::Disabled => None,
            _ => config.bin_sizes(&groups)?.map(|sizes| {
                groups
                    .iter()
                    .map(|g| {
                        let size = sizes.get(g.name()).copied().unwrap_or(1);
                        (g.name().to_string(), BinAccumulator::new(size, g.metrics()))
                    })
                    .collect()
            }),
        };

        let state = match config.mode {
            LogMode::Disabled => LoggerState::NotStarted,
            _ => LoggerState::Active,
        };

        Ok(Self {
            name: config.name,
            mode: config.mode,
            groups,
            bins,
            backend,
            state,
        })
    }

    /// Record one row for `group`.
    ///
    /// With `check_keys`, every key other than the step metric must be a
    /// registered metric of the group. Without it, extra keys reach the
    /// summary but not the CSV row.
    pub fn log(&mut self, record: &MetricRecord, group: &str, check_keys: bool) -> Result<()> {
        if self.is_disabled() {
            return Ok(());
        }
        self.ensure_active()?;

        let group = self.groups.get(group)?;
        if check_keys {
            let keys = group.unregistered_keys(record);
            if !keys.is_empty() {
                return Err(LoggerError::UnregisteredKeys {
                    group: group.name().to_string(),
                    keys,
                });
            }
        }

        match self.backend.active_mut() {
            Some(backend) => backend.log(group, record),
            None => Ok(()),
        }
    }

    /// Fold `record` into the group's bin and log the bin means once it is
    /// full.
    ///
    /// `record` must hold exactly the group's metrics; the step metric is
    /// optional and, when given, the last one seen is logged with the means.
    pub fn log_binned(&mut self, record: &MetricRecord, group: &str) -> Result<()> {
        if self.is_disabled() {
            return Ok(());
        }
        self.ensure_active()?;

        let bins = self.bins.as_mut().ok_or_else(|| {
            LoggerError::config("bin_size must be set to call log_binned")
        })?;
        let metric_group = self.groups.get(group)?;
        metric_group.check_binned_keys(record)?;

        let bin = bins
            .get_mut(group)
            .ok_or_else(|| LoggerError::config(format!("no bin for group '{}'", group)))?;

        if let Some(means) = bin.push(record, metric_group.step_metric()) {
            debug!(group, size = bin.size(), "Bin full, logging means");
            self.log(&means, group, false)?;
        }
        Ok(())
    }

    /// Copy a file into the run's `files` directory.
    pub fn log_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.is_disabled() {
            return Ok(());
        }
        self.ensure_active()?;

        match self.backend.active_mut() {
            Some(backend) => backend.log_file(path.as_ref()),
            None => Ok(()),
        }
    }

    /// Write summary.json. Only local runs keep a summary; other modes do
    /// nothing.
    pub fn log_summary(&self) -> Result<()> {
        match &self.backend {
            Backend::Local(local) => local.write_summary(),
            Backend::Remote(_) | Backend::Disabled => Ok(()),
        }
    }

    /// End the run. Can only happen once.
    ///
    /// The logger is `Finished` afterwards even when releasing a resource
    /// failed; the first such failure is returned.
    pub fn finish(&mut self) -> Result<()> {
        if self.is_disabled() {
            return Ok(());
        }
        if self.state.is_finished() {
            return Err(LoggerError::AlreadyFinished);
        }

        let result = match self.backend.active_mut() {
            Some(backend) => backend.finish(),
            None => Ok(()),
        };
        self.state = LoggerState::Finished;
        result
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> LogMode {
        self.mode
    }

    pub fn state(&self) -> LoggerState {
        self.state
    }

    pub fn groups(&self) -> &MetricGroups {
        &self.groups
    }

    /// Root of the run directory (staging directory for remote runs).
    pub fn run_dir(&self) -> Option<&Path> {
        self.backend.active().map(|b| b.dirs().root.as_path())
    }

    /// Latest value per metric; local runs only.
    pub fn summary(&self) -> Option<&RunSummary> {
        match &self.backend {
            Backend::Local(local) => Some(local.summary()),
            _ => None,
        }
    }

    /// Bin state for `group`, when binning is configured.
    pub fn bin(&self, group: &str) -> Option<&BinAccumulator> {
        self.bins.as_ref()?.get(group)
    }

    fn is_disabled(&self) -> bool {
        self.mode == LogMode::Disabled
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state.is_finished() {
            return Err(LoggerError::AlreadyFinished);
        }
        Ok(())
    }
}

impl Drop for MetricLogger {
    fn drop(&mut self) {
        if self.state.is_active() {
            warn!(run = %self.name, "Logger dropped without finish(); run left in 'started' state");
        }
    }
}

// Local backend: a run directory with one CSV stream per metric group
//
// Layout under <base_dir>/<name>/:
//   config.json, metadata.json, status.txt, summary.json
//   temp/, files/, artifacts/
//   metrics/<group>.csv

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{RunBackend, RunDirs};
use crate::config::constants::METRICS_FILE_EXT;
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};
use crate::fsutil;
use crate::metrics::{MetricGroup, MetricGroups, MetricRecord, RunSummary};

const STATUS_STARTED: &str = "started";
const STATUS_FINISHED: &str = "finished";

/// Contents of metadata.json.
#[derive(Debug, Serialize)]
struct RunMetadata<'a> {
    name: &'a str,
    job_type: Option<&'a str>,
    project: Option<&'a str>,
    group: Option<&'a str>,
    entity: Option<&'a str>,
    tags: Option<&'a [String]>,
    notes: Option<&'a str>,
}

impl<'a> RunMetadata<'a> {
    fn from_config(config: &'a LoggerConfig) -> Self {
        Self {
            name: &config.name,
            job_type: config.job_type.as_deref(),
            project: config.project.as_deref(),
            group: config.group.as_deref(),
            entity: config.entity.as_deref(),
            tags: config.tags.as_deref(),
            notes: config.notes.as_deref(),
        }
    }
}

/// Writes a run to the local filesystem.
///
/// Metric files stay open from setup until [`RunBackend::finish`]. Rows go
/// through a `BufWriter`, so nothing is guaranteed on disk before finish.
pub struct LocalBackend {
    dirs: RunDirs,
    metrics_dir: PathBuf,
    summary_path: PathBuf,
    status_path: PathBuf,
    writers: BTreeMap<String, BufWriter<File>>,
    summary: RunSummary,
}

impl LocalBackend {
    /// Create the run directory, destroying any previous run of the same name.
    pub fn setup(config: &LoggerConfig, groups: &MetricGroups) -> Result<Self> {
        let run_dir = config.local.base_dir.join(&config.name);
        let dirs = RunDirs::new(&run_dir);

        if run_dir.is_dir() {
            warn!(run_dir = %run_dir.display(), "Run directory existed and was cleared");
        }
        fsutil::create_or_clear_dir(&run_dir)?;

        let metrics_dir = run_dir.join("metrics");
        for dir in [&dirs.temp, &dirs.files, &dirs.artifacts, &metrics_dir] {
            fs::create_dir(dir)?;
        }

        fsutil::write_json(&config.config, &run_dir.join("config.json"))?;
        fsutil::write_json(
            &RunMetadata::from_config(config),
            &run_dir.join("metadata.json"),
        )?;

        let mut writers = BTreeMap::new();
        for group in groups.iter() {
            let path = metrics_dir.join(format!("{}.{}", group.name(), METRICS_FILE_EXT));
            let mut writer = BufWriter::new(File::create(&path)?);
            writer.write_all(encode_row(group.columns())?.as_bytes())?;
            writers.insert(group.name().to_string(), writer);
        }

        let status_path = run_dir.join("status.txt");
        fsutil::write_text(&status_path, STATUS_STARTED)?;

        info!(run_dir = %run_dir.display(), groups = groups.len(), "Local run started");

        Ok(Self {
            summary_path: run_dir.join("summary.json"),
            status_path,
            metrics_dir,
            writers,
            summary: RunSummary::new(groups),
            dirs,
        })
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn metrics_dir(&self) -> &Path {
        &self.metrics_dir
    }

    /// Write the current summary to summary.json.
    pub fn write_summary(&self) -> Result<()> {
        fsutil::write_json(&self.summary, &self.summary_path)
    }

    /// Flush and close every metric file. Each close is attempted even if an
    /// earlier one failed; the first error is returned.
    fn close_writers(&mut self) -> Result<()> {
        let mut first_err = None;
        for (group, writer) in std::mem::take(&mut self.writers) {
            if let Err(e) = writer.into_inner() {
                warn!(group = %group, "Failed to close metrics file: {}", e.error());
                first_err.get_or_insert(LoggerError::Io(e.into_error()));
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl RunBackend for LocalBackend {
    fn log(&mut self, group: &MetricGroup, record: &MetricRecord) -> Result<()> {
        let step = record.get(group.step_metric()).ok_or_else(|| {
            LoggerError::validation(format!(
                "step metric '{}' not given for group '{}'",
                group.step_metric(),
                group.name()
            ))
        })?;

        let writer = self
            .writers
            .get_mut(group.name())
            .ok_or(LoggerError::AlreadyFinished)?;

        self.summary.merge(group.name(), record);

        let fields: Vec<String> = std::iter::once(step.to_string())
            .chain(
                group
                    .metrics()
                    .iter()
                    .map(|m| record.get(m).map(|v| v.to_string()).unwrap_or_default()),
            )
            .collect();
        let row = encode_row(&fields)?;

        debug!(group = group.name(), "{}", row);
        write!(writer, "\n{}", row)?;
        Ok(())
    }

    fn log_file(&mut self, path: &Path) -> Result<()> {
        let file_name = path.file_name().ok_or_else(|| {
            LoggerError::validation(format!("not a file path: {}", path.display()))
        })?;
        let dest = self.dirs.files.join(file_name);

        if dest.exists() {
            warn!(
                file = %file_name.to_string_lossy(),
                "File already in files dir so skipped"
            );
            return Ok(());
        }

        fs::copy(path, &dest)?;
        debug!(src = %path.display(), dest = %dest.display(), "Copied file into run");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.close_writers()?;
        self.write_summary()?;
        fsutil::write_text(&self.status_path, STATUS_FINISHED)?;
        info!(run_dir = %self.dirs.root.display(), "Local run finished");
        Ok(())
    }

    fn dirs(&self) -> &RunDirs {
        &self.dirs
    }
}

/// Format one CSV line without its terminator. Fields that need quoting
/// (commas, quotes, newlines) are quoted.
fn encode_row<I, S>(fields: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| LoggerError::Io(e.into_error()))?;

    let line = String::from_utf8(bytes)
        .map_err(|e| LoggerError::validation(format!("metric row is not UTF-8: {}", e)))?;
    Ok(line.trim_end_matches('\n').to_string())
}

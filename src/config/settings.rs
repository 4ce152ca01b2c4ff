// Configuration structs for a logger run

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use super::constants::{DEFAULT_LOCAL_BASE_DIR, DEFAULT_REMOTE_TIMEOUT_SECS};
use crate::error::{LoggerError, Result};
use crate::metrics::{MetricGroup, MetricGroups};

/// Where metrics go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LogMode {
    /// Every operation is a no-op
    Disabled,
    /// Forward to a tracking service session
    Remote,
    /// Write a run directory on the local filesystem
    Local,
}

impl LogMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogMode::Disabled => "disabled",
            LogMode::Remote => "remote",
            LogMode::Local => "local",
        }
    }
}

impl FromStr for LogMode {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disabled" => Ok(LogMode::Disabled),
            "remote" => Ok(LogMode::Remote),
            "local" => Ok(LogMode::Local),
            other => Err(LoggerError::config(format!(
                "invalid log mode '{}'. Valid values = [\"disabled\", \"remote\", \"local\"]",
                other
            ))),
        }
    }
}

impl TryFrom<String> for LogMode {
    type Error = LoggerError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run mode handed to the tracking service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum RemoteMode {
    #[default]
    Online,
    LocalOnly,
    Disabled,
}

impl RemoteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteMode::Online => "online",
            RemoteMode::LocalOnly => "local-only",
            RemoteMode::Disabled => "disabled",
        }
    }
}

impl FromStr for RemoteMode {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "online" => Ok(RemoteMode::Online),
            "local-only" => Ok(RemoteMode::LocalOnly),
            "disabled" => Ok(RemoteMode::Disabled),
            other => Err(LoggerError::config(format!(
                "invalid remote mode '{}'. Valid values = [\"online\", \"local-only\", \"disabled\"]",
                other
            ))),
        }
    }
}

impl TryFrom<String> for RemoteMode {
    type Error = LoggerError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RemoteMode> for String {
    fn from(mode: RemoteMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Number of records averaged into one binned row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum BinSize {
    /// Same size for every group
    Uniform(usize),
    /// One size per group; keys must equal the group names
    PerGroup(BTreeMap<String, usize>),
}

impl BinSize {
    /// Per-group sizes, checked against the registered groups.
    pub fn resolve(&self, groups: &MetricGroups) -> Result<BTreeMap<String, usize>> {
        let sizes: BTreeMap<String, usize> = match self {
            BinSize::Uniform(size) => groups.names().map(|g| (g.to_string(), *size)).collect(),
            BinSize::PerGroup(map) => {
                let given: BTreeSet<&str> = map.keys().map(String::as_str).collect();
                let expected: BTreeSet<&str> = groups.names().collect();
                if given != expected {
                    return Err(LoggerError::config(format!(
                        "keys of bin_size {:?} must be the same as the metric groups {:?}",
                        given, expected
                    )));
                }
                map.clone()
            }
        };

        if let Some((group, _)) = sizes.iter().find(|(_, size)| **size == 0) {
            return Err(LoggerError::config(format!(
                "bin_size for group '{}' must be at least 1",
                group
            )));
        }
        Ok(sizes)
    }
}

impl TryFrom<serde_json::Value> for BinSize {
    type Error = LoggerError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        let as_size = |v: &serde_json::Value| v.as_u64().and_then(|n| usize::try_from(n).ok());

        let bin_size = match &value {
            serde_json::Value::Number(_) => as_size(&value).map(BinSize::Uniform),
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(group, v)| as_size(v).map(|size| (group.clone(), size)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(BinSize::PerGroup),
            _ => None,
        };
        bin_size.ok_or_else(|| {
            LoggerError::config(format!(
                "wrong type for bin_size: expected an integer or a map of group -> integer, got {}",
                value
            ))
        })
    }
}

impl From<usize> for BinSize {
    fn from(size: usize) -> Self {
        BinSize::Uniform(size)
    }
}

/// Schema for one metric group as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupSpec {
    /// Step metric (x axis) of the group
    pub step: String,
    pub metrics: Vec<String>,
}

/// Local backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalConfig {
    /// Runs are written to `<base_dir>/<name>`
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_BASE_DIR)
}

/// Remote tracking service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the tracking service
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token (falls back to RLBENCH_API_KEY when loaded from file)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub mode: RemoteMode,

    /// Root for per-session staging directories
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            mode: RemoteMode::default(),
            staging_dir: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

/// Everything needed to construct a [`crate::MetricLogger`].
///
/// # Example
///
/// ```
/// use rlbench::config::{LogMode, LoggerConfig};
///
/// let config = LoggerConfig::new(LogMode::Local, "ppo-cartpole")
///     .metric_group("train", "step", ["loss", "reward"])
///     .project("bench")
///     .bin_size(10)
///     .base_dir("runs");
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    pub mode: LogMode,

    /// Run name; also the local run directory name
    pub name: String,

    /// Metric groups keyed by group name
    #[serde(default)]
    pub metrics: BTreeMap<String, GroupSpec>,

    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    /// Run group (not a metric group)
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,

    /// Free-form JSON config blob written to config.json
    #[serde(default)]
    pub config: serde_json::Value,

    #[serde(default = "default_true")]
    pub reinit: bool,

    #[serde(default)]
    pub bin_size: Option<BinSize>,

    #[serde(default)]
    pub local: LocalConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    /// Declared for composition; no fan-out happens
    #[serde(default)]
    pub is_sub_logger: bool,
    #[serde(default)]
    pub sub_loggers: Option<Vec<String>>,
}

impl LoggerConfig {
    pub fn new(mode: LogMode, name: impl Into<String>) -> Self {
        Self {
            mode,
            name: name.into(),
            metrics: BTreeMap::new(),
            job_type: None,
            project: None,
            group: None,
            tags: None,
            entity: None,
            notes: None,
            config: serde_json::Value::Null,
            reinit: true,
            bin_size: None,
            local: LocalConfig::default(),
            remote: RemoteConfig::default(),
            is_sub_logger: false,
            sub_loggers: None,
        }
    }

    /// Register a metric group.
    pub fn metric_group<I, S>(mut self, name: impl Into<String>, step: impl Into<String>, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics.insert(
            name.into(),
            GroupSpec {
                step: step.into(),
                metrics: metrics.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the run group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    pub fn reinit(mut self, reinit: bool) -> Self {
        self.reinit = reinit;
        self
    }

    pub fn bin_size(mut self, bin_size: impl Into<BinSize>) -> Self {
        self.bin_size = Some(bin_size.into());
        self
    }

    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.local.base_dir = base_dir.into();
        self
    }

    pub fn remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = remote;
        self
    }

    pub fn sub_logger(mut self, is_sub_logger: bool) -> Self {
        self.is_sub_logger = is_sub_logger;
        self
    }

    pub fn sub_loggers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_loggers = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Build the group registry from `metrics`.
    pub fn metric_groups(&self) -> Result<MetricGroups> {
        let groups = self
            .metrics
            .iter()
            .map(|(name, spec)| MetricGroup::new(name, &spec.step, &spec.metrics))
            .collect::<Result<Vec<_>>>()?;
        MetricGroups::new(groups)
    }

    /// Per-group bin sizes, or `None` when binning is off.
    pub fn bin_sizes(&self, groups: &MetricGroups) -> Result<Option<BTreeMap<String, usize>>> {
        self.bin_size.as_ref().map(|b| b.resolve(groups)).transpose()
    }

    /// Check every constructor-level invariant.
    pub fn validate(&self) -> Result<()> {
        if self.is_sub_logger && self.sub_loggers.is_some() {
            return Err(LoggerError::config(
                "a logger cannot have sub_loggers if is_sub_logger = true",
            ));
        }

        if self.mode == LogMode::Local && !self.reinit {
            return Err(LoggerError::config(
                "reinit = false is not supported for local runs",
            ));
        }

        if self.mode != LogMode::Disabled && self.name.trim().is_empty() {
            return Err(LoggerError::config("run name must not be empty"));
        }

        // The run dir is <base_dir>/<name> and gets cleared on setup
        if self.mode != LogMode::Disabled && !is_single_path_segment(&self.name) {
            return Err(LoggerError::config(format!(
                "run name '{}' must be a single path segment",
                self.name
            )));
        }

        let groups = self.metric_groups()?;
        self.bin_sizes(&groups)?;
        Ok(())
    }
}

fn is_single_path_segment(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> LoggerConfig {
        LoggerConfig::new(LogMode::Local, "run")
            .metric_group("train", "step", ["loss", "reward"])
            .metric_group("eval", "episode", ["return"])
    }

    #[test]
    fn test_log_mode_parse() {
        assert_eq!("local".parse::<LogMode>().unwrap(), LogMode::Local);
        assert_eq!("remote".parse::<LogMode>().unwrap(), LogMode::Remote);
        assert_eq!("disabled".parse::<LogMode>().unwrap(), LogMode::Disabled);
        assert!(matches!(
            "wandb".parse::<LogMode>(),
            Err(LoggerError::Configuration(_))
        ));
    }

    #[test]
    fn test_remote_mode_parse() {
        assert_eq!("local-only".parse::<RemoteMode>().unwrap(), RemoteMode::LocalOnly);
        assert!("offline".parse::<RemoteMode>().is_err());
        assert_eq!(String::from(RemoteMode::Online), "online");
    }

    #[test]
    fn test_bin_size_from_value() {
        assert_eq!(BinSize::try_from(json!(3)).unwrap(), BinSize::Uniform(3));

        let per_group = BinSize::try_from(json!({"train": 2, "eval": 5})).unwrap();
        match per_group {
            BinSize::PerGroup(map) => {
                assert_eq!(map["train"], 2);
                assert_eq!(map["eval"], 5);
            }
            other => panic!("expected PerGroup, got {:?}", other),
        }

        for bad in [json!("3"), json!(2.5), json!(-1), json!([1, 2]), json!({"train": "x"})] {
            assert!(
                matches!(BinSize::try_from(bad.clone()), Err(LoggerError::Configuration(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_bin_size_keys_must_match_groups() {
        let groups = base().metric_groups().unwrap();

        let ok = BinSize::PerGroup(BTreeMap::from([
            ("train".to_string(), 2),
            ("eval".to_string(), 1),
        ]));
        assert_eq!(ok.resolve(&groups).unwrap()["train"], 2);

        let missing = BinSize::PerGroup(BTreeMap::from([("train".to_string(), 2)]));
        assert!(matches!(
            missing.resolve(&groups),
            Err(LoggerError::Configuration(_))
        ));
    }

    #[test]
    fn test_bin_size_zero_rejected() {
        let groups = base().metric_groups().unwrap();
        assert!(BinSize::Uniform(0).resolve(&groups).is_err());
    }

    #[test]
    fn test_validate_ok() {
        assert!(base().bin_size(4).validate().is_ok());
    }

    #[test]
    fn test_validate_empty_group() {
        let config = base().metric_group("aux", "step", ["step"]);
        assert!(matches!(
            config.validate(),
            Err(LoggerError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_run_name_is_one_segment() {
        for name in [".", "..", "../x", "a/b", "/abs", "./"] {
            let config = LoggerConfig { name: name.to_string(), ..base() };
            assert!(
                matches!(config.validate(), Err(LoggerError::Configuration(_))),
                "{name:?} should be rejected"
            );
        }
        let ok = LoggerConfig { name: "ppo-2".to_string(), ..base() };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_validate_sub_logger_conflict() {
        let config = base().sub_logger(true).sub_loggers(["child"]);
        assert!(matches!(
            config.validate(),
            Err(LoggerError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_local_requires_reinit() {
        assert!(base().reinit(false).validate().is_err());

        let mut remote = base().reinit(false);
        remote.mode = LogMode::Remote;
        assert!(remote.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::new(LogMode::Disabled, "x");
        assert!(config.reinit);
        assert_eq!(config.local.base_dir, PathBuf::from(DEFAULT_LOCAL_BASE_DIR));
        assert_eq!(config.remote.mode, RemoteMode::Online);
        assert_eq!(config.config, serde_json::Value::Null);
    }
}

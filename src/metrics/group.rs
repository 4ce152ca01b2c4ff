// Metric groups: named sets of metrics sharing one step axis

use std::collections::BTreeSet;

use super::value::MetricRecord;
use crate::error::{LoggerError, Result};

/// A named collection of metrics that share one step metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricGroup {
    name: String,
    step_metric: String,
    metrics: Vec<String>,
}

impl MetricGroup {
    /// Create a group. The step metric is dropped from `metrics` and
    /// duplicates collapse to their first occurrence.
    ///
    /// Fails if nothing is left once that is done.
    pub fn new<I, S>(name: impl Into<String>, step_metric: impl Into<String>, metrics: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let step_metric = step_metric.into();

        let mut seen = BTreeSet::new();
        let metrics: Vec<String> = metrics
            .into_iter()
            .map(Into::into)
            .filter(|m| *m != step_metric && seen.insert(m.clone()))
            .collect();

        if metrics.is_empty() {
            return Err(LoggerError::config(format!(
                "metric group '{}' has no metrics besides its step metric '{}'",
                name, step_metric
            )));
        }

        Ok(Self {
            name,
            step_metric,
            metrics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_metric(&self) -> &str {
        &self.step_metric
    }

    /// Registered metrics in column order (step metric excluded).
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// CSV header: step metric first, then the metrics.
    pub fn columns(&self) -> Vec<&str> {
        std::iter::once(self.step_metric.as_str())
            .chain(self.metrics.iter().map(String::as_str))
            .collect()
    }

    pub fn contains(&self, metric: &str) -> bool {
        self.metrics.iter().any(|m| m == metric)
    }

    /// Keys of `record` that are neither the step metric nor registered.
    pub fn unregistered_keys(&self, record: &MetricRecord) -> Vec<String> {
        record
            .keys()
            .filter(|k| **k != self.step_metric && !self.contains(k))
            .cloned()
            .collect()
    }

    /// A binned record must carry exactly the registered metrics. The step
    /// metric may ride along.
    pub fn check_binned_keys(&self, record: &MetricRecord) -> Result<()> {
        let given: BTreeSet<&str> = record
            .keys()
            .map(String::as_str)
            .filter(|k| *k != self.step_metric)
            .collect();
        let expected: BTreeSet<&str> = self.metrics.iter().map(String::as_str).collect();

        if given != expected {
            let extra: Vec<&str> = given.difference(&expected).copied().collect();
            let missing: Vec<&str> = expected.difference(&given).copied().collect();
            return Err(LoggerError::validation(format!(
                "all metrics of group '{}' must be given when binning (extra = {:?}, missing = {:?})",
                self.name, extra, missing
            )));
        }
        Ok(())
    }
}

/// The fixed set of groups a logger was built with.
#[derive(Debug, Clone, Default)]
pub struct MetricGroups {
    groups: Vec<MetricGroup>,
}

impl MetricGroups {
    pub fn new(groups: Vec<MetricGroup>) -> Result<Self> {
        let mut names = BTreeSet::new();
        for group in &groups {
            if !names.insert(group.name()) {
                return Err(LoggerError::config(format!(
                    "metric group '{}' is defined twice",
                    group.name()
                )));
            }
        }
        Ok(Self { groups })
    }

    /// Look up a group, failing with [`LoggerError::UnknownGroup`].
    pub fn get(&self, name: &str) -> Result<&MetricGroup> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| LoggerError::UnknownGroup {
                group: name.to_string(),
                valid: self.names().map(str::to_string).collect(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(MetricGroup::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::record;

    fn train() -> MetricGroup {
        MetricGroup::new("train", "step", ["loss", "reward"]).unwrap()
    }

    #[test]
    fn test_step_metric_and_duplicates_removed() {
        let g = MetricGroup::new("train", "step", ["loss", "step", "reward", "loss"]).unwrap();
        assert_eq!(g.metrics(), &["loss".to_string(), "reward".to_string()]);
        assert_eq!(g.columns(), vec!["step", "loss", "reward"]);
    }

    #[test]
    fn test_empty_group_rejected() {
        let err = MetricGroup::new("train", "step", ["step"]).unwrap_err();
        assert!(matches!(err, LoggerError::Configuration(_)));

        let err = MetricGroup::new("train", "step", Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, LoggerError::Configuration(_)));
    }

    #[test]
    fn test_unregistered_keys() {
        let g = train();
        let r = record([("step", 1.into()), ("loss", 0.1.into()), ("lr", 0.01.into())]);
        assert_eq!(g.unregistered_keys(&r), vec!["lr".to_string()]);

        let ok = record([("step", 1.into()), ("reward", 2.into())]);
        assert!(g.unregistered_keys(&ok).is_empty());
    }

    #[test]
    fn test_check_binned_keys() {
        let g = train();
        assert!(g
            .check_binned_keys(&record([("loss", 1.0.into()), ("reward", 2.0.into())]))
            .is_ok());
        assert!(g
            .check_binned_keys(&record([
                ("step", 4.into()),
                ("loss", 1.0.into()),
                ("reward", 2.0.into())
            ]))
            .is_ok());

        let missing = g.check_binned_keys(&record([("loss", 1.0.into())]));
        assert!(matches!(missing, Err(LoggerError::Validation(_))));

        let extra = g.check_binned_keys(&record([
            ("loss", 1.0.into()),
            ("reward", 2.0.into()),
            ("lr", 0.1.into()),
        ]));
        assert!(matches!(extra, Err(LoggerError::Validation(_))));
    }

    #[test]
    fn test_registry_lookup() {
        let groups = MetricGroups::new(vec![
            train(),
            MetricGroup::new("eval", "episode", ["return"]).unwrap(),
        ])
        .unwrap();

        assert_eq!(groups.get("eval").unwrap().step_metric(), "episode");
        match groups.get("test") {
            Err(LoggerError::UnknownGroup { group, valid }) => {
                assert_eq!(group, "test");
                assert_eq!(valid, vec!["train".to_string(), "eval".to_string()]);
            }
            other => panic!("expected UnknownGroup, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_group_names_rejected() {
        let err = MetricGroups::new(vec![train(), train()]).unwrap_err();
        assert!(matches!(err, LoggerError::Configuration(_)));
    }
}

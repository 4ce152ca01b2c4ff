// Run summary: latest value per metric per group

use serde::Serialize;
use std::collections::BTreeMap;

use super::group::MetricGroups;
use super::value::{MetricRecord, MetricValue};

/// Latest-known value of every metric, per group.
///
/// Registered metrics (and the step metric) start out as `null`. Merging a
/// record overwrites by key, so keys outside the group schema are kept too.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RunSummary {
    groups: BTreeMap<String, BTreeMap<String, Option<MetricValue>>>,
}

impl RunSummary {
    pub fn new(groups: &MetricGroups) -> Self {
        let groups = groups
            .iter()
            .map(|group| {
                let entries = group
                    .columns()
                    .into_iter()
                    .map(|metric| (metric.to_string(), None))
                    .collect();
                (group.name().to_string(), entries)
            })
            .collect();
        Self { groups }
    }

    pub fn merge(&mut self, group: &str, record: &MetricRecord) {
        let entries = self.groups.entry(group.to_string()).or_default();
        for (metric, value) in record {
            entries.insert(metric.clone(), Some(*value));
        }
    }

    pub fn get(&self, group: &str, metric: &str) -> Option<MetricValue> {
        self.groups.get(group)?.get(metric).copied().flatten()
    }

    pub fn group(&self, group: &str) -> Option<&BTreeMap<String, Option<MetricValue>>> {
        self.groups.get(group)
    }
}

// Streaming bin averages for log_binned

use std::collections::BTreeMap;

use super::value::{MetricRecord, MetricValue};

/// Running mean over a fixed number of consecutive records.
///
/// Only the counter resets when a bin fills. The means carry over into the
/// next bin and are blended by the next update with weight `(n-1)/n`, which
/// is zero for the first record of a bin. [`BinAccumulator::means`] exposes
/// the carried values.
#[derive(Debug, Clone)]
pub struct BinAccumulator {
    size: usize,
    n: usize,
    means: BTreeMap<String, f64>,
    last_step: Option<MetricValue>,
}

impl BinAccumulator {
    pub fn new<'a>(size: usize, metrics: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            size,
            n: 0,
            means: metrics.into_iter().map(|m| (m.clone(), 0.0)).collect(),
            last_step: None,
        }
    }

    /// Fold one record in. Returns the record to log when the bin is full.
    ///
    /// The flushed record holds the means, plus the step value of the
    /// record that completed the bin when one was given.
    pub fn push(&mut self, record: &MetricRecord, step_metric: &str) -> Option<MetricRecord> {
        self.n += 1;
        let n = self.n as f64;

        for (metric, value) in record {
            if metric == step_metric {
                self.last_step = Some(*value);
                continue;
            }
            let avg = self.means.entry(metric.clone()).or_insert(0.0);
            *avg = *avg * (n - 1.0) / n + value.as_f64() / n;
        }

        if self.n < self.size {
            return None;
        }

        self.n = 0;
        let mut flushed: MetricRecord = self
            .means
            .iter()
            .map(|(metric, avg)| (metric.clone(), MetricValue::Float(*avg)))
            .collect();
        if let Some(step) = self.last_step.take() {
            flushed.insert(step_metric.to_string(), step);
        }
        Some(flushed)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Records folded into the current bin.
    pub fn count(&self) -> usize {
        self.n
    }

    pub fn means(&self) -> &BTreeMap<String, f64> {
        &self.means
    }
}

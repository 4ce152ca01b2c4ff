// Metrics module
// Metric values, group schemas, the run summary and bin averaging

mod binning;
mod group;
mod summary;
mod value;

pub use binning::BinAccumulator;
pub use group::{MetricGroup, MetricGroups};
pub use summary::RunSummary;
pub use value::{record, MetricRecord, MetricValue};

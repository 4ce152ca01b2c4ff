// Logger module
// MetricLogger and its lifecycle state

mod metric_logger;
mod state;

pub use metric_logger::MetricLogger;
pub use state::LoggerState;

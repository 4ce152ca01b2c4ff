// rlbench - experiment benchmarking harness
// Library exports

//! Per-run metric logging for ML/RL experiments.
//!
//! A [`MetricLogger`] is built from a [`config::LoggerConfig`] and records
//! named metric groups either to a local run directory (one CSV stream per
//! group plus JSON metadata and a summary) or to a remote tracking service.
//! A disabled logger accepts every call and does nothing.

pub mod backend;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod logger;
pub mod metrics;

pub use config::{load_config, BinSize, LogMode, LoggerConfig, RemoteMode};
pub use error::{LoggerError, Result};
pub use logger::{LoggerState, MetricLogger};
pub use metrics::{record, MetricRecord, MetricValue};

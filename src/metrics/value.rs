// Metric values and records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single numeric metric value.
///
/// Integers and floats are kept apart so that an integer step such as `10`
/// is written as `10` while a float loss of `10.0` keeps its `.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Int(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::Int(v) => write!(f, "{}", v),
            MetricValue::Float(v) if v.is_nan() => write!(f, "nan"),
            MetricValue::Float(v) if v.is_infinite() => {
                write!(f, "{}", if v > 0.0 { "inf" } else { "-inf" })
            }
            MetricValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e16 => write!(f, "{:.1}", v),
            // Past 1e16 `{:.1}` would print a bare run of digits
            MetricValue::Float(v) if v.fract() == 0.0 => write!(f, "{:e}", v),
            MetricValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Float(v as f64)
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        i64::try_from(v)
            .map(MetricValue::Int)
            .unwrap_or(MetricValue::Float(v as f64))
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::from(v as u64)
    }
}

/// Metric name -> value, submitted for one group at one point in time.
pub type MetricRecord = BTreeMap<String, MetricValue>;

/// Build a [`MetricRecord`] from name/value pairs.
///
/// ```
/// use rlbench::metrics::record;
///
/// let r = record([("step", 1.into()), ("loss", 0.25.into())]);
/// assert_eq!(r.len(), 2);
/// ```
pub fn record<K, I>(pairs: I) -> MetricRecord
where
    K: Into<String>,
    I: IntoIterator<Item = (K, MetricValue)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_int_and_float_apart() {
        assert_eq!(MetricValue::Int(10).to_string(), "10");
        assert_eq!(MetricValue::Float(10.0).to_string(), "10.0");
        assert_eq!(MetricValue::Float(0.25).to_string(), "0.25");
        assert_eq!(MetricValue::Float(-3.5).to_string(), "-3.5");
    }

    #[test]
    fn test_display_large_integral_float_is_not_an_int() {
        assert_eq!(MetricValue::Float(1e16).to_string(), "1e16");
        assert_eq!(MetricValue::Float(-2.5e20).to_string(), "-2.5e20");
        assert_eq!(MetricValue::Float(9.0e15).to_string(), "9000000000000000.0");
        assert_eq!(MetricValue::Int(10_000_000_000_000_000).to_string(), "10000000000000000");
    }

    #[test]
    fn test_display_non_finite() {
        assert_eq!(MetricValue::Float(f64::NAN).to_string(), "nan");
        assert_eq!(MetricValue::Float(f64::INFINITY).to_string(), "inf");
        assert_eq!(MetricValue::Float(f64::NEG_INFINITY).to_string(), "-inf");
    }

    #[test]
    fn test_untagged_serde() {
        let r = record([("step", 3.into()), ("loss", 0.5.into())]);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"loss":0.5,"step":3}"#);

        let back: MetricRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back["step"], MetricValue::Int(3));
        assert_eq!(back["loss"], MetricValue::Float(0.5));
    }

    #[test]
    fn test_large_u64_falls_back_to_float() {
        assert!(matches!(MetricValue::from(u64::MAX), MetricValue::Float(_)));
        assert_eq!(MetricValue::from(7usize), MetricValue::Int(7));
    }
}

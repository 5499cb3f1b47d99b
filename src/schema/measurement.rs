//! Measurements and their dimension tags

use serde::Serialize;
use std::sync::Arc;

/// Dimension carrying the event source.
pub const SOURCE_DIMENSION: &str = "source";
/// Dimension carrying the deployment region.
pub const REGION_DIMENSION: &str = "region";
/// Longest dimension value (in characters) the store accepts.
pub const MAX_DIMENSION_VALUE_LEN: usize = 256;

/// A named string tag attached to a measurement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Declared type of a measure value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureValueType {
    Double,
}

impl MeasureValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureValueType::Double => "DOUBLE",
        }
    }
}

/// Precision of a measurement timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Milliseconds,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Milliseconds => "MILLISECONDS",
        }
    }
}

/// One named numeric value destined for the time-series store.
///
/// All measurements derived from the same event share one timestamp and one
/// dimension set.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub value: f64,
    pub time: i64,
    pub time_unit: TimeUnit,
    pub value_type: MeasureValueType,
    pub dimensions: Arc<[Dimension]>,
}

impl Measurement {
    /// The value in the string encoding the store expects.
    pub fn measure_value(&self) -> String {
        self.value.to_string()
    }
}

/// Counters for one ingested batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionOutcome {
    pub processed: usize,
    pub failed: usize,
}

impl IngestionOutcome {
    pub fn total(&self) -> usize {
        self.processed + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(value: f64) -> Measurement {
        Measurement {
            name: "temp".to_string(),
            value,
            time: 0,
            time_unit: TimeUnit::Milliseconds,
            value_type: MeasureValueType::Double,
            dimensions: Arc::from(Vec::new()),
        }
    }

    #[test]
    fn test_measure_value_encoding() {
        assert_eq!(measurement(22.5).measure_value(), "22.5");
        assert_eq!(measurement(22.0).measure_value(), "22");
        assert_eq!(measurement(-0.25).measure_value(), "-0.25");
    }

    #[test]
    fn test_outcome_total() {
        let outcome = IngestionOutcome {
            processed: 3,
            failed: 2,
        };
        assert_eq!(outcome.total(), 5);
    }
}

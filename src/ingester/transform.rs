//! Event -> measurement/dimension derivation
//!
//! Transformation never fails. Non-numeric metrics are skipped with a warning
//! and relationship values the store could not index are left out of the
//! dimension set.

use crate::clock::Clock;
use crate::schema::{
    Dimension, Event, MeasureValueType, Measurement, TimeUnit, MAX_DIMENSION_VALUE_LEN,
    REGION_DIMENSION, SOURCE_DIMENSION,
};

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Derives measurements and dimensions from decoded events.
pub struct Transformer {
    region: String,
    clock: Arc<dyn Clock>,
}

impl Transformer {
    pub fn new(region: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            region: region.into(),
            clock,
        }
    }

    /// Build the dimension set for an event.
    ///
    /// Order is fixed: `source`, `region`, then relationships in payload order.
    /// A relationship is admitted only if its value is a string of at most
    /// [`MAX_DIMENSION_VALUE_LEN`] characters.
    pub fn build_dimensions(&self, event: &Event) -> Vec<Dimension> {
        let mut dimensions = Vec::with_capacity(2 + event.relationships.len());
        dimensions.push(Dimension::new(SOURCE_DIMENSION, event.source.as_str()));
        dimensions.push(Dimension::new(REGION_DIMENSION, self.region.as_str()));

        for (key, value) in &event.relationships {
            if let Value::String(value) = value {
                if value.chars().count() <= MAX_DIMENSION_VALUE_LEN {
                    dimensions.push(Dimension::new(key.as_str(), value.as_str()));
                }
            }
        }

        dimensions
    }

    /// Build one measurement per numeric metric.
    ///
    /// Every measurement from the same event carries the same timestamp and
    /// shares a single dimension set.
    pub fn build_measurements(&self, event: &Event) -> Vec<Measurement> {
        if event.metrics.is_empty() {
            return Vec::new();
        }

        let time = self.clock.now_millis();
        let dimensions: Arc<[Dimension]> = self.build_dimensions(event).into();

        event
            .metrics
            .iter()
            .filter_map(|(name, value)| {
                let Some(value) = numeric(value) else {
                    warn!(metric = %name, value = %value, "Skipping non-numeric metric");
                    return None;
                };
                Some(Measurement {
                    name: name.clone(),
                    value,
                    time,
                    time_unit: TimeUnit::Milliseconds,
                    value_type: MeasureValueType::Double,
                    dimensions: dimensions.clone(),
                })
            })
            .collect()
    }
}

/// Booleans are not numbers here even though some producers treat them so.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use serde_json::json;

    fn transformer() -> Transformer {
        let at = chrono::Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        Transformer::new("ap-northeast-1", Arc::new(FixedClock::new(at)))
    }

    fn event(payload: serde_json::Value) -> Event {
        Event::from_value(payload).unwrap()
    }

    #[test]
    fn test_dimension_order() {
        let dims = transformer().build_dimensions(&event(json!({
            "source": "sensor-1",
            "relationships": {"device_id": "device-2", "location": "osaka", "zone": "zone-b"}
        })));

        let names: Vec<&str> = dims.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["source", "region", "device_id", "location", "zone"]);
        assert_eq!(dims[0].value, "sensor-1");
        assert_eq!(dims[1].value, "ap-northeast-1");
    }

    #[test]
    fn test_dimension_value_length_boundary() {
        let at_limit = "a".repeat(MAX_DIMENSION_VALUE_LEN);
        let over_limit = "b".repeat(MAX_DIMENSION_VALUE_LEN + 1);
        let dims = transformer().build_dimensions(&event(json!({
            "relationships": {"fits": at_limit, "too_long": over_limit}
        })));

        assert!(dims.iter().any(|d| d.name == "fits"), "256 chars must be admitted");
        assert!(
            !dims.iter().any(|d| d.name == "too_long"),
            "257 chars must be excluded"
        );
    }

    #[test]
    fn test_dimension_limit_counts_characters() {
        // 256 two-byte characters: 512 bytes, still within the limit
        let value = "é".repeat(MAX_DIMENSION_VALUE_LEN);
        let dims = transformer().build_dimensions(&event(json!({
            "relationships": {"accented": value}
        })));
        assert!(dims.iter().any(|d| d.name == "accented"));
    }

    #[test]
    fn test_non_string_relationships_excluded() {
        let dims = transformer().build_dimensions(&event(json!({
            "relationships": {"count": 3, "nested": {"a": "b"}, "flag": true, "none": null}
        })));
        assert_eq!(dims.len(), 2, "only source and region should remain");
    }

    #[test]
    fn test_mixed_metrics_yield_numeric_only() {
        let measurements = transformer().build_measurements(&event(json!({
            "metrics": {"temp": 22.5, "status": "ok"}
        })));
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].name, "temp");
        assert_eq!(measurements[0].value, 22.5);
        assert_eq!(measurements[0].value_type, MeasureValueType::Double);
    }

    #[test]
    fn test_non_numeric_values_skipped() {
        let measurements = transformer().build_measurements(&event(json!({
            "metrics": {"a": "abc", "b": null, "c": [1, 2], "d": true, "e": 7}
        })));
        let names: Vec<&str> = measurements.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["e"]);
    }

    #[test]
    fn test_empty_metrics_yield_nothing() {
        let measurements = transformer().build_measurements(&event(json!({"metrics": {}})));
        assert!(measurements.is_empty());
    }

    #[test]
    fn test_measurements_share_timestamp_and_dimensions() {
        let t = transformer();
        let measurements = t.build_measurements(&event(json!({
            "source": "sensor-9",
            "metrics": {"temperature": 30.1, "humidity": 55, "pressure": 1011.2}
        })));

        assert_eq!(measurements.len(), 3);
        let first = &measurements[0];
        for m in &measurements {
            assert_eq!(m.time, first.time, "all measurements share one instant");
            assert!(Arc::ptr_eq(&m.dimensions, &first.dimensions));
            assert_eq!(m.time_unit, TimeUnit::Milliseconds);
        }
        assert_eq!(first.time, t.clock.now_millis());
    }
}

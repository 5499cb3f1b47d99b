//! Transport records and decoded events

use crate::{Error, Result};

use serde_json::{Map, Value};
use tracing::warn;

/// Source identifier used when an event does not name one.
pub const DEFAULT_SOURCE: &str = "unknown";

/// One transport-encoded record as delivered by the stream trigger.
///
/// `data` is the base64 text of a UTF-8 JSON payload. The sequence number is
/// the partition-unique ordering token; it is only used as an archive key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub data: String,
    pub sequence_number: Option<String>,
}

impl RawRecord {
    pub fn new(data: impl Into<String>, sequence_number: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            sequence_number: Some(sequence_number.into()),
        }
    }

    /// Read a record out of its `{"kinesis": {"data": .., "sequenceNumber": ..}}`
    /// envelope.
    ///
    /// Never fails: a record with no usable `data` carries an empty payload and
    /// is rejected later by the decoder, so the failure stays scoped to it.
    pub fn from_envelope(record: &Value) -> Self {
        let stream = record.get("kinesis");
        let data = stream
            .and_then(|k| k.get("data"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let sequence_number = stream
            .and_then(|k| k.get("sequenceNumber"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            data,
            sequence_number,
        }
    }

    /// Extract every record from a batch envelope `{"Records": [...]}`.
    ///
    /// A missing `Records` field is an empty batch. Any other non-array value
    /// means the batch itself is malformed.
    pub fn batch_from_envelope(batch: &Value) -> Result<Vec<Self>> {
        let Some(object) = batch.as_object() else {
            return Err(Error::Structural(format!(
                "batch must be a JSON object, got {}",
                json_type_name(batch)
            )));
        };

        match object.get("Records") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(records)) => Ok(records.iter().map(Self::from_envelope).collect()),
            Some(other) => Err(Error::Structural(format!(
                "`Records` must be an array, got {}",
                json_type_name(other)
            ))),
        }
    }
}

/// A decoded telemetry event.
///
/// `metrics` and `relationships` keep their JSON values untouched; filtering of
/// non-numeric metrics and oversized relationship values happens when the
/// event is transformed, never at decode time.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub source: String,
    pub metrics: Map<String, Value>,
    pub relationships: Map<String, Value>,
    payload: Value,
}

impl Event {
    /// Build an event from a parsed JSON payload.
    ///
    /// Unknown fields are ignored for derivation but retained in the payload
    /// so the archived copy is the event exactly as received.
    pub fn from_value(payload: Value) -> Result<Self> {
        let Some(object) = payload.as_object() else {
            return Err(Error::Decode(format!(
                "payload must be a JSON object, got {}",
                json_type_name(&payload)
            )));
        };

        let source = match object.get("source") {
            None | Some(Value::Null) => DEFAULT_SOURCE.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        let metrics = metrics_field(object)?;
        let relationships = relationships_field(object);

        Ok(Self {
            source,
            metrics,
            relationships,
            payload,
        })
    }

    /// The payload as it was decoded.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Falsy metrics (`null`, `false`, `0`, `""`, `[]`) mean no metrics. Any
/// other non-object value cannot be read and fails the record.
fn metrics_field(object: &Map<String, Value>) -> Result<Map<String, Value>> {
    match object.get("metrics") {
        Some(Value::Object(map)) => Ok(map.clone()),
        None => Ok(Map::new()),
        Some(value) if is_falsy(value) => Ok(Map::new()),
        Some(other) => Err(Error::Decode(format!(
            "`metrics` must be an object, got {}",
            json_type_name(other)
        ))),
    }
}

/// Relationships only ever add dimensions, so an unreadable value is dropped.
fn relationships_field(object: &Map<String, Value>) -> Map<String, Value> {
    match object.get("relationships") {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            warn!(
                kind = json_type_name(other),
                "Ignoring relationships that are not an object"
            );
            Map::new()
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_defaults_source() {
        let event = Event::from_value(json!({"metrics": {"temp": 1}})).unwrap();
        assert_eq!(event.source, DEFAULT_SOURCE);
        assert!(event.relationships.is_empty());
    }

    #[test]
    fn test_event_keeps_extra_fields_in_payload() {
        let payload = json!({
            "timestamp": "2024-03-05T12:00:00",
            "source": "sensor-1",
            "metrics": {"temp": 22.5},
        });
        let event = Event::from_value(payload.clone()).unwrap();
        assert_eq!(event.source, "sensor-1");
        assert_eq!(event.payload(), &payload);
    }

    #[test]
    fn test_event_rejects_non_object_payload() {
        let err = Event::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_event_rejects_non_empty_non_object_metrics() {
        for metrics in [json!([1, 2]), json!("temp"), json!(7), json!(true)] {
            let err = Event::from_value(json!({"metrics": metrics})).unwrap_err();
            assert!(format!("{err}").contains("metrics"), "{metrics}");
        }
    }

    #[test]
    fn test_event_falsy_metrics_are_empty() {
        for metrics in [json!(null), json!([]), json!(""), json!(0), json!(false)] {
            let event = Event::from_value(json!({"metrics": metrics})).unwrap();
            assert!(event.metrics.is_empty(), "{metrics}");
        }
    }

    #[test]
    fn test_event_non_object_relationships_are_empty() {
        for relationships in [json!(["x"]), json!("zone-a"), json!(3)] {
            let payload = json!({"metrics": {"temp": 1}, "relationships": relationships});
            let event = Event::from_value(payload.clone()).unwrap();
            assert!(event.relationships.is_empty());
            assert_eq!(event.payload(), &payload, "payload kept as received");
        }
    }

    #[test]
    fn test_relationship_order_preserved() {
        let event = Event::from_value(json!({
            "relationships": {"zone": "a", "device_id": "d-1", "location": "tokyo"}
        }))
        .unwrap();
        let keys: Vec<&str> = event.relationships.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zone", "device_id", "location"]);
    }

    #[test]
    fn test_record_from_envelope_without_data() {
        let record = RawRecord::from_envelope(&json!({"kinesis": {"sequenceNumber": "42"}}));
        assert_eq!(record.data, "");
        assert_eq!(record.sequence_number.as_deref(), Some("42"));
    }

    #[test]
    fn test_batch_missing_records_is_empty() {
        let records = RawRecord::batch_from_envelope(&json!({})).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_batch_non_array_records_is_structural() {
        let err = RawRecord::batch_from_envelope(&json!({"Records": 5})).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }
}

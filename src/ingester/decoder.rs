//! Transport record decoding
//!
//! base64 -> UTF-8 -> JSON -> [`Event`]. Any stage failing rejects the whole
//! record; no partial event is ever produced.

use crate::schema::{Event, RawRecord};
use crate::{Error, Result};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decode one raw record into an event.
pub fn decode(record: &RawRecord) -> Result<Event> {
    let bytes = STANDARD
        .decode(record.data.as_bytes())
        .map_err(|e| Error::Decode(format!("invalid base64 payload: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::Decode(format!("payload is not valid UTF-8: {e}")))?;
    let payload = serde_json::from_str(&text)
        .map_err(|e| Error::Decode(format!("payload is not valid JSON: {e}")))?;

    Event::from_value(payload)
}

/// Encode a JSON payload the way the stream transport delivers it.
pub fn encode(payload: &serde_json::Value) -> String {
    STANDARD.encode(payload.to_string())
}

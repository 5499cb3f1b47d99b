//! Batch ingestion endpoint

use crate::api::IngestState;
use crate::Error;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

/// Handle a batch of stream records
///
/// POST /ingest
/// Body: `{"Records": [{"kinesis": {"data": "<base64>", "sequenceNumber": "..."}}]}`
///
/// Responds 200 with per-batch counters even when individual records fail;
/// 500 only when the batch itself cannot be read.
pub async fn handle_batch(State(state): State<IngestState>, body: Bytes) -> Response {
    let batch: Value = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            return batch_failure(Error::Structural(format!("batch is not valid JSON: {e}")));
        }
    };

    match state.ingester.process_envelope(&batch).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "message": "Successfully processed records",
                "processed": outcome.processed,
                "failed": outcome.failed,
            })),
        )
            .into_response(),
        Err(e) => batch_failure(e),
    }
}

fn batch_failure(e: Error) -> Response {
    error!(error = %e, "Error processing batch");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
        .into_response()
}

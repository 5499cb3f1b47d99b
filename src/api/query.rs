//! Query endpoint

use crate::api::QueryState;
use crate::query::{QueryParams, ResponseEnvelope};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Run a query
///
/// GET /query?type=metrics|aggregated|health&hours=N&source=..&metric=..
pub async fn handle_query(
    State(state): State<QueryState>,
    Query(params): Query<QueryParams>,
) -> Response {
    state.service.handle(&params).await.into_response()
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }

        (status, headers, Json(self.body)).into_response()
    }
}

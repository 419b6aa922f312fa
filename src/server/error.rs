use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::query::QueryError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Failure on a JSON endpoint
    #[error("{0}")]
    Query(#[from] QueryError),

    /// Failure on the raw CSV endpoint, reported as plain text
    #[error("Error: {0}")]
    Text(QueryError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Query(QueryError::InvalidParameter { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Query(_) | ApiError::Text(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(error = %message, "Request failed");
        }

        match self {
            ApiError::Query(_) => (status, Json(json!({ "error": message }))).into_response(),
            ApiError::Text(_) => (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                message,
            )
                .into_response(),
        }
    }
}

//! Error envelope for HTTP responses: `{"error": "<details>"}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gl_01_ledger::LedgerError;
use serde_json::json;

use crate::node::NodeError;

/// A request-layer failure rendered as a 4xx JSON envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// 400 with the given details.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Status code of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<NodeError> for ApiError {
    fn from(err: NodeError) -> Self {
        let status = match err {
            NodeError::Ledger(LedgerError::StaleTip { .. }) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_tip_maps_to_conflict() {
        let err = ApiError::from(NodeError::Ledger(LedgerError::StaleTip {
            expected: "a".into(),
            actual: "b".into(),
        }));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_other_errors_map_to_bad_request() {
        let err = ApiError::from(NodeError::Ledger(LedgerError::EmptyChain));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
    }
}

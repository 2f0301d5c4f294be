//! HTTP API surface: routing, role administration, and user endpoints.
//!
//! Thin plumbing over the auth core. Handlers translate store and service
//! results into responses; no authorization logic lives here.

pub mod admin;
pub mod routes;
pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// Shared API error for the plumbing endpoints.
///
/// Infrastructure failures log server-side and surface as a generic 500;
/// everything else carries a client-safe message.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err = anyhow::anyhow!("Test error");
        let api_err: ApiError = err.into();

        match api_err {
            ApiError::Internal(_) => (),
            _ => panic!("Expected Internal error"),
        }
    }

    #[test]
    fn test_error_status_codes() {
        let bad = ApiError::BadRequest("Invalid role".to_string()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let conflict = ApiError::Conflict("exists".to_string()).into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let internal = ApiError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use warden_core::Error;

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: &'static str,
}

/// Handler error
#[derive(Debug)]
pub enum ApiError {
    /// No valid session on a route that needs one
    Unauthenticated,
    Service(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Unauthenticated => {
                let body = ErrorBody {
                    error: "Unauthenticated",
                    message: "Not authenticated",
                };
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
            ApiError::Service(err) => err,
        };

        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Bodies stay generic; the cause has already been logged by the backend
        let message = match &err {
            Error::InvalidCredentials => "Invalid username or password",
            Error::BackendUnavailable(_) => "Authentication service unavailable",
            e if e.is_session_rejection() => "Not authenticated",
            e => {
                error!("Request failed: {}", e);
                "Internal server error"
            }
        };

        (
            status,
            Json(ErrorBody {
                error: err.code(),
                message,
            }),
        )
            .into_response()
    }
}

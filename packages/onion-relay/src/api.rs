//! JSON error responses shared by every router.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use onion_core::Error;

/// Code carried by [`ApiError::BadRequest`]. Below every core error code.
pub const REQUEST_INVALID_CODE: i32 = 100;

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: i32,
}

/// An error on its way out of a handler.
#[derive(Debug)]
pub enum ApiError {
    /// A protocol error from the core
    Core(Error),
    /// The request itself was unusable
    BadRequest(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(e) => match e {
                Error::KeyUnwrapFailed(_)
                | Error::PayloadDecryptFailed(_)
                | Error::InvalidAddress(_)
                | Error::DecryptionFailed(_) => StatusCode::BAD_REQUEST,
                Error::DirectoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                Error::ForwardingFailed(_) => StatusCode::BAD_GATEWAY,
                Error::InsufficientNodes { .. }
                | Error::OnionBuildFailed(_)
                | Error::InvalidKey(_)
                | Error::EncryptionFailed(_)
                | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::BadRequest(message) => ErrorBody {
                error: message.clone(),
                code: REQUEST_INVALID_CODE,
            },
            ApiError::Core(e) => ErrorBody {
                error: e.to_string(),
                code: e.code(),
            },
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = ?self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = ?self, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::KeyUnwrapFailed("x".into()), StatusCode::BAD_REQUEST),
            (Error::PayloadDecryptFailed("x".into()), StatusCode::BAD_REQUEST),
            (Error::InvalidAddress("x".into()), StatusCode::BAD_REQUEST),
            (
                Error::InsufficientNodes {
                    required: 3,
                    available: 1,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::OnionBuildFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::DirectoryUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::ForwardingFailed("x".into()), StatusCode::BAD_GATEWAY),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
        assert_eq!(
            ApiError::BadRequest("empty".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_body_carries_core_code() {
        let body = ApiError::from(Error::ForwardingFailed("down".into())).body();
        assert_eq!(body.code, 600);
        assert!(body.error.contains("down"));

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("error").is_some());
        assert!(json.get("code").is_some());
    }

    #[test]
    fn test_bad_request_code_is_distinct() {
        let body = ApiError::BadRequest("empty".into()).body();
        assert_eq!(body.code, REQUEST_INVALID_CODE);

        let unwrap_failure = ApiError::from(Error::KeyUnwrapFailed("x".into())).body();
        assert_eq!(unwrap_failure.code, 400);
        assert_ne!(body.code, unwrap_failure.code);
    }
}

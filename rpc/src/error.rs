//! RPC error types and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradepost_exchange::{ErrorCategory, ExchangeError};
use tradepost_verification::VerificationError;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `ReplayOrInvalid`.
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("verifier {0} is not trusted")]
    UnauthorizedVerifier(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn category_status(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::Signature => StatusCode::UNAUTHORIZED,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Replay | ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Expired => StatusCode::GONE,
        ErrorCategory::Proximity => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl RpcError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            RpcError::Exchange(e) => (category_status(e.category()), e.code()),
            RpcError::Verification(e) => {
                let status = match e {
                    VerificationError::IdentityNotFound(_) => StatusCode::NOT_FOUND,
                    VerificationError::EmptyVerifier => StatusCode::BAD_REQUEST,
                    VerificationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
            RpcError::UnauthorizedVerifier(_) => (StatusCode::FORBIDDEN, "UnauthorizedVerifier"),
            RpcError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "InvalidRequest"),
            RpcError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal"),
        }
    }

    fn distance_m(&self) -> Option<f64> {
        match self {
            RpcError::Exchange(e) => e.distance_m(),
            _ => None,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage and runtime failures stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal server error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
            distance_m: self.distance_m(),
        };
        (status, Json(body)).into_response()
    }
}

//! Mapping of credit errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clubcredit_core::CreditError;
use serde::Serialize;

/// Errors that can occur in player and staff API handlers.
#[derive(Debug)]
pub(crate) enum ApiError {
    Credit(CreditError),
    /// Id from the path that does not resolve.
    NotFound(&'static str),
}

impl From<CreditError> for ApiError {
    fn from(err: CreditError) -> Self {
        ApiError::Credit(err)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Credit(err) => match err {
                CreditError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
                CreditError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                CreditError::AlreadyDecided(_) => (StatusCode::CONFLICT, "already_decided"),
                CreditError::AlreadyProcessed(_) => (StatusCode::CONFLICT, "already_processed"),
                CreditError::InsufficientCredit { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_credit")
                }
                CreditError::CreditLimitExceeded { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "credit_limit_exceeded")
                }
                CreditError::Ineligible { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "ineligible"),
                CreditError::NotEligible(_) => (StatusCode::UNPROCESSABLE_ENTITY, "not_eligible"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();
        let message = match self {
            ApiError::Credit(err) => err.to_string(),
            ApiError::NotFound(kind) => format!("{kind} not found"),
        };
        tracing::debug!(%status, error, %message, "API request rejected");
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

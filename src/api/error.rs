//! Error responses.
//!
//! Every failure leaves the API as `{ "error": true, "code": ..., "message": ... }`
//! with a status picked from the [`ErrorKind`] of the underlying error.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{CommerceError, ErrorKind};

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", "admin role required")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CommerceError> for ApiError {
    fn from(e: CommerceError) -> Self {
        let status = status_for(e.kind());
        if status.is_server_error() {
            // Storage details stay in the logs.
            tracing::error!(code = e.code(), error = %e, "request failed");
            return Self::new(status, e.code(), "internal server error");
        }
        Self::new(status, e.code(), e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorEnvelope<'a> {
            error: bool,
            code: &'a str,
            message: &'a str,
        }

        let envelope = ErrorEnvelope {
            error: true,
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Money;

    #[test]
    fn test_status_mapping() {
        let missing = ApiError::from(CommerceError::CouponNotFound);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let invalid = ApiError::from(CommerceError::InvalidOrderStatus("LOST".into()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        let min = CommerceError::MinOrderNotMet {
            subtotal: Money::from_major(80),
            minimum: Money::from_major(100),
        };
        let err = ApiError::from(min);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "min_order_not_met");
    }

    #[test]
    fn test_duplicate_address_is_conflict() {
        let err = ApiError::from(CommerceError::AddressAlreadyExists);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "address_already_exists");
    }

    #[test]
    fn test_storage_message_hidden() {
        let err = ApiError::from(CommerceError::Storage("connection refused".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal server error");
    }
}

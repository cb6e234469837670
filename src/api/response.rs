//! Success envelope: `{ "error": false, "message": ..., "response": ... }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::error::ApiError;

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: &'static str,
    body: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: &'static str, body: T) -> Self {
        Self {
            status: StatusCode::OK,
            message,
            body: Some(body),
        }
    }

    pub fn created(message: &'static str, body: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message,
            body: Some(body),
        }
    }
}

impl ApiResponse<()> {
    /// A success with nothing to return.
    pub fn done(message: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            message,
            body: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct Envelope<'a, T> {
            error: bool,
            message: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            response: Option<T>,
        }

        let envelope = Envelope {
            error: false,
            message: self.message,
            response: self.body,
        };
        (self.status, Json(envelope)).into_response()
    }
}

//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::ServiceError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed input
    #[error("{0}")]
    Validation(String),

    /// Requester may not perform the operation
    #[error("{0}")]
    Unauthorized(String),

    /// No matching record
    #[error("{0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("too many requests")]
    TooManyRequests,

    /// Any other failure reported back as a client error
    #[error("{message}")]
    BadRequest { key: &'static str, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "ErrInvalidRequest",
            ApiError::Unauthorized(_) => "ErrUnauthorized",
            ApiError::NotFound(_) => "ErrRecordNotFound",
            ApiError::TooManyRequests => "ErrTooManyRequests",
            ApiError::BadRequest { key, .. } => *key,
        }
    }

    /// Collapse any service failure into a plain client error
    pub fn client(err: ServiceError) -> Self {
        let key = match &err {
            ServiceError::NotFound => "ErrRecordNotFound",
            ServiceError::EmailExists => "ErrEmailExisted",
            ServiceError::InvalidCredentials => "ErrEmailOrPasswordInvalid",
            ServiceError::Database(e) => {
                error!("Database failure: {}", e);
                return ApiError::BadRequest {
                    key: "ErrDB",
                    message: "something went wrong with the database".to_string(),
                };
            }
            ServiceError::PasswordHash(_) | ServiceError::Token(_) => {
                error!("Internal failure: {}", err);
                return ApiError::BadRequest {
                    key: "ErrInternal",
                    message: "something went wrong with the server".to_string(),
                };
            }
        };

        ApiError::BadRequest {
            key,
            message: err.to_string(),
        }
    }
}

/// Keeps `NotFound` apart, everything else becomes a client error
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => ApiError::NotFound("user not found".to_string()),
            other => ApiError::client(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = Json(json!({
            "status_code": status.as_u16(),
            "error": self.to_string(),
            "key": self.key(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

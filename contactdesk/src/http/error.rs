use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Contact,
    User,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Contact => f.write_str("Contact"),
            Resource::User => f.write_str("User"),
        }
    }
}

/// Every failure a route can report. Anything that is not a missing record or
/// a credential mismatch is a server error carrying the raw cause.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// CRUD failure: `{ "error": context, "details": detail }`.
    #[error("{context}: {detail}")]
    Failed { context: &'static str, detail: String },
    /// Signup/login failure: `{ "message": context, "error": detail }`.
    #[error("{context}: {detail}")]
    AuthFailed { context: &'static str, detail: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Failed { .. } | ApiError::AuthFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::NotFound(resource) => {
                debug!(resource = %resource, "record not found");
                json!({ "message": format!("{resource} not found") })
            }
            ApiError::InvalidCredentials => json!({ "message": "Invalid credentials" }),
            ApiError::Failed { context, detail } => {
                error!(context, detail = %detail, "request failed");
                json!({ "error": context, "details": detail })
            }
            ApiError::AuthFailed { context, detail } => {
                error!(context, detail = %detail, "auth request failed");
                json!({ "message": context, "error": detail })
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Attach a route's failure context to any displayable error.
pub trait OrFail<T> {
    fn or_fail(self, context: &'static str) -> Result<T, ApiError>;

    fn or_auth_fail(self, context: &'static str) -> Result<T, ApiError>;
}

impl<T, E: fmt::Display> OrFail<T> for Result<T, E> {
    fn or_fail(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|err| ApiError::Failed {
            context,
            detail: err.to_string(),
        })
    }

    fn or_auth_fail(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|err| ApiError::AuthFailed {
            context,
            detail: err.to_string(),
        })
    }
}

//! The closed error taxonomy for the gateway and backend services.
//!
//! Every failure a handler can surface is one of these variants, and the
//! mapping to HTTP status + JSON body happens exactly once, in the
//! [`IntoResponse`] impl. Credential failures keep the 401/403 distinction,
//! registry and transport failures degrade to a generic 500 that names only
//! the unavailable logical service, and downstream error responses pass
//! through verbatim.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{auth::TokenError, core::routes::LogicalService};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// No `Authorization` header on a protected route.
    #[error("no token provided")]
    NoToken,

    /// A token was presented but failed signature or expiry checks.
    #[error("failed to authenticate token")]
    BadToken,

    /// The caller's role does not satisfy the route's capability.
    #[error("forbidden")]
    Forbidden,

    /// The registry could not produce a live instance for this service.
    #[error("{} service not available", .0.display_name())]
    Unavailable(LogicalService),

    /// The resolved backend could not be reached (connect/reset/timeout).
    #[error("upstream request failed")]
    Transport,

    /// The backend answered with an error status; status and body are
    /// relayed verbatim. `body` is `None` when the backend body was absent
    /// or not JSON, in which case a generic envelope is substituted.
    #[error("upstream responded {status}")]
    Backend {
        status: StatusCode,
        body: Option<Value>,
    },

    /// Login rejected. The message never says whether the username exists.
    #[error("{0}")]
    Unauthorized(String),

    /// Required request fields missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation (duplicate username).
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected. Detail is logged, never sent to the client.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoToken | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadToken | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Unavailable(_) | ApiError::Transport | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Backend { status, .. } => *status,
            // The observed system reports uniqueness violations as 400s,
            // not 409s; kept as-is for client compatibility.
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn body(&self) -> Value {
        match self {
            ApiError::NoToken => json!({ "message": "No token provided" }),
            ApiError::BadToken => json!({ "message": "Failed to authenticate token" }),
            // Never reveals which capability was required.
            ApiError::Forbidden => json!({ "message": "Forbidden" }),
            ApiError::Unavailable(service) => {
                json!({ "message": format!("{} service not available", service.display_name()) })
            }
            ApiError::Transport => json!({ "message": "Upstream service request failed" }),
            ApiError::Backend { body, .. } => body
                .clone()
                .unwrap_or_else(|| json!({ "message": "Upstream error" })),
            ApiError::Unauthorized(message)
            | ApiError::Validation(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => json!({ "message": message }),
            ApiError::Internal => json!({ "message": "Internal server error" }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Missing => ApiError::NoToken,
            TokenError::Invalid => ApiError::BadToken,
        }
    }
}

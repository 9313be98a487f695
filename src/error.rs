use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Domain errors reported to the caller with enough detail to correct the
/// request. `Internal` is the one exception: its cause is logged server-side
/// and the response carries only a generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{field} is already taken")]
    Duplicate { field: &'static str },
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid username/email or password")]
    InvalidCredentials,
    #[error("Invalid token")]
    TokenInvalid,
    #[error("Token expired. Please log in again.")]
    TokenExpired,
    #[error("User not found or inactive")]
    InactiveAccount,
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error("{0} must be a number")]
    InvalidOperand(&'static str),
    #[error("Cannot divide by zero")]
    DivisionByZero,
    #[error("Cannot calculate square root of a negative number")]
    NegativeOperand,
    #[error("The result is not a finite number")]
    NonFiniteResult,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Duplicate { .. } => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials
            | ApiError::TokenInvalid
            | ApiError::TokenExpired
            | ApiError::InactiveAccount => StatusCode::UNAUTHORIZED,
            ApiError::Validation { .. }
            | ApiError::InvalidOperand(_)
            | ApiError::DivisionByZero
            | ApiError::NegativeOperand
            | ApiError::NonFiniteResult => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable label used as the `error` field of the envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Duplicate { .. } => "Duplicate value",
            ApiError::NotFound(_) => "Not found",
            ApiError::InvalidCredentials => "Invalid credentials",
            ApiError::TokenInvalid | ApiError::TokenExpired | ApiError::InactiveAccount => {
                "Access denied"
            }
            ApiError::Validation { .. } => "Validation failed",
            ApiError::InvalidOperand(_) => "Invalid operand",
            ApiError::DivisionByZero => "Division by zero",
            ApiError::NegativeOperand => "Invalid operand",
            ApiError::NonFiniteResult => "Invalid result",
            ApiError::Internal(_) => "Internal server error",
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            // The unique constraints are the source of truth for identity
            // collisions; handler-level checks are only a fast path.
            if db.is_unique_violation() {
                let field = match db.constraint() {
                    Some("users_username_key") => "username",
                    Some("users_email_key") => "email",
                    _ => "identity",
                };
                return ApiError::Duplicate { field };
            }
        }
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(cause) = &self {
            error!(error = ?cause, "internal error");
            let body = json!({
                "success": false,
                "error": "Internal server error",
                "message": "Something went wrong on the server",
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }

        let mut body = json!({
            "success": false,
            "error": self.kind(),
            "message": self.to_string(),
        });
        if let ApiError::Validation { field, .. } = &self {
            body["field"] = json!(field);
        }
        (self.status(), Json(body)).into_response()
    }
}

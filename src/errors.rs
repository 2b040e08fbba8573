use crate::services::provisioner::ProvisionError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// Map provisioning errors onto the HTTP surface: validation problems are
/// the caller's fault, not-found is diagnosable, remote failures are a bad
/// gateway, and a failed rollback is a server-side state needing an
/// operator.
impl From<ProvisionError> for AppError {
    fn from(err: ProvisionError) -> Self {
        let status = match &err {
            ProvisionError::Statement(_)
            | ProvisionError::Username(_)
            | ProvisionError::NoChangeRequested => StatusCode::BAD_REQUEST,
            ProvisionError::UserNotFound(_)
            | ProvisionError::OrganizationNotFound(_)
            | ProvisionError::BucketNotFound(_) => StatusCode::NOT_FOUND,
            ProvisionError::Connection(_) | ProvisionError::Remote { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ProvisionError::RollbackFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::new(status, err.to_string())
    }
}

//! HTTP handlers for the credential lifecycle endpoints.
//! Thin decode/encode shims over the `DatabaseBackend` capability set; all
//! provisioning logic lives in the service layer.

use crate::{
    errors::AppError,
    services::provisioner::{DatabaseBackend, Provisioner},
    services::username::UsernameMetadata,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

/// Request body for `POST /v1/creds`.
#[derive(Debug, Deserialize)]
pub struct NewUserBody {
    #[serde(default)]
    pub username_metadata: UsernameMetadata,
    #[serde(default)]
    pub statements: Vec<String>,
    pub password: String,
}

/// Request body for `POST /v1/creds/{username}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
    pub password: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

/// `POST /v1/creds` — provision a new set of credentials.
///
/// Only the generated username is returned; the caller already holds the
/// password and the remote identity handle stays internal.
pub async fn new_user(
    State(backend): State<Provisioner>,
    Json(body): Json<NewUserBody>,
) -> Result<impl IntoResponse, AppError> {
    let username = backend
        .new_user(body.username_metadata, &body.statements, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "username": username }))))
}

/// `POST /v1/creds/{username}` — rotate the password and/or move expiration.
pub async fn update_user(
    State(backend): State<Provisioner>,
    Path(username): Path<String>,
    Json(body): Json<UpdateUserBody>,
) -> Result<impl IntoResponse, AppError> {
    backend
        .update_user(&username, body.password.as_deref(), body.expiration)
        .await?;
    Ok((StatusCode::OK, Json(json!({ "status": "ok" }))))
}

/// `DELETE /v1/creds/{username}` — revoke credentials.
pub async fn delete_user(
    State(backend): State<Provisioner>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    backend.delete_user(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/type` — fixed identifier for this backend type.
pub async fn backend_type(State(backend): State<Provisioner>) -> impl IntoResponse {
    Json(json!({ "type": backend.backend_type() }))
}

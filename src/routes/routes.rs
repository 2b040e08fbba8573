//! Defines routes for the credential provisioning API.
//!
//! ## Structure
//! - **Credential endpoints**
//!   - `POST   /v1/creds`            — provision a new user
//!   - `POST   /v1/creds/{username}` — rotate password / move expiration
//!   - `DELETE /v1/creds/{username}` — revoke a user
//!
//! - **Metadata endpoints**
//!   - `GET /v1/type` — fixed backend type identifier
//!   - `GET /healthz` — liveness
//!   - `GET /readyz`  — readiness (remote health ping)

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        user_handlers::{backend_type, delete_user, new_user, update_user},
    },
    services::provisioner::Provisioner,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for the credential API.
///
/// The router carries shared state (`Provisioner`) to all handlers.
pub fn routes() -> Router<Provisioner> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // credential lifecycle
        .route("/v1/creds", post(new_user))
        .route("/v1/creds/{username}", post(update_user).delete(delete_user))
        // backend metadata
        .route("/v1/type", get(backend_type))
}

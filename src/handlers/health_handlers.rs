//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that pings the remote InfluxDB instance

use crate::services::provisioner::Provisioner;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that pings the remote instance's health endpoint through
/// the shared connection handle. Returns JSON describing the check,
/// HTTP 200 when it passes, HTTP 503 when it fails.
pub async fn readyz(State(backend): State<Provisioner>) -> impl IntoResponse {
    let influx_check = match backend.ping().await {
        Ok(()) => (true, None::<String>),
        Err(err) => (false, Some(err.to_string())),
    };

    let influx_ok = influx_check.0;
    let mut checks = HashMap::new();
    checks.insert(
        "influxdb",
        CheckStatus {
            ok: influx_ok,
            error: influx_check.1,
        },
    );

    let body = ReadyResponse {
        status: if influx_ok { "ok".into() } else { "error".into() },
        checks,
    };

    let status = if influx_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

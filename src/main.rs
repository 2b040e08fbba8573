use anyhow::{Context, Result};
use axum::Router;
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use services::connection::ConnectionConfig;
use services::provisioner::Provisioner;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    // The admin token stays out of the logs.
    tracing::info!(
        "Starting influx-credentials on {} against {}",
        cfg.addr(),
        cfg.influx_url
    );

    // --- Initialize the credential backend ---
    // Validates the username template with a trial render; a backend with an
    // unusable template never comes up.
    let backend = Provisioner::initialize(
        ConnectionConfig {
            url: cfg.influx_url.clone(),
            token: cfg.influx_token.clone(),
        },
        cfg.username_template.as_deref(),
    )
    .context("initializing credential backend")?;

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(backend);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

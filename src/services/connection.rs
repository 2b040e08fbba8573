//! Connection accessor for the administrative InfluxDB handle.
//!
//! The handle is created lazily on first use, cached for subsequent calls,
//! invalidated when the configuration changes, and dropped on close. The
//! producer itself is not thread-safe; the provisioner guards it with a
//! single mutex held for the duration of each lifecycle operation.

use crate::services::influx::{HttpInfluxClient, InfluxClient, InfluxError};
use std::sync::Arc;

/// Endpoint and admin token for the remote instance.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub url: String,
    pub token: String,
}

pub struct ConnectionProducer {
    config: ConnectionConfig,
    client: Option<Arc<dyn InfluxClient>>,
}

impl ConnectionProducer {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Return the cached client handle, building it on first use.
    pub fn connection(&mut self) -> Result<Arc<dyn InfluxClient>, InfluxError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client: Arc<dyn InfluxClient> =
            Arc::new(HttpInfluxClient::new(&self.config.url, &self.config.token)?);
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Replace the configuration and drop the cached handle so the next
    /// call builds a fresh one.
    pub fn reconfigure(&mut self, config: ConnectionConfig) {
        self.config = config;
        self.client = None;
    }

    /// Drop the cached handle.
    pub fn close(&mut self) {
        self.client = None;
    }

    /// Seed the cache with a pre-built client. Used by tests to substitute
    /// an in-memory double for the HTTP client.
    #[cfg(test)]
    pub(crate) fn with_client(client: Arc<dyn InfluxClient>) -> Self {
        Self {
            config: ConnectionConfig {
                url: String::new(),
                token: String::new(),
            },
            client: Some(client),
        }
    }
}

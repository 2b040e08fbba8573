//! HTTP handlers: health probes and the credential lifecycle endpoints.

pub mod health_handlers;
pub mod user_handlers;

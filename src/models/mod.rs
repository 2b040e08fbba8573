//! Core data models for the credential provisioning service.
//!
//! `statement` holds the caller-supplied creation statement and its parser;
//! `remote` mirrors the InfluxDB v2 objects this service creates and links.

pub mod remote;
pub mod statement;

//! Service layer: the provisioning core and its collaborators.
//!
//! `provisioner` owns the create/rotate/revoke lifecycle; `connection`
//! supplies the cached admin handle; `influx` is the outbound client
//! boundary; `username` renders principal names from a template.

pub mod connection;
pub mod influx;
pub mod provisioner;
pub mod username;

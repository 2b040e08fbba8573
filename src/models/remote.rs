//! Objects managed on the remote InfluxDB v2 instance.
//!
//! Nothing here is persisted locally — the remote system is the sole source
//! of truth. These structs mirror the JSON shapes of the `/api/v2` REST API
//! and exist only for the duration of a single provisioning call.

use serde::{Deserialize, Serialize};

/// A database user (principal) on the remote system.
///
/// `id` is the opaque identity handle the remote system assigns at creation;
/// every later call (password set, membership, deletion) addresses the user
/// by this handle, not by name.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// An organization, resolved by name before membership is granted.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

/// A bucket inside an organization.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Bucket {
    pub id: String,
    pub name: String,
}

/// Action half of a permission entry.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Read,
    Write,
}

/// Resource half of a permission entry. Only the bucket resource type is
/// granted by this service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PermissionResource {
    #[serde(rename = "type")]
    pub resource_type: String,
}

pub const RESOURCE_TYPE_BUCKETS: &str = "buckets";

/// A single permission entry scoped to a resource type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Permission {
    pub action: PermissionAction,
    pub resource: PermissionResource,
}

impl Permission {
    /// A read or write permission scoped to the bucket resource type.
    pub fn buckets(action: PermissionAction) -> Self {
        Self {
            action,
            resource: PermissionResource {
                resource_type: RESOURCE_TYPE_BUCKETS.to_string(),
            },
        }
    }
}

/// The remote object binding a user, an organization, and a permission set.
///
/// Created exactly once per successful provisioning, as the final step of
/// the sequence. `id` is absent on the request and filled in by the remote
/// system on the response.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Authorization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "orgID")]
    pub org_id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub permissions: Vec<Permission>,
}

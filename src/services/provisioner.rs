//! Credential provisioner — the create/rotate/revoke lifecycle for dynamic
//! InfluxDB v2 users.
//!
//! Creating a user is a strict ordered sequence of remote calls (create
//! user, set password, resolve org, add org member, resolve bucket, add
//! bucket member, create authorization) against a system with no
//! multi-statement transactions. Any step can fail after earlier steps
//! succeeded; the only compensating action the remote system offers is
//! deleting the user, which cascades over its memberships and
//! authorizations. Every post-creation step therefore shares one rollback
//! contract: attempt the delete, and if that also fails surface both causes.

use crate::models::remote::{Authorization, User};
use crate::models::statement::{StatementError, parse_creation_statements};
use crate::services::connection::{ConnectionConfig, ConnectionProducer};
use crate::services::influx::{InfluxClient, InfluxError};
use crate::services::username::{
    DEFAULT_USERNAME_TEMPLATE, TemplateError, UsernameMetadata, UsernameTemplate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Fixed identifier for this backend type.
pub const INFLUXDB_TYPE_NAME: &str = "influxdbv2";

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Statement(#[from] StatementError),
    #[error("failed to generate username: {0}")]
    Username(#[from] TemplateError),
    #[error("no changes requested")]
    NoChangeRequested,
    #[error("unable to get connection: {0}")]
    Connection(#[source] InfluxError),
    #[error("failed to run {call} in InfluxDB: {source}")]
    Remote {
        call: &'static str,
        #[source]
        source: InfluxError,
    },
    #[error("user `{0}` not found")]
    UserNotFound(String),
    #[error("organization `{0}` not found")]
    OrganizationNotFound(String),
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    /// Both the original step and the compensating delete failed: the remote
    /// system now holds an orphaned user and an operator must intervene.
    #[error("failed to roll back user creation in InfluxDB: {original} : {rollback}")]
    RollbackFailed {
        original: Box<ProvisionError>,
        rollback: InfluxError,
    },
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Capability set of a credential backend: mint, rotate, revoke, identify.
/// Exactly one conforming implementation exists in this crate.
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    async fn new_user(
        &self,
        metadata: UsernameMetadata,
        statements: &[String],
        password: &str,
    ) -> ProvisionResult<String>;

    async fn update_user(
        &self,
        username: &str,
        new_password: Option<&str>,
        new_expiration: Option<DateTime<Utc>>,
    ) -> ProvisionResult<()>;

    async fn delete_user(&self, username: &str) -> ProvisionResult<()>;

    fn backend_type(&self) -> &'static str;
}

/// The one conforming `DatabaseBackend`.
///
/// The connection producer is the only shared mutable resource; a single
/// mutex held for the duration of each lifecycle operation guarantees the
/// handle is not reconfigured or replaced mid-sequence, at the cost of
/// serializing otherwise-independent operations.
#[derive(Clone)]
pub struct Provisioner {
    conn: Arc<Mutex<ConnectionProducer>>,
    template: UsernameTemplate,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    /// Build the backend from its configuration.
    ///
    /// An absent or empty `username_template` falls back to the built-in
    /// default. The template is validated here by a trial render with empty
    /// metadata so a backend with an unusable template never comes up.
    pub fn initialize(
        connection: ConnectionConfig,
        username_template: Option<&str>,
    ) -> ProvisionResult<Self> {
        let raw = match username_template {
            Some(template) if !template.is_empty() => template,
            _ => DEFAULT_USERNAME_TEMPLATE,
        };
        let template = UsernameTemplate::parse(raw)?;
        template.generate(&UsernameMetadata::default())?;

        Ok(Self {
            conn: Arc::new(Mutex::new(ConnectionProducer::new(connection))),
            template,
        })
    }

    /// Ping the remote health endpoint through the shared handle.
    pub async fn ping(&self) -> ProvisionResult<()> {
        let mut conn = self.conn.lock().await;
        let cli = conn.connection().map_err(ProvisionError::Connection)?;
        cli.health().await.map_err(|err| remote("health", err))
    }

    #[cfg(test)]
    fn with_client(client: Arc<dyn InfluxClient>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(ConnectionProducer::with_client(client))),
            template: UsernameTemplate::parse(DEFAULT_USERNAME_TEMPLATE).unwrap(),
        }
    }
}

#[async_trait]
impl DatabaseBackend for Provisioner {
    async fn new_user(
        &self,
        metadata: UsernameMetadata,
        statements: &[String],
        password: &str,
    ) -> ProvisionResult<String> {
        let mut conn = self.conn.lock().await;
        let cli = conn.connection().map_err(ProvisionError::Connection)?;

        let username = self.template.generate(&metadata)?;
        let stmt = parse_creation_statements(statements)?;

        // Nothing exists on the remote side yet, so a failure here needs no
        // compensating action.
        let user = cli
            .create_user(&username)
            .await
            .map_err(|err| remote("create user", err))?;

        checkpoint(
            cli.as_ref(),
            &user,
            cli.set_user_password(&user.id, password).await,
            "set password",
        )
        .await?;

        let organization = checkpoint(
            cli.as_ref(),
            &user,
            cli.find_organization_by_name(&stmt.organization).await,
            "find organization",
        )
        .await?;

        checkpoint(
            cli.as_ref(),
            &user,
            cli.add_org_member(&organization.id, &user.id).await,
            "add organization member",
        )
        .await?;

        let bucket = checkpoint(
            cli.as_ref(),
            &user,
            cli.find_bucket_by_name(&stmt.bucket).await,
            "find bucket",
        )
        .await?;

        checkpoint(
            cli.as_ref(),
            &user,
            cli.add_bucket_member(&bucket.id, &user.id).await,
            "add bucket member",
        )
        .await?;

        let authorization = Authorization {
            id: None,
            org_id: organization.id.clone(),
            user_id: user.id.clone(),
            permissions: stmt.permissions(),
        };
        checkpoint(
            cli.as_ref(),
            &user,
            cli.create_authorization(&authorization).await,
            "create authorization",
        )
        .await?;

        info!(
            username = %username,
            organization = %stmt.organization,
            bucket = %stmt.bucket,
            "provisioned credentials"
        );
        Ok(username)
    }

    async fn update_user(
        &self,
        username: &str,
        new_password: Option<&str>,
        new_expiration: Option<DateTime<Utc>>,
    ) -> ProvisionResult<()> {
        if new_password.is_none() && new_expiration.is_none() {
            return Err(ProvisionError::NoChangeRequested);
        }

        let mut conn = self.conn.lock().await;

        if let Some(password) = new_password {
            let cli = conn.connection().map_err(ProvisionError::Connection)?;
            let user = cli
                .find_user_by_name(username)
                .await
                .map_err(|err| remote("find user", err))?;
            cli.set_user_password(&user.id, password)
                .await
                .map_err(|err| remote("set password", err))?;
            info!(username = %username, "rotated password");
        }

        // Expiration alone is a documented no-op: InfluxDB does not enforce
        // it, so callers relying on expiration must revoke through external
        // scheduling.
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> ProvisionResult<()> {
        let mut conn = self.conn.lock().await;
        let cli = conn.connection().map_err(ProvisionError::Connection)?;

        let user = cli
            .find_user_by_name(username)
            .await
            .map_err(|err| remote("find user", err))?;
        cli.delete_user(&user.id)
            .await
            .map_err(|err| remote("delete user", err))?;

        info!(username = %username, "revoked credentials");
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        INFLUXDB_TYPE_NAME
    }
}

/// Map a remote-call error into its surfaced form, keeping not-found cases
/// user-diagnosable instead of folding them into a generic failure.
fn remote(call: &'static str, err: InfluxError) -> ProvisionError {
    match err {
        InfluxError::UserNotFound(name) => ProvisionError::UserNotFound(name),
        InfluxError::OrganizationNotFound(name) => ProvisionError::OrganizationNotFound(name),
        InfluxError::BucketNotFound(name) => ProvisionError::BucketNotFound(name),
        other => ProvisionError::Remote { call, source: other },
    }
}

/// Pass a step result through, rolling back the created user on failure.
async fn checkpoint<T>(
    cli: &dyn InfluxClient,
    user: &User,
    result: Result<T, InfluxError>,
    call: &'static str,
) -> ProvisionResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => Err(undo_create(cli, user, remote(call, err)).await),
    }
}

/// Single compensating action: delete the created user. One attempt, no
/// retries. Returns the original error when the delete succeeds, or an error
/// naming both causes when it does not — a swallowed rollback failure would
/// hide an orphaned user from the operator.
async fn undo_create(cli: &dyn InfluxClient, user: &User, original: ProvisionError) -> ProvisionError {
    match cli.delete_user(&user.id).await {
        Ok(()) => {
            warn!(username = %user.name, error = %original, "rolled back user creation");
            original
        }
        Err(rollback) => ProvisionError::RollbackFailed {
            original: Box::new(original),
            rollback,
        },
    }
}

//! Outbound interface to the remote InfluxDB v2 instance.
//!
//! `InfluxClient` is the capability set the provisioner needs: the nine
//! remote calls of the provisioning lifecycle plus a health ping for the
//! readiness probe. `HttpInfluxClient` implements it against the `/api/v2`
//! REST API with an admin token.

use crate::models::remote::{Authorization, Bucket, Organization, User};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfluxError {
    #[error("user `{0}` not found")]
    UserNotFound(String),
    #[error("organization `{0}` not found")]
    OrganizationNotFound(String),
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("InfluxDB returned {status} on {call}: {message}")]
    Api {
        call: &'static str,
        status: u16,
        message: String,
    },
    #[error("request to InfluxDB failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type InfluxResult<T> = Result<T, InfluxError>;

/// The remote calls the provisioner issues against InfluxDB v2.
///
/// Each is a single synchronous (from the caller's point of view) remote
/// call returning a result object or an error. Find-by-name misses surface
/// as the typed not-found variants rather than generic API errors.
#[async_trait]
pub trait InfluxClient: Send + Sync {
    async fn create_user(&self, name: &str) -> InfluxResult<User>;
    async fn delete_user(&self, user_id: &str) -> InfluxResult<()>;
    async fn find_user_by_name(&self, name: &str) -> InfluxResult<User>;
    async fn set_user_password(&self, user_id: &str, password: &str) -> InfluxResult<()>;
    async fn find_organization_by_name(&self, name: &str) -> InfluxResult<Organization>;
    async fn add_org_member(&self, org_id: &str, user_id: &str) -> InfluxResult<()>;
    async fn find_bucket_by_name(&self, name: &str) -> InfluxResult<Bucket>;
    async fn add_bucket_member(&self, bucket_id: &str, user_id: &str) -> InfluxResult<()>;
    async fn create_authorization(&self, auth: &Authorization) -> InfluxResult<Authorization>;
    async fn health(&self) -> InfluxResult<()>;
}

/// reqwest-backed client for a single InfluxDB v2 endpoint.
pub struct HttpInfluxClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Deserialize)]
struct OrgsEnvelope {
    #[serde(default)]
    orgs: Vec<Organization>,
}

#[derive(Deserialize)]
struct BucketsEnvelope {
    #[serde(default)]
    buckets: Vec<Bucket>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

impl HttpInfluxClient {
    pub fn new(base_url: &str, token: &str) -> InfluxResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("Authorization", format!("Token {}", self.token))
    }

    /// Map a non-success response into `InfluxError::Api`, carrying the
    /// remote error message when the body has one.
    async fn check(call: &'static str, response: reqwest::Response) -> InfluxResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) if !body.message.is_empty() => body.message,
            _ => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        Err(InfluxError::Api {
            call,
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl InfluxClient for HttpInfluxClient {
    async fn create_user(&self, name: &str) -> InfluxResult<User> {
        let response = self
            .request(reqwest::Method::POST, "/api/v2/users")
            .json(&json!({ "name": name }))
            .send()
            .await?;
        Ok(Self::check("create user", response).await?.json().await?)
    }

    async fn delete_user(&self, user_id: &str) -> InfluxResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/api/v2/users/{user_id}"))
            .send()
            .await?;
        Self::check("delete user", response).await?;
        Ok(())
    }

    async fn find_user_by_name(&self, name: &str) -> InfluxResult<User> {
        let response = self
            .request(reqwest::Method::GET, "/api/v2/users")
            .query(&[("name", name)])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(InfluxError::UserNotFound(name.to_string()));
        }
        let envelope: UsersEnvelope = Self::check("find user", response).await?.json().await?;
        envelope
            .users
            .into_iter()
            .find(|user| user.name == name)
            .ok_or_else(|| InfluxError::UserNotFound(name.to_string()))
    }

    async fn set_user_password(&self, user_id: &str, password: &str) -> InfluxResult<()> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v2/users/{user_id}/password"),
            )
            .json(&json!({ "password": password }))
            .send()
            .await?;
        Self::check("set password", response).await?;
        Ok(())
    }

    async fn find_organization_by_name(&self, name: &str) -> InfluxResult<Organization> {
        let response = self
            .request(reqwest::Method::GET, "/api/v2/orgs")
            .query(&[("org", name)])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(InfluxError::OrganizationNotFound(name.to_string()));
        }
        let envelope: OrgsEnvelope = Self::check("find organization", response).await?.json().await?;
        envelope
            .orgs
            .into_iter()
            .find(|org| org.name == name)
            .ok_or_else(|| InfluxError::OrganizationNotFound(name.to_string()))
    }

    async fn add_org_member(&self, org_id: &str, user_id: &str) -> InfluxResult<()> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v2/orgs/{org_id}/members"),
            )
            .json(&json!({ "id": user_id }))
            .send()
            .await?;
        Self::check("add organization member", response).await?;
        Ok(())
    }

    async fn find_bucket_by_name(&self, name: &str) -> InfluxResult<Bucket> {
        let response = self
            .request(reqwest::Method::GET, "/api/v2/buckets")
            .query(&[("name", name)])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(InfluxError::BucketNotFound(name.to_string()));
        }
        let envelope: BucketsEnvelope = Self::check("find bucket", response).await?.json().await?;
        envelope
            .buckets
            .into_iter()
            .find(|bucket| bucket.name == name)
            .ok_or_else(|| InfluxError::BucketNotFound(name.to_string()))
    }

    async fn add_bucket_member(&self, bucket_id: &str, user_id: &str) -> InfluxResult<()> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/api/v2/buckets/{bucket_id}/members"),
            )
            .json(&json!({ "id": user_id }))
            .send()
            .await?;
        Self::check("add bucket member", response).await?;
        Ok(())
    }

    async fn create_authorization(&self, auth: &Authorization) -> InfluxResult<Authorization> {
        let response = self
            .request(reqwest::Method::POST, "/api/v2/authorizations")
            .json(auth)
            .send()
            .await?;
        Ok(Self::check("create authorization", response)
            .await?
            .json()
            .await?)
    }

    async fn health(&self) -> InfluxResult<()> {
        let response = self.request(reqwest::Method::GET, "/health").send().await?;
        Self::check("health", response).await?;
        Ok(())
    }
}

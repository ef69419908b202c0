//! Contrail configuration API client
//!
//! Implements [`ContrailClientTrait`] over the REST API served by the Contrail
//! API server (default port 8082):
//! - `POST /fqname-to-id` resolves names,
//! - `GET|PUT|DELETE /<type>/<uuid>` addresses single objects,
//! - `POST /<type>s` creates.

use crate::common::{HttpClient, unwrap_envelope, wrap_envelope};
use crate::contrail_trait::ContrailClientTrait;
use crate::error::ContrailError;
use crate::models::{CreatedRef, ResourceKind};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default transport timeout for every API request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct FqNameToIdResponse {
    uuid: String,
}

/// Contrail API client
pub struct ContrailClient {
    http: HttpClient,
}

impl ContrailClient {
    /// Create a new Contrail client
    ///
    /// # Arguments
    /// * `base_url` - API server URL (e.g., "http://localhost:8082")
    /// * `token` - optional keystone token sent as `X-Auth-Token`
    /// * `timeout` - per-request transport timeout
    pub fn new(base_url: String, token: Option<String>, timeout: Duration) -> Result<Self, ContrailError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http: HttpClient::new(client, base_url, token),
        })
    }

    /// Create a client for `http://<server>:<port>` with the default timeout
    pub fn for_server(server: &str, port: u16) -> Result<Self, ContrailError> {
        Self::new(format!("http://{}:{}", server, port), None, DEFAULT_REQUEST_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl ContrailClientTrait for ContrailClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn uuid_by_name(&self, kind: ResourceKind, fq_name: &[String]) -> Result<String, ContrailError> {
        debug!("Resolving {} {}", kind, fq_name.join(":"));
        let body = serde_json::json!({
            "type": kind.type_name(),
            "fq_name": fq_name,
        });
        let response: FqNameToIdResponse = self.http.post("/fqname-to-id", &body).await?;
        Ok(response.uuid)
    }

    async fn read(&self, kind: ResourceKind, uuid: &str) -> Result<serde_json::Value, ContrailError> {
        let envelope: serde_json::Value = self.http.get(&format!("/{}/{}", kind.type_name(), uuid)).await?;
        unwrap_envelope(kind.type_name(), envelope)
    }

    async fn create(&self, kind: ResourceKind, object: serde_json::Value) -> Result<CreatedRef, ContrailError> {
        let body = wrap_envelope(kind.type_name(), object);
        let envelope: serde_json::Value = self.http.post(&format!("/{}", kind.collection()), &body).await?;
        let created = unwrap_envelope(kind.type_name(), envelope)?;
        Ok(serde_json::from_value(created)?)
    }

    async fn update(&self, kind: ResourceKind, uuid: &str, object: serde_json::Value) -> Result<(), ContrailError> {
        let body = wrap_envelope(kind.type_name(), object);
        self.http.put(&format!("/{}/{}", kind.type_name(), uuid), &body).await
    }

    async fn delete(&self, kind: ResourceKind, uuid: &str) -> Result<(), ContrailError> {
        self.http.delete(&format!("/{}/{}", kind.type_name(), uuid)).await
    }
}

//! Common utilities for the Contrail API client
//!
//! Provides the HTTP plumbing shared by every resource type: URL building,
//! the `{"<type>": {...}}` envelope, and status-code mapping.

use crate::error::ContrailError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client wrapper with optional keystone token
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        match &self.token {
            Some(token) => request.header("X-Auth-Token", token),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ContrailError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self.with_headers(self.client.get(&url)).send().await?;
        let response = check_status("GET", path, response).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ContrailError> {
        let url = self.build_url(path);
        debug!("POST {} with body: {}", url, body);

        let response = self.with_headers(self.client.post(&url)).json(body).send().await?;
        let response = check_status("POST", path, response).await?;
        Ok(response.json().await?)
    }

    /// Make a PUT request; the response body is ignored
    pub async fn put(&self, path: &str, body: &serde_json::Value) -> Result<(), ContrailError> {
        let url = self.build_url(path);
        debug!("PUT {} with body: {}", url, body);

        let response = self.with_headers(self.client.put(&url)).json(body).send().await?;
        check_status("PUT", path, response).await?;
        Ok(())
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ContrailError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self.with_headers(self.client.delete(&url)).send().await?;
        check_status("DELETE", path, response).await?;
        Ok(())
    }
}

/// Map a non-success status to the matching error variant
async fn check_status(method: &str, path: &str, response: Response) -> Result<Response, ContrailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(method, path, status, &body))
}

pub(crate) fn status_error(method: &str, path: &str, status: StatusCode, body: &str) -> ContrailError {
    let message = format!("{} {} failed: {} - {}", method, path, status, body.trim());
    match status {
        StatusCode::NOT_FOUND => ContrailError::NotFound(message),
        StatusCode::CONFLICT => ContrailError::Conflict(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ContrailError::Authentication(message),
        StatusCode::BAD_REQUEST => ContrailError::InvalidRequest(message),
        _ => ContrailError::Api(message),
    }
}

/// Wrap an object in its type envelope: `{"virtual-network": {...}}`
pub fn wrap_envelope(type_name: &str, object: serde_json::Value) -> serde_json::Value {
    let mut envelope = serde_json::Map::new();
    envelope.insert(type_name.to_string(), object);
    serde_json::Value::Object(envelope)
}

/// Strip the type envelope from a server response
pub fn unwrap_envelope(type_name: &str, mut envelope: serde_json::Value) -> Result<serde_json::Value, ContrailError> {
    match envelope.get_mut(type_name) {
        Some(object) => Ok(object.take()),
        None => Err(ContrailError::Api(format!(
            "response is missing the \"{}\" envelope: {}",
            type_name,
            envelope.to_string().chars().take(500).collect::<String>()
        ))),
    }
}

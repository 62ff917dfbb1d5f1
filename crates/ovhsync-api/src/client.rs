//! `ApiClient` trait and the reqwest-backed `RestClient`
//!
//! One method, one HTTP call. The reconciliation core never touches reqwest
//! directly; it goes through `ApiClient` so tests can substitute `MockClient`
//! and callers can substitute a signing client.

use crate::error::{ApiError, Result};
use async_trait::async_trait;
use serde_json::Value;

const OVH_API_BASE_EU: &str = "https://eu.api.ovh.com/v1";

/// HTTP verb for an API call.
///
/// `is_mutating` is what the dry-run guarantee is stated in terms of: under
/// preview mode the core never hands a mutating verb to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn is_mutating(self) -> bool {
        !matches!(self, Verb::Get)
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verb::Get => write!(f, "GET"),
            Verb::Post => write!(f, "POST"),
            Verb::Put => write!(f, "PUT"),
            Verb::Delete => write!(f, "DELETE"),
        }
    }
}

/// Client abstraction over the OVH control-plane API.
///
/// Contract: returns the decoded 2xx response body (`Value::Null` for empty
/// bodies), `ApiError::NotFound` for a 404, `ApiError::Remote` for any other
/// non-2xx. Implementations must not retry.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn call(&self, verb: Verb, path: &str, body: Option<Value>) -> Result<Value>;
}

/// Configuration for `RestClient`
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub endpoint: String,
    pub token: String,
}

impl RestConfig {
    /// Read endpoint and token from `OVHSYNC_ENDPOINT` / `OVHSYNC_TOKEN`.
    ///
    /// The endpoint defaults to the EU API base when unset; the token is
    /// required.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("OVHSYNC_ENDPOINT")
            .unwrap_or_else(|_| OVH_API_BASE_EU.to_string());
        let token = std::env::var("OVHSYNC_TOKEN")
            .map_err(|_| ApiError::MissingEnvVar("OVHSYNC_TOKEN".to_string()))?;

        Ok(Self { endpoint, token })
    }
}

/// Thin REST client for the OVH control plane.
///
/// Bearer token authentication only; the OVH application-signature scheme is
/// out of scope for this client.
pub struct RestClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl RestClient {
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token,
        }
    }
}

#[async_trait]
impl ApiClient for RestClient {
    async fn call(&self, verb: Verb, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.endpoint, path);

        tracing::debug!("{} {}", verb, url);

        let mut request = match verb {
            Verb::Get => self.client.get(&url),
            Verb::Post => self.client.post(&url),
            Verb::Put => self.client.put(&url),
            Verb::Delete => self.client.delete(&url),
        }
        .bearer_auth(&self.token);

        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                path: path.to_string(),
            });
        }

        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: text,
            });
        }

        // DELETE and some POST endpoints answer with an empty body.
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}

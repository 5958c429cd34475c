//! HTTP client for the managed backend's auth and REST endpoints.
//!
//! One `reqwest::Client` is built at startup and shared by two handles:
//! a public handle carrying the anon key and a privileged handle carrying
//! the service-role key.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::config::BackendConfig;

/// Which key a handle presents to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anon key; row-level access policy applies.
    Public,
    /// Service-role key; bypasses row-level access policy.
    Privileged,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    anon_key: Secret<String>,
    service_role_key: Secret<String>,
}

/// Process-wide connection to the managed backend.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<ClientInner>,
}

impl SupabaseClient {
    /// Build the client from configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        Self::from_parts(
            &config.url,
            config.anon_key.clone(),
            config.service_role_key.clone(),
            config.timeout(),
        )
    }

    pub fn from_parts(
        base_url: &str,
        anon_key: Secret<String>,
        service_role_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                anon_key,
                service_role_key,
            }),
        })
    }

    /// Handle scoped to the caller's permissions.
    pub fn public(&self) -> ClientHandle {
        ClientHandle {
            inner: Arc::clone(&self.inner),
            access: Access::Public,
        }
    }

    /// Administrative handle. Only for operations that must bypass row-level policy.
    pub fn privileged(&self) -> ClientHandle {
        ClientHandle {
            inner: Arc::clone(&self.inner),
            access: Access::Privileged,
        }
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// A view of [`SupabaseClient`] that presents one key.
#[derive(Clone)]
pub struct ClientHandle {
    inner: Arc<ClientInner>,
    access: Access,
}

impl ClientHandle {
    pub fn access(&self) -> Access {
        self.access
    }

    fn key(&self) -> &str {
        match self.access {
            Access::Public => self.inner.anon_key.expose_secret(),
            Access::Privileged => self.inner.service_role_key.expose_secret(),
        }
    }

    fn url(&self, prefix: &str, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.inner.base_url,
            prefix,
            path.trim_start_matches('/')
        )
    }

    /// Request to `/auth/v1/{path}` authorized by this handle's key.
    pub(crate) fn auth(&self, method: Method, path: &str) -> RequestBuilder {
        let key = self.key();
        self.inner
            .http
            .request(method, self.url("auth/v1", path))
            .header("apikey", key)
            .bearer_auth(key)
    }

    /// Request to `/auth/v1/{path}` acting as the user who owns `access_token`.
    pub(crate) fn auth_as(&self, method: Method, path: &str, access_token: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, self.url("auth/v1", path))
            .header("apikey", self.key())
            .bearer_auth(access_token)
    }

    /// Request to the `/rest/v1/{table}` endpoint.
    pub(crate) fn rest(&self, method: Method, table: &str) -> RequestBuilder {
        let key = self.key();
        self.inner
            .http
            .request(method, self.url("rest/v1", table))
            .header("apikey", key)
            .bearer_auth(key)
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("base_url", &self.inner.base_url)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// The error body shapes the backend uses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// Read the most specific human-readable message from an error response.
pub(crate) async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.msg.or(b.error_description).or(b.message).or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

//! REST client for the trail/occurrence backend.
//!
//! Synchronous trait methods drive an async reqwest client through an owned
//! tokio runtime, so callers on the UI side never deal with futures. Writes
//! forward the viewer's raw token as the Authorization header; reads are
//! anonymous.

use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, SentierMapError};
use crate::model::{Occurrence, Trail};
use crate::services::{OccurrenceService, TrailService};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Structured error body returned by the backend on failures.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

/// HTTP client for the trail backend.
pub struct RestClient {
    client: Client,
    runtime: tokio::runtime::Runtime,
    base_url: String,
    token: Option<String>,
}

impl RestClient {
    /// Create a client for the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| SentierMapError::service_unavailable(format!("runtime error: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SentierMapError::service_unavailable(format!("client error: {e}")))?;

        Ok(Self {
            client,
            runtime,
            base_url: normalize_base_url(base_url.into()),
            token: None,
        })
    }

    /// Set the viewer token sent as the Authorization header on writes.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the Authorization header when a viewer token is known.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, token.as_str()),
            None => request,
        }
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        self.runtime.block_on(async {
            let response = request
                .send()
                .await
                .map_err(|e| SentierMapError::service_unavailable(e.to_string()))?;
            parse_response(response, what).await
        })
    }
}

/// Normalize to a trailing slash so endpoint paths concatenate cleanly.
fn normalize_base_url(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Decode a successful body, or surface the backend's structured `error`
/// field with the HTTP status.
async fn parse_response<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_status(response, status, what).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| SentierMapError::service_unavailable(format!("invalid {what} body: {e}")))
}

async fn error_from_status(response: Response, status: StatusCode, what: &str) -> SentierMapError {
    let message = response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| format!("{what} request failed"));
    warn!("[rest] {what} failed with {status}: {message}");
    SentierMapError::Service {
        message,
        status: Some(status.as_u16()),
    }
}

impl TrailService for RestClient {
    fn fetch(&self, id: i64) -> Result<Trail> {
        let url = self.endpoint(&format!("trail/{id}"));
        debug!("[rest] GET {url}");
        self.execute(self.client.get(&url), "trail fetch")
    }

    fn update(&self, trail: &Trail) -> Result<Trail> {
        let url = self.endpoint(&format!("trail/{}", trail.id));
        debug!("[rest] PUT {url}");
        self.execute(
            self.authorized(self.client.put(&url)).json(trail),
            "trail update",
        )
    }

    fn delete(&self, id: i64) -> Result<()> {
        let url = self.endpoint(&format!("trail/{id}"));
        debug!("[rest] DELETE {url}");
        self.runtime.block_on(async {
            let response = self
                .authorized(self.client.delete(&url))
                .send()
                .await
                .map_err(|e| SentierMapError::service_unavailable(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(error_from_status(response, status, "trail delete").await);
            }
            Ok(())
        })
    }
}

impl OccurrenceService for RestClient {
    fn update(&self, occurrence: &Occurrence) -> Result<Occurrence> {
        let url = self.endpoint(&format!("occurrence/{}", occurrence.id));
        debug!("[rest] PUT {url}");
        self.execute(
            self.authorized(self.client.put(&url)).json(occurrence),
            "occurrence update",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let client = RestClient::new("https://api.example.org/service").unwrap();
        assert_eq!(
            client.endpoint("trail/12"),
            "https://api.example.org/service/trail/12"
        );

        let client = RestClient::new("https://api.example.org/service/").unwrap();
        assert_eq!(
            client.endpoint("trail/12"),
            "https://api.example.org/service/trail/12"
        );
    }

    #[test]
    fn test_api_error_body_shape() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error": "Sentier inconnu"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("Sentier inconnu"));

        let body: ApiErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.error.is_none());
    }
}

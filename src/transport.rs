//! HTTP transport to the scoring backend

use crate::config::BackendConfig;
use crate::error::PredictionError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request/response exchange with the backend.
///
/// Implementations decode successful bodies as JSON and map every other
/// outcome onto a transport or backend [`PredictionError`]. They must not
/// retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `path`
    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        request_id: &str,
    ) -> Result<Value, PredictionError>;

    /// GET `path` with the given query pairs
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        request_id: &str,
    ) -> Result<Value, PredictionError>;
}

/// reqwest-backed transport against a configured base address
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport from configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .with_context(|| format!("Invalid backend base URL: {}", config.base_url))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join an endpoint path onto the base address, keeping any base path prefix
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, PredictionError> {
        let response = request
            .send()
            .await
            .map_err(|e| PredictionError::transport(path, describe(&e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PredictionError::transport(path, describe(&e)))?;

        debug!(endpoint = %path, status = status.as_u16(), bytes = bytes.len(), "Response received");

        if !status.is_success() {
            return Err(PredictionError::backend(
                path,
                Some(status.as_u16()),
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            PredictionError::backend(
                path,
                Some(status.as_u16()),
                format!("response is not valid JSON: {e}"),
            )
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        request_id: &str,
    ) -> Result<Value, PredictionError> {
        let request = self
            .client
            .post(self.endpoint_url(path))
            .header(REQUEST_ID_HEADER, request_id)
            .json(body);
        self.execute(path, request).await
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        request_id: &str,
    ) -> Result<Value, PredictionError> {
        let request = self
            .client
            .get(self.endpoint_url(path))
            .header(REQUEST_ID_HEADER, request_id)
            .query(query);
        self.execute(path, request).await
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

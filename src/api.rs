use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::auth::CredentialProvider;
use crate::types::{Config, RunScanResponse, Scan};

/// Failure of a single backend request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, DNS, I/O).
    #[error("{0}")]
    Transport(String),
    /// The backend answered with a non-2xx status.
    #[error("Network error")]
    Status(StatusCode),
    /// The body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Typed view of the scanner backend used by the pages.
#[async_trait]
pub trait ScannerApi: Send + Sync {
    async fn get_scans(&self) -> ApiResult<Vec<Scan>>;
    async fn get_scan(&self, id: i64) -> ApiResult<Scan>;
    async fn get_config(&self) -> ApiResult<Config>;
    async fn update_config(&self, config: &Config) -> ApiResult<()>;
    async fn run_scan(&self) -> ApiResult<RunScanResponse>;
}

/// `ScannerApi` over HTTP with credentials from an injected provider.
#[derive(Clone)]
pub struct HttpScannerApi {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpScannerApi {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_client(Client::new(), base_url, credentials)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and decode the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let body = self.send(self.client.get(self.url(path))).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Vec<u8>> {
        let request = match self.credentials.authorization() {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        debug!(url = %response.url(), %status, "backend response");
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ScannerApi for HttpScannerApi {
    async fn get_scans(&self) -> ApiResult<Vec<Scan>> {
        // The backend encodes an empty history as `null`.
        let scans: Option<Vec<Scan>> = self.get_json("/api/scans").await?;
        Ok(scans.unwrap_or_default())
    }

    async fn get_scan(&self, id: i64) -> ApiResult<Scan> {
        self.get_json(&format!("/api/scan/{id}")).await
    }

    async fn get_config(&self) -> ApiResult<Config> {
        self.get_json("/api/config").await
    }

    async fn update_config(&self, config: &Config) -> ApiResult<()> {
        let request = self.client.put(self.url("/api/config")).json(config);
        self.send(request).await?;
        Ok(())
    }

    async fn run_scan(&self) -> ApiResult<RunScanResponse> {
        let body = self.send(self.client.get(self.url("/api/scan/run"))).await?;
        Ok(serde_json::from_slice(&body).unwrap_or_else(|e| {
            debug!("run scan body not understood: {e}");
            RunScanResponse::default()
        }))
    }
}

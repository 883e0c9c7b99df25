use bytes::Bytes;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use super::models::BackendConfig;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Base URL cannot carry a path: {0}")]
    InvalidBaseUrl(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    config: BackendConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn health_url(&self) -> Result<Url> {
        self.endpoint(&["api", "health"])
    }

    pub fn download_url(&self, document_id: &str) -> Result<Url> {
        self.endpoint(&["api", "download", document_id])
    }

    /// `GET /api/health`; only a 200 counts as healthy.
    pub async fn check_health(&self) -> Result<()> {
        let url = self.health_url()?;
        let response = self
            .http
            .get(url.clone())
            .timeout(self.config.health_timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ApiError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(())
    }

    /// `GET /api/download/{document_id}`, returning the whole body.
    pub async fn fetch_document(&self, document_id: &str) -> Result<Bytes> {
        let url = self.download_url(document_id)?;
        let response = self
            .http
            .get(url.clone())
            .timeout(self.config.download_timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ApiError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?)
    }
}

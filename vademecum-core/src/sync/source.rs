//! Remote dataset sources

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use reqwest::StatusCode;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::error::{CatalogError, Result};

/// Where the published dataset lives
///
/// The sync manager only needs a modification timestamp and the raw bytes,
/// so tests can swap the HTTP source for an in-memory one.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Last modification time of the published dataset, if the source reports one
    async fn last_modified(&self) -> Result<Option<DateTime<Utc>>>;

    /// Full dataset payload
    async fn download(&self) -> Result<Vec<u8>>;

    /// Human-readable location, for logs and errors
    fn describe(&self) -> &str;
}

/// Dataset published over HTTP
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CatalogError::Network {
                resource: config.url.clone(),
                source: Box::new(e),
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    fn network_error(&self, source: reqwest::Error) -> CatalogError {
        CatalogError::Network {
            resource: self.url.clone(),
            source: Box::new(source),
        }
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        let response = self
            .client
            .head(&self.url)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = response.status();
        if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
            tracing::warn!(
                "{} does not support HEAD (HTTP {}), assuming no remote timestamp",
                self.url,
                status.as_u16()
            );
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                resource: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let header = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok());

        Ok(header.and_then(|value| {
            let parsed = parse_http_date(value);
            if parsed.is_none() {
                tracing::warn!("Ignoring unparseable Last-Modified '{}' from {}", value, self.url);
            }
            parsed
        }))
    }

    async fn download(&self) -> Result<Vec<u8>> {
        tracing::info!("Downloading medication dataset from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus {
                resource: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.network_error(e))?;

        tracing::info!("Downloaded {} bytes from {}", bytes.len(), self.url);
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> &str {
        &self.url
    }
}

/// Parse an HTTP-date (`Tue, 04 Mar 2025 10:15:00 GMT`)
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

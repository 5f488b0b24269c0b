// src/services/fetcher.rs

//! Source fetching.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{FetchError, Result};
use crate::models::{HttpConfig, RawDocument, SourceConfig};
use crate::utils::http::create_client;

/// Retrieves the raw document behind a source.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, source: &SourceConfig) -> std::result::Result<RawDocument, FetchError>;
}

/// Fetcher backed by a browser-identified reqwest client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with browser headers and the configured timeout.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, source: &SourceConfig) -> std::result::Result<RawDocument, FetchError> {
        let response = self.client.get(&source.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let redirected = url::Url::parse(&source.url)
            .map(|requested| requested != *response.url())
            .unwrap_or(true);
        if redirected {
            log::warn!(
                "[{}] request for {} was redirected to {}",
                source.name,
                source.url,
                final_url
            );
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await?.to_vec();
        log::debug!("[{}] fetched {} bytes", source.name, body.len());

        Ok(RawDocument {
            body,
            final_url,
            content_type,
        })
    }
}

//! TeddyCloud registration.
//!
//! Asking TeddyCloud for a tag's content makes it fetch and cache that
//! content, which is how a tonie is "added" there.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, HOST};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::pipeline::Registrar;
use crate::token::TagToken;
use crate::{Error, Result};

/// Client for a TeddyCloud instance.
#[derive(Debug, Clone)]
pub struct TeddyCloud {
    client: Client,
    base_url: String,
    host: String,
}

impl TeddyCloud {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    /// Client for the configured instance, or `None` when registration is disabled.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        config
            .teddycloud_url
            .as_ref()
            .map(|url| Self::new(url, config.timeout))
            .transpose()
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let host = base_url
            .split_once("//")
            .map(|(_, host)| host.to_string())
            .filter(|host| !host.is_empty())
            .ok_or_else(|| Error::Config(format!("invalid TeddyCloud URL: {base_url}")))?;
        Ok(Self {
            client,
            base_url,
            host,
        })
    }
}

impl Registrar for TeddyCloud {
    #[instrument(skip_all, fields(ruid = %token.ruid))]
    async fn register(&self, token: &TagToken) -> Result<()> {
        let url = format!("{}/v2/content/{}", self.base_url, token.ruid);
        debug!(url, "Adding tonie to TeddyCloud");

        let start = Instant::now();
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("BD {}", token.auth))
            .header(HOST, &self.host)
            .send()
            .await
            .inspect_err(|e| {
                error!(elapsed = ?start.elapsed(), error = %e, "Request failed");
            })?;
        info!(elapsed = ?start.elapsed(), "Request completed");

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
            error!(status = status.as_u16(), "Unexpected response code");
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }
}

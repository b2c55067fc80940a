//! Startup configuration for toniefinder.

use std::path::PathBuf;
use std::time::Duration;

/// Default vendor content server.
pub const DEFAULT_CONTENT_URL: &str = "https://prod.de.tbs.toys";

/// Catalog refresh period (24 hours).
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client certificate and key used for mutual TLS against the content server.
#[derive(Debug, Clone)]
pub struct ClientCert {
    /// PEM encoded certificate.
    pub cert_path: PathBuf,
    /// PEM encoded private key.
    pub key_path: PathBuf,
}

/// Parameters supplied once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the tonies.json catalog document.
    pub json_url: String,
    /// Vendor content server base URL.
    pub content_url: String,
    /// mTLS credentials for the content server.
    pub client_cert: Option<ClientCert>,
    /// TeddyCloud base URL. Registration is disabled when unset.
    pub teddycloud_url: Option<String>,
    /// How often the catalog is fetched again.
    pub refresh_period: Duration,
    /// Timeout applied to every outgoing request.
    pub timeout: Duration,
}

impl Config {
    /// Create a configuration with defaults for everything but the catalog URL.
    pub fn new(json_url: impl Into<String>) -> Self {
        Self {
            json_url: json_url.into(),
            content_url: DEFAULT_CONTENT_URL.to_string(),
            client_cert: None,
            teddycloud_url: None,
            refresh_period: DEFAULT_REFRESH_PERIOD,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_client_cert(
        mut self,
        cert_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        self.client_cert = Some(ClientCert {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        });
        self
    }

    pub fn with_content_url(mut self, url: impl Into<String>) -> Self {
        self.content_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_teddycloud_url(mut self, url: Option<String>) -> Self {
        self.teddycloud_url = url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

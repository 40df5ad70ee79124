//! Page retrieval.
//!
//! Two interchangeable [`ContentFetcher`] implementations exist: a remote
//! rendering backend ([`BrowserFetcher`]) and plain HTTP ([`HttpFetcher`]).
//! [`build_fetcher`] picks between them from configuration, layering the
//! HTTP fetcher underneath the browser when both are available.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;

pub mod browser;
pub mod http;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    Browser,
    Http,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub requested_url: String,
    pub final_url: String, // After redirects
    pub html: String,
    pub source: FetchSource,
    /// Readiness waits timed out and the markup was taken as-is.
    pub degraded: bool,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Rendering backend session could not be created after {attempts} attempt(s): {message}")]
    BackendSession { attempts: u32, message: String },

    #[error("Rendering backend error: {0}")]
    Backend(String),

    #[error("Rendering backend is not configured")]
    NotConfigured,

    #[error("HTTP client could not be built: {0}")]
    Client(String),
}

impl FetchError {
    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::Timeout { .. } => "timeout",
            FetchError::HttpStatus { .. } => "http_status",
            FetchError::BackendSession { .. } => "backend_session",
            FetchError::Backend(_) => "backend",
            FetchError::NotConfigured => "not_configured",
            FetchError::Client(_) => "client",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, url: &str) -> Result<Document, FetchError>;
}

/// Tries `primary` and falls back to `fallback` only when the primary
/// strategy failed outright. Degraded documents are returned as-is.
pub struct LayeredFetcher {
    primary: Arc<dyn ContentFetcher>,
    fallback: Arc<dyn ContentFetcher>,
}

impl LayeredFetcher {
    pub fn new(primary: Arc<dyn ContentFetcher>, fallback: Arc<dyn ContentFetcher>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl ContentFetcher for LayeredFetcher {
    fn name(&self) -> &'static str {
        "layered"
    }

    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        match self.primary.fetch(url).await {
            Ok(document) => Ok(document),
            Err(primary_err) => {
                tracing::warn!(
                    url,
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %primary_err,
                    "primary fetch failed, falling back"
                );
                self.fallback.fetch(url).await
            }
        }
    }
}

pub fn build_fetcher(config: &AppConfig) -> Result<Arc<dyn ContentFetcher>, FetchError> {
    let http: Arc<dyn ContentFetcher> = Arc::new(HttpFetcher::new(&config.scraper)?);

    if !config.renderer.is_configured() {
        tracing::info!("rendering backend not configured, using direct HTTP only");
        return Ok(http);
    }

    let browser: Arc<dyn ContentFetcher> = Arc::new(BrowserFetcher::new(
        config.renderer.clone(),
        config.scraper.clone(),
    )?);
    tracing::info!(
        base_url = config.renderer.base_url.as_deref().unwrap_or_default(),
        "using rendering backend with direct HTTP fallback"
    );
    Ok(Arc::new(LayeredFetcher::new(browser, http)))
}

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, redirect::Policy};
use std::time::Duration;

use super::{ContentFetcher, Document, FetchError, FetchSource};
use crate::config::ScraperConfig;

/// Plain `GET` with a browser-like header set. Used on its own when no
/// rendering backend is configured, and as the fallback otherwise.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .default_headers(browser_headers(config)?)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(Policy::limited(10))
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

fn browser_headers(config: &ScraperConfig) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| FetchError::Client(format!("invalid user agent: {}", e)))?,
    );
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language)
            .map_err(|e| FetchError::Client(format!("invalid accept-language: {}", e)))?,
    );
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(headers)
}

pub(crate) fn map_reqwest_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;

        tracing::debug!(url, final_url = %final_url, bytes = html.len(), "fetched page over HTTP");

        Ok(Document {
            requested_url: url.to_string(),
            final_url,
            html,
            source: FetchSource::Http,
            degraded: false,
        })
    }
}

use async_trait::async_trait;
use headless_chrome::{Browser, Tab};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use url::Url;

use super::http::map_reqwest_error;
use super::{ContentFetcher, Document, FetchError, FetchSource};
use crate::classifier::price::PRICE_SELECTORS;
use crate::config::{RendererConfig, ScraperConfig};

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

#[derive(Debug, Clone)]
struct RenderSettings {
    user_agent: String,
    accept_language: String,
    ready_timeout: Duration,
    content_timeout: Duration,
    content_selector: String,
}

/// Renders pages on a remote headless browser (DevTools protocol).
///
/// Every fetch opens a fresh session: discovery of the WebSocket endpoint
/// over HTTP followed by a connect. Session creation is retried a bounded
/// number of times; page readiness timeouts degrade to "use whatever markup
/// is there" instead of failing the check.
pub struct BrowserFetcher {
    renderer: RendererConfig,
    scraper: ScraperConfig,
    client: Client,
}

impl BrowserFetcher {
    pub fn new(renderer: RendererConfig, scraper: ScraperConfig) -> Result<Self, FetchError> {
        if !renderer.is_configured() {
            return Err(FetchError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(scraper.request_timeout))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            renderer,
            scraper,
            client,
        })
    }

    fn base_url(&self) -> &str {
        self.renderer
            .base_url
            .as_deref()
            .unwrap_or_default()
            .trim_end_matches('/')
    }

    fn with_token(&self, ws_url: &str) -> Result<String, String> {
        let mut parsed =
            Url::parse(ws_url).map_err(|e| format!("Invalid WebSocket URL '{}': {}", ws_url, e))?;

        if let Some(token) = &self.renderer.token {
            let has_token = parsed.query_pairs().any(|(k, _)| k == "token");
            if !has_token {
                parsed.query_pairs_mut().append_pair("token", token);
            }
        }

        Ok(parsed.to_string())
    }

    async fn discover_ws_url(&self) -> Result<String, String> {
        let base = self.base_url();
        if base.starts_with("ws://") || base.starts_with("wss://") {
            return self.with_token(base);
        }

        let endpoint = format!("{}/json/version", base);
        let mut request = self.client.get(&endpoint);
        if let Some(token) = &self.renderer.token {
            request = request.query(&[("token", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(&endpoint, e).to_string())?;

        if !response.status().is_success() {
            return Err(format!(
                "Session discovery returned HTTP {}",
                response.status().as_u16()
            ));
        }

        let info: VersionInfo = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse session discovery response: {}", e))?;

        self.with_token(&info.web_socket_debugger_url)
    }

    async fn open_session(&self) -> Result<Browser, String> {
        let ws_url = self.discover_ws_url().await?;
        let idle_timeout = Duration::from_secs(self.renderer.render_timeout_secs);

        tokio::task::spawn_blocking(move || Browser::connect_with_timeout(ws_url, idle_timeout))
            .await
            .map_err(|e| format!("Session task failed: {}", e))?
            .map_err(|e| format!("Failed to connect to rendering backend: {}", e))
    }

    async fn create_session(&self) -> Result<Browser, FetchError> {
        let attempts = self.renderer.session_attempts.max(1);
        let strategy = FixedInterval::from_millis(self.renderer.session_retry_delay_ms)
            .take(attempts.saturating_sub(1) as usize);
        let attempt = AtomicU32::new(0);

        Retry::start(strategy, || async {
            let current = attempt.fetch_add(1, Ordering::Relaxed) + 1;
            self.open_session().await.map_err(|message| {
                tracing::warn!(attempt = current, max_attempts = attempts, error = %message, "rendering backend session failed");
                message
            })
        })
        .await
        .map_err(|message| FetchError::BackendSession { attempts, message })
    }

    fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            user_agent: self.scraper.user_agent.clone(),
            accept_language: self.scraper.accept_language.clone(),
            ready_timeout: Duration::from_secs(self.renderer.ready_timeout_secs),
            content_timeout: Duration::from_secs(self.renderer.content_timeout_secs),
            content_selector: PRICE_SELECTORS.join(", "),
        }
    }
}

fn render_page(browser: &Browser, url: &str, settings: &RenderSettings) -> Result<Document, FetchError> {
    let tab = browser
        .new_tab()
        .map_err(|e| FetchError::Backend(format!("Failed to create tab: {}", e)))?;

    let result = drive_tab(&tab, url, settings);

    // Close tab to free backend resources
    let _ = tab.close(true);

    result
}

fn drive_tab(tab: &Tab, url: &str, settings: &RenderSettings) -> Result<Document, FetchError> {
    tab.set_user_agent(&settings.user_agent, Some(&settings.accept_language), None)
        .map_err(|e| FetchError::Backend(format!("Failed to set user agent: {}", e)))?;

    tab.navigate_to(url)
        .map_err(|e| FetchError::Backend(format!("Navigation failed: {}", e)))?;

    if let Err(e) = tab.wait_until_navigated() {
        tracing::debug!(url, error = %e, "navigation did not settle");
    }

    let mut degraded = false;
    if tab
        .wait_for_element_with_custom_timeout("body", settings.ready_timeout)
        .is_err()
    {
        tracing::debug!(url, "body not ready, waiting for price markup");
        if tab
            .wait_for_element_with_custom_timeout(&settings.content_selector, settings.content_timeout)
            .is_err()
        {
            tracing::warn!(url, "page readiness timed out, using markup as-is");
            degraded = true;
        }
    }

    let html = tab
        .get_content()
        .map_err(|e| FetchError::Backend(format!("Failed to get page content: {}", e)))?;

    // Get final URL after redirects
    let final_url = {
        let current = tab.get_url();
        if current.is_empty() {
            url.to_string()
        } else {
            current
        }
    };

    Ok(Document {
        requested_url: url.to_string(),
        final_url,
        html,
        source: FetchSource::Browser,
        degraded,
    })
}

#[async_trait]
impl ContentFetcher for BrowserFetcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let browser = self.create_session().await?;
        let settings = self.render_settings();
        let target = url.to_string();

        // On timeout the blocking render is detached, not cancelled. It still ends
        // once the tab waits expire, which config validation keeps below the wall clock.
        let task = tokio::task::spawn_blocking(move || render_page(&browser, &target, &settings));
        let render_timeout = Duration::from_secs(self.renderer.render_timeout_secs);

        match tokio::time::timeout(render_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(FetchError::Backend(format!("Render task failed: {}", join_err))),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

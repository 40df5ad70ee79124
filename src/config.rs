use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub scraper: ScraperConfig,
    pub renderer: RendererConfig,
    pub scheduler: SchedulerConfig,
    pub notifications: NotificationsConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Direct HTTP fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub request_timeout: u64,
    pub user_agent: String,
    pub accept_language: String,
}

/// Remote headless-browser service reached through its DevTools endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub enabled: bool,
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub session_attempts: u32,
    pub session_retry_delay_ms: u64,
    pub ready_timeout_secs: u64,
    pub content_timeout_secs: u64,
    pub render_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub item_delay_ms: u64,
    pub cycle_interval_secs: u64,
    pub recovery_delay_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub telegram: TelegramConfig,
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub webhook_url: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/restock.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_timeout: 20,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9,tr;q=0.8,de;q=0.7".to_string(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            token: None,
            session_attempts: 3,
            session_retry_delay_ms: 2000,
            ready_timeout_secs: 15,
            content_timeout_secs: 10,
            render_timeout_secs: 60,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: 3000,
            cycle_interval_secs: 600,
            recovery_delay_secs: 60,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: None,
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: "Restock Watcher".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9001,
        }
    }
}

impl RendererConfig {
    /// The renderer is used only when switched on and pointed somewhere.
    pub fn is_configured(&self) -> bool {
        self.enabled && self.base_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    pub fn load(extra_file: Option<&Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            .add_source(Environment::with_prefix("RESTOCK").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.apply_legacy_env();
        config.validate()?;
        Ok(config)
    }

    /// Older deployments configured the bot and renderer through bare
    /// variables; they only fill values that are still unset.
    fn apply_legacy_env(&mut self) {
        let legacy = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        if self.notifications.telegram.bot_token.is_none() {
            if let Some(token) = legacy("BOT_TOKEN") {
                self.notifications.telegram.bot_token = Some(token);
                self.notifications.telegram.enabled = true;
            }
        }

        if self.renderer.base_url.is_none() {
            if let Some(base_url) = legacy("RENDER_BACKEND_URL") {
                self.renderer.base_url = Some(base_url);
                self.renderer.enabled = true;
            }
        }

        if self.renderer.token.is_none() {
            self.renderer.token = legacy("RENDER_BACKEND_TOKEN");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message("Database url must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message("Database max_connections must be greater than 0".into()));
        }

        if self.scraper.request_timeout == 0 {
            return Err(ConfigError::Message("Scraper request_timeout must be greater than 0".into()));
        }

        if self.renderer.enabled {
            let Some(base_url) = self.renderer.base_url.as_deref().filter(|u| !u.trim().is_empty()) else {
                return Err(ConfigError::Message("Renderer is enabled but renderer.base_url is not set".into()));
            };

            if Url::parse(base_url).is_err() {
                return Err(ConfigError::Message("Invalid renderer base URL format".into()));
            }

            if self.renderer.session_attempts == 0 {
                return Err(ConfigError::Message("Renderer session_attempts must be greater than 0".into()));
            }

            if self.renderer.render_timeout_secs == 0 {
                return Err(ConfigError::Message("Renderer render_timeout_secs must be greater than 0".into()));
            }

            // Tab waits must finish inside the wall clock
            let tab_waits = self.renderer.ready_timeout_secs + self.renderer.content_timeout_secs;
            if tab_waits >= self.renderer.render_timeout_secs {
                return Err(ConfigError::Message(
                    "Renderer ready_timeout_secs + content_timeout_secs must be less than render_timeout_secs".into(),
                ));
            }
        }

        if self.scheduler.cycle_interval_secs == 0 {
            return Err(ConfigError::Message("Scheduler cycle_interval_secs must be greater than 0".into()));
        }

        if self.scheduler.recovery_delay_secs == 0 {
            return Err(ConfigError::Message("Scheduler recovery_delay_secs must be greater than 0".into()));
        }

        let telegram = &self.notifications.telegram;
        if telegram.enabled && telegram.bot_token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(ConfigError::Message("Telegram notifications are enabled but bot_token is not set".into()));
        }

        if Url::parse(&telegram.api_base).is_err() {
            return Err(ConfigError::Message("Invalid Telegram api_base URL format".into()));
        }

        if let Some(webhook) = &self.notifications.discord.webhook_url {
            if !webhook.starts_with("https://discord.com/api/webhooks/") {
                return Err(ConfigError::Message("Invalid Discord webhook URL format".into()));
            }
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            renderer: RendererConfig {
                enabled: true,
                base_url: Some("http://localhost:3000".to_string()),
                token: Some("secret".to_string()),
                ..RendererConfig::default()
            },
            notifications: NotificationsConfig {
                telegram: TelegramConfig {
                    enabled: true,
                    bot_token: Some("123:abc".to_string()),
                    ..TelegramConfig::default()
                },
                discord: DiscordConfig::default(),
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
        assert!(!AppConfig::default().renderer.is_configured());
    }

    #[test]
    fn test_config_validation_valid() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert!(config.renderer.is_configured());
    }

    #[test]
    fn test_renderer_enabled_without_base_url() {
        let mut config = valid_config();
        config.renderer.base_url = None;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("renderer.base_url is not set"));
    }

    #[test]
    fn test_renderer_invalid_base_url() {
        let mut config = valid_config();
        config.renderer.base_url = Some("not-a-valid-url".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid renderer base URL"));
    }

    #[test]
    fn test_renderer_tab_waits_exceed_render_timeout() {
        let mut config = valid_config();
        config.renderer.ready_timeout_secs = 40;
        config.renderer.content_timeout_secs = 20;
        config.renderer.render_timeout_secs = 60;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("less than render_timeout_secs"));

        config.renderer.content_timeout_secs = 19;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_renderer_disabled_ignores_missing_url() {
        let mut config = valid_config();
        config.renderer.enabled = false;
        config.renderer.base_url = None;

        assert!(config.validate().is_ok());
        assert!(!config.renderer.is_configured());
    }

    #[test]
    fn test_telegram_enabled_without_token() {
        let mut config = valid_config();
        config.notifications.telegram.bot_token = Some("  ".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("bot_token"));
    }

    #[test]
    fn test_invalid_discord_webhook() {
        let mut config = valid_config();
        config.notifications.discord.webhook_url = Some("https://example.com/hook".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Discord webhook"));
    }

    #[test]
    fn test_zero_cycle_interval() {
        let mut config = valid_config();
        config.scheduler.cycle_interval_secs = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cycle_interval_secs"));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restock.toml");
        std::fs::write(
            &path,
            r#"
[scheduler]
item_delay_ms = 10
cycle_interval_secs = 30

[renderer]
enabled = true
base_url = "http://renderer.local:3000"
session_attempts = 5
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scheduler.item_delay_ms, 10);
        assert_eq!(config.scheduler.cycle_interval_secs, 30);
        assert_eq!(config.scheduler.recovery_delay_secs, 60);
        assert_eq!(config.renderer.session_attempts, 5);
        assert_eq!(config.renderer.ready_timeout_secs, 15);
        assert!(config.renderer.is_configured());
    }
}

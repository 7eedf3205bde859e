use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const IG_ACCESS_TOKEN: &str = "IG_ACCESS_TOKEN";
pub const IG_BUSINESS_ID: &str = "IG_BUSINESS_ID";
pub const IG_DEFAULT_IMAGE_URL: &str = "IG_DEFAULT_IMAGE_URL";
pub const BIND_ADDR: &str = "SOCIALPOST_BIND_ADDR";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub instagram: InstagramConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub api_base_url: String,
}

impl TelegramConfig {
    pub fn bot_token(&self) -> Option<&str> {
        non_blank(&self.bot_token)
    }

    pub fn chat_id(&self) -> Option<&str> {
        non_blank(&self.chat_id)
    }

    /// Returns the effective api_base_url: if the stored value is empty,
    /// fall back to the public Bot API host.
    pub fn effective_api_base_url(&self) -> &str {
        if self.api_base_url.trim().is_empty() {
            "https://api.telegram.org"
        } else {
            self.api_base_url.trim_end_matches('/')
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token().is_some() && self.chat_id().is_some()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InstagramConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub business_id: Option<String>,
    /// Used when a publish request carries no image of its own
    #[serde(default)]
    pub default_image_url: Option<String>,
    #[serde(default)]
    pub graph_base_url: String,
}

impl InstagramConfig {
    pub fn access_token(&self) -> Option<&str> {
        non_blank(&self.access_token)
    }

    pub fn business_id(&self) -> Option<&str> {
        non_blank(&self.business_id)
    }

    pub fn default_image_url(&self) -> Option<&str> {
        non_blank(&self.default_image_url)
    }

    /// Returns the effective graph_base_url, including the pinned API version.
    pub fn effective_graph_base_url(&self) -> &str {
        if self.graph_base_url.trim().is_empty() {
            "https://graph.facebook.com/v21.0"
        } else {
            self.graph_base_url.trim_end_matches('/')
        }
    }

    pub fn is_configured(&self) -> bool {
        self.access_token().is_some() && self.business_id().is_some()
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from `path` (if it exists), then apply overrides
    /// from the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            info!(
                "No config file at {}, using environment only",
                path.display()
            );
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config TOML")
    }

    /// Override settings with values from `lookup`. Blank values are ignored
    /// so an exported-but-empty variable never masks the config file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get(TELEGRAM_BOT_TOKEN) {
            self.telegram.bot_token = Some(v);
        }
        if let Some(v) = get(TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = Some(v);
        }
        if let Some(v) = get(IG_ACCESS_TOKEN) {
            self.instagram.access_token = Some(v);
        }
        if let Some(v) = get(IG_BUSINESS_ID) {
            self.instagram.business_id = Some(v);
        }
        if let Some(v) = get(IG_DEFAULT_IMAGE_URL) {
            self.instagram.default_image_url = Some(v);
        }
        if let Some(v) = get(BIND_ADDR) {
            self.server.bind_addr = v;
        }
    }
}

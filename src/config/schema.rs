use serde::{Deserialize, Serialize};

use crate::livekit::DEFAULT_TOKEN_TTL_SECS;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server settings
    pub web: WebConfig,
    /// LiveKit project settings
    pub livekit: LiveKitConfig,
    /// Telegram bot settings
    pub telegram: TelegramConfig,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub bind_address: String,
    /// HTTP port
    pub http_port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            http_port: 3000,
        }
    }
}

/// LiveKit project configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LiveKitConfig {
    /// Project API key
    pub api_key: Option<String>,
    /// Project API secret
    #[serde(skip_serializing)]
    pub api_secret: Option<String>,
    /// Server URL, e.g. `wss://project.livekit.cloud`
    pub url: Option<String>,
    /// Participant token lifetime in seconds
    pub token_ttl_secs: u32,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            url: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

/// Borrowed LiveKit credentials, present only when fully configured
#[derive(Debug, Clone, Copy)]
pub struct LiveKitCredentials<'a> {
    pub api_key: &'a str,
    pub api_secret: &'a str,
    pub url: &'a str,
}

impl LiveKitConfig {
    pub fn credentials(&self) -> Option<LiveKitCredentials<'_>> {
        Some(LiveKitCredentials {
            api_key: non_empty(&self.api_key)?,
            api_secret: non_empty(&self.api_secret)?,
            url: non_empty(&self.url)?,
        })
    }
}

/// Telegram bot configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    #[serde(skip_serializing)]
    pub bot_token: Option<String>,
    /// Public base URL used to build room links
    pub call_base_url: Option<String>,
    /// Bot API endpoint
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            call_base_url: None,
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

impl TelegramConfig {
    /// Token and base URL, or `None` when the bot is not configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.bot_token)?, non_empty(&self.call_base_url)?))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

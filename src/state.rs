use std::sync::Arc;

use crate::config::AppConfig;
use crate::rooms::RoomStore;
use crate::telegram::{BotApi, HttpBotApi};

/// Application-wide state shared across handlers
///
/// Constructed once per process. The room registry lives here rather than in
/// a global, so every handler sees the same instance through the router state.
pub struct AppState {
    /// Configuration, fixed after startup
    pub config: AppConfig,
    /// Short-lived room settings
    pub rooms: RoomStore,
    /// Telegram Bot API client
    pub bot: Arc<dyn BotApi>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig, rooms: RoomStore, bot: Arc<dyn BotApi>) -> Arc<Self> {
        Arc::new(Self { config, rooms, bot })
    }

    /// State with the system clock and the HTTPS Bot API client
    pub fn from_config(config: AppConfig) -> Arc<Self> {
        let bot = Arc::new(HttpBotApi::new(config.telegram.api_base.clone()));
        Self::new(config, RoomStore::new(), bot)
    }
}

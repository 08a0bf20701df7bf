//! Telegram Bot API client

use async_trait::async_trait;
use tracing::debug;

use super::types::{AnswerInlineQuery, InlineQueryResultArticle};
use crate::error::{AppError, Result};

/// Bot API calls the webhook relies on
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn answer_inline_query(
        &self,
        token: &str,
        inline_query_id: &str,
        results: &[InlineQueryResultArticle],
    ) -> Result<()>;
}

/// Bot API over HTTPS
pub struct HttpBotApi {
    client: reqwest::Client,
    api_base: String,
}

impl HttpBotApi {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
        }
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            token,
            method
        )
    }
}

#[async_trait]
impl BotApi for HttpBotApi {
    async fn answer_inline_query(
        &self,
        token: &str,
        inline_query_id: &str,
        results: &[InlineQueryResultArticle],
    ) -> Result<()> {
        let payload = AnswerInlineQuery {
            inline_query_id,
            results,
            cache_time: 0,
            is_personal: true,
        };

        let response = self
            .client
            .post(self.method_url(token, "answerInlineQuery"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Telegram API request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Telegram API error: {}", error_text)));
        }

        debug!(inline_query_id, "Inline query answered");
        Ok(())
    }
}

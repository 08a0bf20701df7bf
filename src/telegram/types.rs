//! Telegram Bot API payloads (only the parts the bot uses)

use serde::{Deserialize, Serialize};

/// Incoming webhook update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub inline_query: Option<InlineQuery>,
}

/// `id` is required: an inline query without one cannot be answered
#[derive(Debug, Clone, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub from: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "MarkdownV2")]
    MarkdownV2,
    #[serde(rename = "Markdown")]
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputMessageContent {
    pub message_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// Article result of an inline query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineQueryResultArticle {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_message_content: InputMessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

/// Body of `answerInlineQuery`
#[derive(Debug, Clone, Serialize)]
pub struct AnswerInlineQuery<'a> {
    pub inline_query_id: &'a str,
    pub results: &'a [InlineQueryResultArticle],
    pub cache_time: u32,
    pub is_personal: bool,
}

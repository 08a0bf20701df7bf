//! Telegram inline bot
//!
//! Typing `@bot` in any chat offers a card that creates a fresh room and
//! posts its link.

mod client;
pub mod types;

pub use client::{BotApi, HttpBotApi};
pub use types::{InlineQueryResultArticle, Update};

use url::Url;

use types::{InlineKeyboardButton, InlineKeyboardMarkup, InputMessageContent};

/// Absolute link to a room page
pub fn room_url(base_url: &str, room_id: &str) -> Result<String, url::ParseError> {
    let base = Url::parse(base_url)?;
    Ok(base.join(&format!("/rooms/{}", room_id))?.to_string())
}

/// Inline result inviting the chat to a new room
pub fn room_invite(room_id: &str, call_url: &str) -> InlineQueryResultArticle {
    InlineQueryResultArticle {
        kind: "article",
        id: room_id.to_string(),
        title: "Создать созвон".to_string(),
        description: Some("Отправить ссылку на новую комнату".to_string()),
        input_message_content: InputMessageContent {
            message_text: format!("Присоединяйтесь к созвону: {}", call_url),
            parse_mode: None,
        },
        reply_markup: Some(InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: "Перейти к созвону".to_string(),
                url: call_url.to_string(),
            }]],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_url() {
        assert_eq!(
            room_url("https://call.example.com", "ab12-cd34").unwrap(),
            "https://call.example.com/rooms/ab12-cd34"
        );
        // absolute path replaces any base path
        assert_eq!(
            room_url("https://call.example.com/app/", "x").unwrap(),
            "https://call.example.com/rooms/x"
        );
        assert!(room_url("not a url", "x").is_err());
    }

    #[test]
    fn test_invite_payload() {
        let invite = room_invite("ab12-cd34", "https://call.example.com/rooms/ab12-cd34");
        let value = serde_json::to_value(&invite).unwrap();

        assert_eq!(value["type"], "article");
        assert_eq!(value["id"], "ab12-cd34");
        assert_eq!(
            value["input_message_content"]["message_text"],
            "Присоединяйтесь к созвону: https://call.example.com/rooms/ab12-cd34"
        );
        assert!(value["input_message_content"].get("parse_mode").is_none());
        assert_eq!(
            value["reply_markup"]["inline_keyboard"][0][0]["url"],
            "https://call.example.com/rooms/ab12-cd34"
        );
    }

    #[test]
    fn test_update_without_inline_query() {
        let update: Update = serde_json::from_str(r#"{"update_id": 1, "message": {}}"#).unwrap();
        assert!(update.inline_query.is_none());
    }

    #[test]
    fn test_update_with_inline_query() {
        let update: Update = serde_json::from_str(
            r#"{"inline_query": {"id": "q1", "query": "", "from": {"id": 7, "first_name": "Anna"}}}"#,
        )
        .unwrap();
        let query = update.inline_query.unwrap();
        assert_eq!(query.id, "q1");
        assert_eq!(query.from.unwrap().id, 7);
    }
}

//! Telegram webhook
//!
//! Answers every inline query with a link to a freshly generated room.

use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::OkResponse;
use crate::error::{AppError, Result};
use crate::rooms::generate_room_id;
use crate::state::AppState;
use crate::telegram::{room_invite, room_url, Update};

/// `GET /api/telegram`
pub async fn status() -> Json<OkResponse> {
    OkResponse::ok()
}

/// `POST /api/telegram`
pub async fn webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<OkResponse>> {
    let Some((token, base_url)) = state.config.telegram.credentials() else {
        error!("Telegram bot misconfigured: missing token or base URL");
        return Err(AppError::Config("Bot misconfigured".to_string()));
    };

    let update: Update = serde_json::from_slice(&body).map_err(|e| {
        warn!("Failed to parse Telegram update: {}", e);
        AppError::BadRequest("Invalid payload".to_string())
    })?;

    let Some(inline_query) = update.inline_query else {
        return Ok(OkResponse::ok());
    };

    let room_id = generate_room_id();
    let call_url = room_url(base_url, &room_id).map_err(|e| {
        error!("Invalid call base URL '{}': {}", base_url, e);
        AppError::Config("Bot misconfigured".to_string())
    })?;
    let results = [room_invite(&room_id, &call_url)];

    state
        .bot
        .answer_inline_query(token, &inline_query.id, &results)
        .await
        .map_err(|e| {
            error!("Failed to answer inline query: {}", e);
            AppError::Upstream("Failed to answer inline query".to_string())
        })?;

    info!(room = %room_id, "Room link sent to Telegram");
    Ok(OkResponse::ok())
}

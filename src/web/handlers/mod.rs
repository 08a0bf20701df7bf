pub mod telegram;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{AppError, Result};
use crate::livekit::{resolve_server_url, AccessToken, ConnectionDetails, VideoGrant};
use crate::rooms::{normalize_code, random_string};
use crate::state::AppState;

// ============================================================================
// Health
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Plain acknowledgement
#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

// ============================================================================
// Room registration
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRoomResponse {
    pub ok: bool,
    pub code_required: bool,
}

const REGISTER_FAILED: &str = "Failed to register room";

/// `POST /api/rooms` with `{ roomName, code? }`
///
/// The body is inspected loosely: a non-string `code` counts as no code,
/// anything but a non-empty string `roomName` is a client error.
pub async fn register_room(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<RegisterRoomResponse>)> {
    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        error!("Failed to register room: {}", e);
        AppError::Internal(REGISTER_FAILED.to_string())
    })?;

    let room_name = match payload.get("roomName").and_then(|v| v.as_str()) {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(AppError::BadRequest("Invalid roomName".to_string())),
    };
    let code = normalize_code(payload.get("code").and_then(|v| v.as_str()));

    let settings = state
        .rooms
        .set_room_settings(room_name, code)
        .map_err(|e| {
            error!("Failed to register room: {}", e);
            AppError::Internal(REGISTER_FAILED.to_string())
        })?;

    info!(
        room = room_name.trim(),
        code_required = settings.code_required(),
        "Room registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterRoomResponse {
            ok: true,
            code_required: settings.code_required(),
        }),
    ))
}

// ============================================================================
// Connection details
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetailsQuery {
    pub room_name: Option<String>,
    pub participant_name: Option<String>,
    pub metadata: Option<String>,
    pub region: Option<String>,
    pub code: Option<String>,
}

fn required_param(value: Option<String>, name: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing required query parameter: {}", name)))
}

/// `GET /api/connection-details`
///
/// Checks the room code against the registry and issues a participant token.
/// Rooms that were never registered (or have expired) are open.
pub async fn connection_details(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectionDetailsQuery>,
) -> Result<Json<ConnectionDetails>> {
    let room_name = required_param(query.room_name, "roomName")?;
    let participant_name = required_param(query.participant_name, "participantName")?;

    let credentials = state
        .config
        .livekit
        .credentials()
        .ok_or_else(|| AppError::Config("LiveKit is not configured".to_string()))?;

    if let Some(settings) = state.rooms.get_room_settings(&room_name) {
        if let Err(denied) = settings.check_code(query.code.as_deref()) {
            warn!(room = %room_name, reason = %denied, "Room access denied");
            return Err(AppError::Forbidden(denied.as_str().to_string()));
        }
    }

    let server_url = resolve_server_url(credentials.url, query.region.as_deref())
        .map_err(|e| AppError::Config(format!("Invalid LiveKit URL: {}", e)))?;

    let identity = format!("{}__{}", participant_name, random_string(4));
    let mut token = AccessToken::new(credentials.api_key, credentials.api_secret)
        .with_identity(identity)
        .with_name(participant_name.clone())
        .with_ttl(Duration::seconds(i64::from(state.config.livekit.token_ttl_secs)))
        .with_grant(VideoGrant::join(room_name.clone()));
    if let Some(metadata) = query.metadata.filter(|m| !m.is_empty()) {
        token = token.with_metadata(metadata);
    }
    let participant_token = token.to_jwt()?;

    info!(room = %room_name, participant = %participant_name, "Issued participant token");

    Ok(Json(ConnectionDetails {
        server_url,
        room_name,
        participant_name,
        participant_token,
    }))
}

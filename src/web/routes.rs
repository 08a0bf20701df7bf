use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::state::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/rooms", post(handlers::register_room))
        .route("/connection-details", get(handlers::connection_details))
        .route(
            "/telegram",
            get(handlers::telegram::status).post(handlers::telegram::webhook),
        );

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::{AppError, Result};
    use crate::livekit::{Claims, ConnectionDetails};
    use crate::rooms::{ManualClock, RoomStore, ROOM_LIFETIME_MS};
    use crate::telegram::{BotApi, InlineQueryResultArticle};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingBot {
        calls: Mutex<Vec<(String, String, Vec<InlineQueryResultArticle>)>>,
        fail: bool,
    }

    #[async_trait]
    impl BotApi for RecordingBot {
        async fn answer_inline_query(
            &self,
            token: &str,
            inline_query_id: &str,
            results: &[InlineQueryResultArticle],
        ) -> Result<()> {
            if self.fail {
                return Err(AppError::Upstream("Telegram API error: Bad Request".into()));
            }
            self.calls.lock().push((
                token.to_string(),
                inline_query_id.to_string(),
                results.to_vec(),
            ));
            Ok(())
        }
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.livekit.api_key = Some("devkey".into());
        config.livekit.api_secret = Some("devsecret".into());
        config.livekit.url = Some("wss://demo.livekit.cloud".into());
        config.telegram.bot_token = Some("123:abc".into());
        config.telegram.call_base_url = Some("https://call.example.com".into());
        config
    }

    struct Harness {
        router: Router,
        state: Arc<AppState>,
        clock: Arc<ManualClock>,
        bot: Arc<RecordingBot>,
    }

    fn harness_with(config: AppConfig, bot: RecordingBot) -> Harness {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let bot = Arc::new(bot);
        let state = AppState::new(config, RoomStore::with_clock(clock.clone()), bot.clone());
        Harness {
            router: create_router(state.clone()),
            state,
            clock,
            bot,
        }
    }

    fn harness() -> Harness {
        harness_with(test_config(), RecordingBot::default())
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(router: &Router, body: Value) -> (StatusCode, Value) {
        send(router, Method::POST, "/api/rooms", Some(body.to_string())).await
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let (status, body) = send(&h.router, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_room_with_code() {
        let h = harness();
        let (status, body) =
            register(&h.router, json!({"roomName": "  ab12-cd34 ", "code": " 777 "})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"ok": true, "codeRequired": true}));

        let settings = h.state.rooms.get_room_settings("ab12-cd34").unwrap();
        assert_eq!(settings.code.as_deref(), Some("777"));
    }

    #[tokio::test]
    async fn test_register_room_without_code() {
        let h = harness();
        let (status, body) = register(&h.router, json!({"roomName": "open", "code": 42})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["codeRequired"], false);
    }

    #[tokio::test]
    async fn test_register_room_invalid_name() {
        let h = harness();
        for payload in [json!({"roomName": "   "}), json!({"roomName": 5}), json!({})] {
            let (status, body) = register(&h.router, payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"ok": false, "error": "Invalid roomName"}));
        }
        assert!(h.state.rooms.is_empty());
    }

    #[tokio::test]
    async fn test_register_room_malformed_body() {
        let h = harness();
        let (status, body) =
            send(&h.router, Method::POST, "/api/rooms", Some("{not json".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to register room");
    }

    #[tokio::test]
    async fn test_connection_details_open_room() {
        let h = harness();
        let (status, body) = send(
            &h.router,
            Method::GET,
            "/api/connection-details?roomName=ab12-cd34&participantName=Anna&region=eu",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let details: ConnectionDetails = serde_json::from_value(body).unwrap();
        assert_eq!(details.server_url, "wss://demo.eu.production.livekit.cloud/");
        assert_eq!(details.room_name, "ab12-cd34");
        assert_eq!(details.participant_name, "Anna");

        let claims = decode::<Claims>(
            &details.participant_token,
            &DecodingKey::from_secret(b"devsecret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.iss, "devkey");
        assert!(claims.sub.starts_with("Anna__"));
        assert_eq!(claims.sub.len(), "Anna__".len() + 4);
        assert_eq!(claims.video.room.as_deref(), Some("ab12-cd34"));
        assert!(claims.video.room_join);
    }

    #[tokio::test]
    async fn test_connection_details_checks_code() {
        let h = harness();
        register(&h.router, json!({"roomName": "locked", "code": "ABC"})).await;

        let base = "/api/connection-details?roomName=locked&participantName=Anna";
        let (status, body) = send(&h.router, Method::GET, base, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"ok": false, "error": "code_required"}));

        let (status, body) =
            send(&h.router, Method::GET, &format!("{}&code=abc", base), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "code_invalid");

        let (status, _) = send(&h.router, Method::GET, &format!("{}&code=ABC", base), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_code_expires_with_room() {
        let h = harness();
        register(&h.router, json!({"roomName": "locked", "code": "ABC"})).await;
        h.clock.advance(ROOM_LIFETIME_MS + 1);

        let (status, _) = send(
            &h.router,
            Method::GET,
            "/api/connection-details?roomName=locked&participantName=Anna",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_connection_details_missing_params() {
        let h = harness();
        let (status, body) = send(
            &h.router,
            Method::GET,
            "/api/connection-details?roomName=x",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn test_connection_details_unconfigured() {
        let h = harness_with(AppConfig::default(), RecordingBot::default());
        let (status, _) = send(
            &h.router,
            Method::GET,
            "/api/connection-details?roomName=x&participantName=y",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_telegram_inline_query() {
        let h = harness();
        let update = json!({"update_id": 1, "inline_query": {"id": "q42", "query": ""}});
        let (status, body) =
            send(&h.router, Method::POST, "/api/telegram", Some(update.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let calls = h.bot.calls.lock();
        assert_eq!(calls.len(), 1);
        let (token, query_id, results) = &calls[0];
        assert_eq!(token, "123:abc");
        assert_eq!(query_id, "q42");
        let url = format!("https://call.example.com/rooms/{}", results[0].id);
        assert_eq!(
            results[0].input_message_content.message_text,
            format!("Присоединяйтесь к созвону: {}", url)
        );
    }

    #[tokio::test]
    async fn test_telegram_ignores_other_updates() {
        let h = harness();
        let update = json!({"update_id": 2, "message": {"text": "hi"}});
        let (status, body) =
            send(&h.router, Method::POST, "/api/telegram", Some(update.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
        assert!(h.bot.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_telegram_invalid_payload() {
        let h = harness();
        let (status, body) =
            send(&h.router, Method::POST, "/api/telegram", Some("garbage".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid payload");
    }

    #[tokio::test]
    async fn test_telegram_inline_query_without_id() {
        let h = harness();
        let update = json!({"update_id": 3, "inline_query": {"query": "call"}});
        let (status, body) =
            send(&h.router, Method::POST, "/api/telegram", Some(update.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid payload");
        assert!(h.bot.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_telegram_misconfigured() {
        let h = harness_with(AppConfig::default(), RecordingBot::default());
        let (status, body) =
            send(&h.router, Method::POST, "/api/telegram", Some("{}".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Bot misconfigured");
    }

    #[tokio::test]
    async fn test_telegram_api_failure() {
        let h = harness_with(
            test_config(),
            RecordingBot {
                fail: true,
                ..Default::default()
            },
        );
        let update = json!({"inline_query": {"id": "q1", "query": ""}});
        let (status, body) =
            send(&h.router, Method::POST, "/api/telegram", Some(update.to_string())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Failed to answer inline query");
    }

    #[tokio::test]
    async fn test_telegram_status() {
        let h = harness();
        let (status, body) = send(&h.router, Method::GET, "/api/telegram", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
    }
}

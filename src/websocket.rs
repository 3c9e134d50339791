//! HTTP surface: the `/ws/game/:room_id` upgrade endpoint and a `/health`
//! liveness check. Grounded on the teacher's `websocket/routes.rs` +
//! `websocket/handler.rs`, trimmed of token-binding negotiation this domain
//! doesn't need.

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{self, SESSION_COOKIE_NAME};
use crate::config::SecurityConfig;
use crate::handlers::Engine;
use crate::store::RoomStore;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub security: Arc<SecurityConfig>,
}

pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let cors = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/ws/game/{room_id}", get(websocket_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn websocket_handler(
    State(state): State<AppState>,
    Path(room_id): Path<uuid::Uuid>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let user = match extract_user(&headers, &state.security.session_secret) {
        Ok(user) => user,
        Err(err) => {
            return (StatusCode::UNAUTHORIZED, err.to_string()).into_response();
        }
    };

    match state.engine.store.get_room(room_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "room_not_found").into_response(),
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "internal").into_response(),
    }

    ws.on_upgrade(move |socket| async move {
        crate::session::run(state.engine, socket, room_id, user).await;
    })
}

fn extract_user(headers: &HeaderMap, secret: &str) -> Result<String, auth::AuthError> {
    let cookie_header = headers
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(auth::AuthError::Missing)?;

    let cookie_value = cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|kv| kv.strip_prefix(&format!("{}=", SESSION_COOKIE_NAME)))
        .ok_or(auth::AuthError::Missing)?;

    auth::verify_session_cookie(secret.as_bytes(), cookie_value, chrono::Utc::now())
}

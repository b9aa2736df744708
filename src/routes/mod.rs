pub mod auth_routes;
pub mod chat_routes;
pub mod page_routes;
pub mod transcript_routes;

use crate::state::SharedState;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Upper bound on request bodies; saved transcripts are the largest payloads.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub fn app(state: SharedState) -> Router {
    let static_dir = state.config.web_dir.join("static");

    Router::new()
        // Pages
        .route("/", get(page_routes::index))
        .route("/login", get(page_routes::login_page))
        // Auth
        .route("/login/custom", post(auth_routes::login_custom))
        .route("/logout", get(auth_routes::logout))
        // Chat
        .route("/chat", post(chat_routes::chat))
        // Transcripts
        .route("/save_chat", post(transcript_routes::save_chat))
        .route("/load_chats", get(transcript_routes::load_chats))
        .route("/health", get(health_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}

async fn health_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "atlaschat",
        "active_conversations": state.conversations.active_sessions()
    }))
}

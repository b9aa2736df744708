use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::AuthUser;
use crate::error::{ApiJson, AppError};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct SaveChatRequest {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub chat_content: Value,
    #[serde(default)]
    pub timestamp: Value,
}

/// Apply the optional session requirement for transcript endpoints.
fn guard(state: &SharedState, user: Result<AuthUser, AppError>) -> Result<(), AppError> {
    if state.config.protect_transcripts {
        user?;
    }
    Ok(())
}

/// POST /save_chat
pub async fn save_chat(
    State(state): State<SharedState>,
    user: Result<AuthUser, AppError>,
    ApiJson(body): ApiJson<SaveChatRequest>,
) -> Result<Json<Value>, AppError> {
    guard(&state, user)?;
    let chat_id = body.chat_id.unwrap_or_default();
    state
        .transcripts
        .save(&chat_id, body.chat_content, body.timestamp)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /load_chats
pub async fn load_chats(
    State(state): State<SharedState>,
    user: Result<AuthUser, AppError>,
) -> Result<Json<Value>, AppError> {
    guard(&state, user)?;
    let chats = state.transcripts.list_all().await?;
    Ok(Json(serde_json::json!({ "chats": chats })))
}

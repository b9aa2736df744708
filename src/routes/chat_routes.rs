use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{ApiJson, AppError};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /chat
pub async fn chat(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiJson(body): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = body.message.unwrap_or_default();
    let response = state
        .gateway
        .send_for(&state.conversations, &user.identity.id, &message)
        .await?;
    Ok(Json(ChatResponse { response }))
}

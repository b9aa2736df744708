use anyhow::Context;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;

/// GET / -- chat page, redirects to the login page without a session
pub async fn index(
    State(state): State<SharedState>,
    user: Result<AuthUser, AppError>,
) -> Result<Response, AppError> {
    if user.is_err() {
        return Ok(Redirect::to("/login").into_response());
    }
    render(&state, "index.html").await.map(IntoResponse::into_response)
}

/// GET /login
pub async fn login_page(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    render(&state, "login.html").await
}

async fn render(state: &SharedState, page: &str) -> Result<Html<String>, AppError> {
    let path = state.config.web_dir.join(page);
    let body = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read page {}", path.display()))?;
    Ok(Html(body))
}

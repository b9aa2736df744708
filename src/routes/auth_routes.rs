use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::{expired_session_cookie, session_cookie};
use crate::auth::{AuthUser, Identity, LoginError};
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /login/custom
pub async fn login_custom(
    State(state): State<SharedState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let email = match body {
        Ok(Json(body)) => body.email.unwrap_or_default(),
        Err(rejection) => {
            tracing::info!("login rejected: {}", rejection.body_text());
            return Ok(login_failure(LoginError::InvalidEmail.to_string()));
        }
    };
    let identity = match Identity::from_email(&email) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!("login rejected for {:?}: {}", email, e);
            return Ok(login_failure(e.to_string()));
        }
    };

    let token = state.sessions.issue(&identity)?;
    tracing::info!("login: {}", identity.email);

    let cookie = session_cookie(&token, state.sessions.ttl_secs(), state.config.secure_cookies);
    let body = LoginResponse {
        success: true,
        token: Some(token),
        error: None,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

fn login_failure(error: String) -> Response {
    let body = LoginResponse {
        success: false,
        token: None,
        error: Some(error),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// GET /logout -- revokes the session, forgets its conversation, and returns to the login page.
pub async fn logout(
    State(state): State<SharedState>,
    user: Result<AuthUser, AppError>,
) -> Response {
    if let Ok(user) = user {
        state.sessions.revoke(&user.token);
        state.conversations.remove(&user.identity.id);
        tracing::info!("logout: {}", user.identity.email);
    }
    (
        [(header::SET_COOKIE, expired_session_cookie(state.config.secure_cookies))],
        Redirect::to("/login"),
    )
        .into_response()
}

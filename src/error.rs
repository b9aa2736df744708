use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::identity::LoginError;
use crate::chat::gateway::ChatError;
use crate::transcripts::store::StoreError;

/// User-facing text for upstream completion failures. The real cause is only logged.
pub const UPSTREAM_UNAVAILABLE: &str = "the assistant is unavailable right now, please try again";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("completion upstream: {0}")]
    Gateway(anyhow::Error),
    #[error("storage: {0}")]
    Storage(anyhow::Error),
    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code returned next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Unauthorized => "unauthorized",
            AppError::Gateway(_) => "upstream_error",
            AppError::Storage(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".into()),
            AppError::Gateway(e) => {
                tracing::error!("completion upstream error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    UPSTREAM_UNAVAILABLE.into(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("transcript storage error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".into())
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".into(),
                )
            }
        };
        (
            status,
            axum::Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}

/// `Json` whose rejections (bad syntax, wrong field types, missing content type)
/// surface as 400 validation errors with the usual JSON body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage => AppError::Validation(err.to_string()),
            ChatError::Upstream(e) => AppError::Gateway(e),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => AppError::Validation(msg),
            StoreError::Io(e) => AppError::Storage(e),
        }
    }
}

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod providers;
pub mod routes;
pub mod state;
pub mod transcripts;

use std::sync::Arc;

use auth::SessionTokens;
use chat::{CompletionGateway, CompletionParams};
use config::ServerConfig;
use providers::Provider;
use state::{AppState, SharedState};
use transcripts::TranscriptStore;

/// Assemble the shared application state from config and a completion provider.
pub fn build_state(
    config: ServerConfig,
    session_secret: &str,
    provider: Arc<dyn Provider>,
) -> SharedState {
    let sessions = SessionTokens::new(session_secret, config.session_ttl_secs);
    let gateway = CompletionGateway::new(
        provider,
        config.completion.system_prompt.clone(),
        CompletionParams::from(&config.completion),
    );
    let transcripts = TranscriptStore::new(config.chats_dir.clone());
    AppState::new(config, sessions, gateway, transcripts)
}

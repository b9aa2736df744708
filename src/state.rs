use crate::auth::SessionTokens;
use crate::chat::{CompletionGateway, ConversationStore};
use crate::config::ServerConfig;
use crate::transcripts::TranscriptStore;
use std::sync::Arc;
use std::time::Duration;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: ServerConfig,
    pub sessions: SessionTokens,
    pub conversations: ConversationStore,
    pub gateway: CompletionGateway,
    pub transcripts: TranscriptStore,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        sessions: SessionTokens,
        gateway: CompletionGateway,
        transcripts: TranscriptStore,
    ) -> SharedState {
        let conversations = ConversationStore::new(
            config.completion.history_limit,
            Duration::from_secs(config.conversation_idle_secs),
            config.max_conversations,
        );
        Arc::new(Self {
            config,
            sessions,
            conversations,
            gateway,
            transcripts,
        })
    }
}

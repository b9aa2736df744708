use std::sync::Arc;

use crate::chat::conversation::{Conversation, ConversationStore, Message};
use crate::chat::markup::strip_reasoning;
use crate::config::CompletionConfig;
use crate::providers::{CompletionRequest, Provider};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("completion failed: {0}")]
    Upstream(anyhow::Error),
}

/// Fixed sampling parameters applied to every completion call.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl From<&CompletionConfig> for CompletionParams {
    fn from(cfg: &CompletionConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
        }
    }
}

/// Relays a conversation to the completion provider and records the cleaned reply.
pub struct CompletionGateway {
    provider: Arc<dyn Provider>,
    system_prompt: String,
    params: CompletionParams,
}

impl CompletionGateway {
    pub fn new(
        provider: Arc<dyn Provider>,
        system_prompt: impl Into<String>,
        params: CompletionParams,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            params,
        }
    }

    /// Send `user_message` in the context of `conversation` and return the cleaned reply.
    ///
    /// The user turn and the reply are committed together once the provider
    /// answers; a failed call leaves the conversation untouched.
    pub async fn send(
        &self,
        conversation: &mut Conversation,
        user_message: &str,
    ) -> Result<String, ChatError> {
        if user_message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let user = Message::user(user_message);
        let request = self.build_request(conversation, &user);

        let raw = self
            .provider
            .complete(&request)
            .await
            .map_err(ChatError::Upstream)?;
        let reply = strip_reasoning(&raw).trim().to_string();

        conversation.push_exchange(user, Message::assistant(reply.clone()));
        Ok(reply)
    }

    /// Resolve `identity`'s conversation in `store`, then [`send`](Self::send).
    ///
    /// The conversation lock is held across the provider call, so sends for
    /// one identity are serialized while other identities proceed.
    pub async fn send_for(
        &self,
        store: &ConversationStore,
        identity: &str,
        user_message: &str,
    ) -> Result<String, ChatError> {
        if user_message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let session = store.session(identity);
        let mut conversation = session.lock().await;
        tracing::debug!(
            identity,
            history = conversation.len(),
            provider = self.provider.name(),
            "sending completion request"
        );
        self.send(&mut conversation, user_message).await
    }

    fn build_request(&self, conversation: &Conversation, user: &Message) -> CompletionRequest {
        let mut messages = Vec::with_capacity(conversation.len() + 2);
        messages.push(Message::system(self.system_prompt.as_str()));
        messages.extend(conversation.messages().cloned());
        messages.push(user.clone());

        CompletionRequest {
            model: self.params.model.clone(),
            messages,
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
            top_p: self.params.top_p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::conversation::Role;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Replies with a fixed script and records every request it receives.
    struct ScriptedProvider {
        reply: Result<String, String>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(msg: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(msg.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
            self.seen.lock().push(request.clone());
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn params() -> CompletionParams {
        CompletionParams::from(&CompletionConfig::default())
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_upstream_call() {
        let provider = ScriptedProvider::ok("unused");
        let gateway = CompletionGateway::new(provider.clone(), "sys", params());
        let mut conv = Conversation::new(10);

        let err = gateway.send(&mut conv, "").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert!(provider.seen.lock().is_empty());
        assert!(conv.is_empty());
    }

    #[tokio::test]
    async fn request_carries_system_prompt_history_and_params() {
        let provider = ScriptedProvider::ok("ikinci");
        let gateway = CompletionGateway::new(provider.clone(), "sys", params());
        let mut conv = Conversation::new(10);
        conv.push_exchange(Message::user("ilk"), Message::assistant("cevap"));

        gateway.send(&mut conv, "soru").await.unwrap();

        let seen = provider.seen.lock();
        let req = &seen[0];
        assert_eq!(req.model, "qwen/qwen3-32b");
        assert_eq!(req.max_tokens, 4096);
        let roles: Vec<Role> = req.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(req.messages[0].content, "sys");
        assert_eq!(req.messages[3].content, "soru");
    }

    #[tokio::test]
    async fn reply_is_stripped_trimmed_and_recorded() {
        let provider = ScriptedProvider::ok("<think>\nplanning\n</think>\n\n  Merhaba!  ");
        let gateway = CompletionGateway::new(provider, "sys", params());
        let mut conv = Conversation::new(10);

        let reply = gateway.send(&mut conv, "selam").await.unwrap();
        assert_eq!(reply, "Merhaba!");

        let recorded: Vec<&Message> = conv.messages().collect();
        assert_eq!(recorded.len(), 2);
        assert_eq!(*recorded[0], Message::user("selam"));
        assert_eq!(*recorded[1], Message::assistant("Merhaba!"));
    }

    #[tokio::test]
    async fn upstream_failure_leaves_history_untouched() {
        let provider = ScriptedProvider::failing("503 service unavailable");
        let gateway = CompletionGateway::new(provider, "sys", params());
        let mut conv = Conversation::new(10);
        conv.push_exchange(Message::user("q"), Message::assistant("a"));

        let err = gateway.send(&mut conv, "again").await.unwrap_err();
        assert!(matches!(err, ChatError::Upstream(_)));
        assert_eq!(conv.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_identities_do_not_share_context() {
        let provider = ScriptedProvider::ok("ok");
        let gateway = CompletionGateway::new(provider.clone(), "sys", params());
        let store = ConversationStore::new(10, Duration::from_secs(3600), 100);

        let (a, b) = tokio::join!(
            gateway.send_for(&store, "ayse", "ayse-1"),
            gateway.send_for(&store, "mehmet", "mehmet-1"),
        );
        a.unwrap();
        b.unwrap();
        let (a, b) = tokio::join!(
            gateway.send_for(&store, "ayse", "ayse-2"),
            gateway.send_for(&store, "mehmet", "mehmet-2"),
        );
        a.unwrap();
        b.unwrap();

        for req in provider.seen.lock().iter() {
            let users: Vec<&str> = req
                .messages
                .iter()
                .filter(|m| m.role == Role::User)
                .map(|m| m.content.as_str())
                .collect();
            let owner = users[0].split('-').next().unwrap();
            assert!(
                users.iter().all(|u| u.starts_with(owner)),
                "context mixed identities: {users:?}"
            );
        }
        assert_eq!(store.session("ayse").lock().await.len(), 4);
        assert_eq!(store.session("mehmet").lock().await.len(), 4);
    }
}

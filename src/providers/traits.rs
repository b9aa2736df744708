use crate::chat::conversation::Message;
use async_trait::async_trait;

/// One chat-completion call: the full message list plus sampling parameters.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Display name used in logs and error messages.
    fn name(&self) -> &str;

    /// Send `request` and return the text of the first choice.
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String>;

    /// Warm up the HTTP connection pool (TLS handshake, DNS, HTTP/2 setup).
    /// Default implementation is a no-op; providers with HTTP clients should override.
    async fn warmup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

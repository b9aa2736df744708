//! Generic OpenAI-compatible provider.
//! Groq, OpenAI, OpenRouter and most hosted LLM APIs accept the same
//! `/v1/chat/completions` request, so one client serves all of them.

use crate::chat::conversation::Message;
use crate::providers::traits::{CompletionRequest, Provider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenAiCompatibleProvider {
    pub(crate) name: String,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    /// Reasoning/thinking models may return output in `reasoning_content`.
    #[serde(default)]
    reasoning_content: Option<String>,
}

impl ResponseMessage {
    fn effective_content(self) -> String {
        match self.content {
            Some(c) if !c.is_empty() => c,
            _ => self.reasoning_content.unwrap_or_default(),
        }
    }
}

impl OpenAiCompatibleProvider {
    pub fn new(name: &str, base_url: &str, api_key: Option<&str>) -> Self {
        Self::with_timeouts(name, base_url, api_key, 120, 10)
    }

    pub fn with_timeouts(
        name: &str,
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()).map(ToString::to_string),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .connect_timeout(Duration::from_secs(connect_timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "{} API key not set. Set GROQ_API_KEY / ATLASCHAT_API_KEY or edit atlaschat.toml.",
                self.name
            )
        })?;

        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await?;
            anyhow::bail!(
                "{} API error from /v1/chat/completions ({}): {error}",
                self.name,
                status
            );
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.effective_content())
            .ok_or_else(|| anyhow::anyhow!("No response from {}", self.name))
    }

    async fn warmup(&self) -> anyhow::Result<()> {
        if let Some(api_key) = self.api_key.as_ref() {
            self.client
                .get(format!("{}/v1/models", self.base_url))
                .header("Authorization", format!("Bearer {api_key}"))
                .send()
                .await?
                .error_for_status()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> CompletionRequest {
        CompletionRequest {
            model: "qwen/qwen3-32b".into(),
            messages: vec![Message::system("be brief"), Message::user("merhaba")],
            max_tokens: 4096,
            temperature: 0.6,
            top_p: 0.95,
        }
    }

    #[test]
    fn creates_with_key() {
        let p = OpenAiCompatibleProvider::new("Groq", "https://api.groq.com/openai", Some("gsk"));
        assert_eq!(p.name, "Groq");
        assert_eq!(p.base_url, "https://api.groq.com/openai");
        assert_eq!(p.api_key.as_deref(), Some("gsk"));
    }

    #[test]
    fn strips_trailing_slash_and_ignores_empty_key() {
        let p = OpenAiCompatibleProvider::new("Custom", "http://localhost:8000/", Some(""));
        assert_eq!(p.completions_url(), "http://localhost:8000/v1/chat/completions");
        assert!(p.api_key.is_none());
    }

    #[test]
    fn request_serializes_sampling_parameters() {
        let req = sample_request();
        let body = ChatRequest {
            model: &req.model,
            messages: &req.messages,
            max_tokens: req.max_tokens,
            temperature: req.temperature,
            top_p: req.top_p,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "qwen/qwen3-32b");
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["top_p"], 0.95);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "merhaba");
    }

    #[test]
    fn falls_back_to_reasoning_content() {
        let json = r#"{"choices":[{"message":{"content":"","reasoning_content":"fallback"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        let text = resp.choices.into_iter().next().unwrap().message.effective_content();
        assert_eq!(text, "fallback");
    }

    #[tokio::test]
    async fn fails_without_key() {
        let p = OpenAiCompatibleProvider::new("Groq", "https://api.groq.com/openai", None);
        let err = p.complete(&sample_request()).await.unwrap_err();
        assert!(err.to_string().contains("API key not set"));
    }

    #[tokio::test]
    async fn returns_first_choice_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "qwen/qwen3-32b",
                "max_tokens": 4096,
                "temperature": 0.6,
                "top_p": 0.95,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "<think>hmm</think>Selam!"}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let p = OpenAiCompatibleProvider::new("Groq", &server.uri(), Some("test-key"));
        let text = p.complete(&sample_request()).await.unwrap();
        assert_eq!(text, "<think>hmm</think>Selam!");
    }

    #[tokio::test]
    async fn error_status_surfaces_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limit reached"))
            .mount(&server)
            .await;

        let p = OpenAiCompatibleProvider::new("Groq", &server.uri(), Some("test-key"));
        let err = p.complete(&sample_request()).await.unwrap_err().to_string();
        assert!(err.contains("429"));
        assert!(err.contains("rate limit reached"));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let p = OpenAiCompatibleProvider::new("Groq", &server.uri(), Some("test-key"));
        let err = p.complete(&sample_request()).await.unwrap_err();
        assert!(err.to_string().contains("No response from Groq"));
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let p = OpenAiCompatibleProvider::new("Groq", &server.uri(), Some("test-key"));
        assert!(p.complete(&sample_request()).await.is_err());
    }
}

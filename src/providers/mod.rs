pub mod compatible;
pub mod traits;

pub use traits::{CompletionRequest, Provider};

use crate::config::CompletionConfig;
use compatible::OpenAiCompatibleProvider;

/// Factory: create the right provider from config
pub fn create_provider(cfg: &CompletionConfig) -> anyhow::Result<Box<dyn Provider>> {
    let key = cfg.api_key.as_deref();
    let build = |name: &str, url: &str| {
        Box::new(OpenAiCompatibleProvider::with_timeouts(
            name,
            url,
            key,
            cfg.timeout_secs,
            cfg.connect_timeout_secs,
        )) as Box<dyn Provider>
    };

    match cfg.provider.as_str() {
        "groq" => Ok(build("Groq", "https://api.groq.com/openai")),
        "openai" => Ok(build("OpenAI", "https://api.openai.com")),
        "openrouter" => Ok(build("OpenRouter", "https://openrouter.ai/api")),

        // ── Custom OpenAI-compatible endpoint ────────────────
        name if name.starts_with("custom:") => {
            let base_url = name.strip_prefix("custom:").unwrap_or("");
            if base_url.is_empty() {
                anyhow::bail!("Custom provider requires a URL. Format: custom:https://your-api.com");
            }
            Ok(build("Custom", base_url))
        }

        _ => anyhow::bail!(
            "Unknown provider: {}. Check README for supported providers or use custom:<url>.",
            cfg.provider
        ),
    }
}

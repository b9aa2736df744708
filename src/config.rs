use serde::Deserialize;
use std::path::PathBuf;

/// Default system instruction sent ahead of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Sen sadece Türkçe konuşan bir yardımcı AI'sin. Tüm cevaplarını Türkçe ver. Kısa ve anlaşılır ol. Sen Atlas Design tarafından oluşturulmuş bir AI'sin. Kim olduğun sorulursa, bunu belirt.";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_chats_dir")]
    pub chats_dir: PathBuf,
    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,
    pub session_secret: Option<String>,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,
    /// Mark the session cookie `Secure`; enable when served over HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
    /// Require a session for `/save_chat` and `/load_chats`.
    #[serde(default)]
    pub protect_transcripts: bool,
    /// Seconds without a request after which a conversation is forgotten.
    #[serde(default = "default_conversation_idle")]
    pub conversation_idle_secs: u64,
    /// Upper bound on conversations held in memory.
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Messages kept per conversation before the oldest turns are evicted.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            system_prompt: default_system_prompt(),
            history_limit: default_history_limit(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// Default functions
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_chats_dir() -> PathBuf {
    PathBuf::from("chats")
}
fn default_web_dir() -> PathBuf {
    PathBuf::from("web")
}
fn default_session_ttl() -> i64 {
    86_400
}
fn default_conversation_idle() -> u64 {
    3600
}
fn default_max_conversations() -> usize {
    10_000
}
fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "qwen/qwen3-32b".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f64 {
    0.6
}
fn default_top_p() -> f64 {
    0.95
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_history_limit() -> usize {
    40
}
fn default_timeout() -> u64 {
    120
}
fn default_connect_timeout() -> u64 {
    10
}

impl ServerConfig {
    /// Reject settings that would only fail later at request time.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.session_ttl_secs <= 0 {
            anyhow::bail!("session_ttl_secs must be positive");
        }
        if self.conversation_idle_secs == 0 {
            anyhow::bail!("conversation_idle_secs must be positive");
        }
        if self.max_conversations == 0 {
            anyhow::bail!("max_conversations must be positive");
        }
        if self.completion.history_limit < 2 {
            anyhow::bail!("completion.history_limit must be at least 2");
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            anyhow::bail!("completion.temperature must be within 0.0..=2.0");
        }
        if !(0.0..=1.0).contains(&self.completion.top_p) {
            anyhow::bail!("completion.top_p must be within 0.0..=1.0");
        }
        if self.completion.max_tokens == 0 {
            anyhow::bail!("completion.max_tokens must be positive");
        }
        Ok(())
    }
}

/// Load config from TOML file with env var overrides.
pub fn load(path: &str) -> anyhow::Result<ServerConfig> {
    let content = if std::path::Path::new(path).exists() {
        std::fs::read_to_string(path)?
    } else {
        tracing::warn!("Config file not found at {}, using defaults", path);
        String::new()
    };

    let mut config: ServerConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides(
    config: &mut ServerConfig,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = var("ATLASCHAT_HOST") {
        config.host = v;
    }
    if let Some(v) = var("ATLASCHAT_PORT") {
        config.port = v.parse()?;
    }
    if let Some(v) = var("ATLASCHAT_CHATS_DIR") {
        config.chats_dir = PathBuf::from(v);
    }
    if let Some(v) = var("ATLASCHAT_SECURE_COOKIES") {
        config.secure_cookies = matches!(v.as_str(), "1" | "true" | "yes");
    }
    if let Some(v) = var("ATLASCHAT_SESSION_SECRET") {
        config.session_secret = Some(v);
    }
    if let Some(v) = var("ATLASCHAT_PROVIDER") {
        config.completion.provider = v;
    }
    if let Some(v) = var("ATLASCHAT_MODEL") {
        config.completion.model = v;
    }
    // Provider-specific key first, generic key wins when both are set.
    if let Some(v) = var("GROQ_API_KEY") {
        config.completion.api_key = Some(v);
    }
    if let Some(v) = var("ATLASCHAT_API_KEY") {
        config.completion.api_key = Some(v);
    }
    Ok(())
}

use anyhow::Context;
use atlaschat::{auth, config, providers, routes};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "atlaschat", about = "Atlas chat backend", version)]
struct Cli {
    /// Path to TOML config file
    #[arg(short, long, default_value = "atlaschat.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Load and validate the config, then print the effective settings
    CheckConfig,
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging from RUST_LOG (default: info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atlaschat=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config))?;

    match cli.command {
        Commands::Serve => serve(cfg).await,
        Commands::CheckConfig => check_config(&cfg),
    }
}

// ── Serve ──────────────────────────────────────────────────────────────────

async fn serve(cfg: config::ServerConfig) -> anyhow::Result<()> {
    let secret = auth::secret::load_or_create(cfg.session_secret.as_deref(), &cfg.data_dir)
        .context("failed to load session secret")?;

    let provider: Arc<dyn providers::Provider> =
        Arc::from(providers::create_provider(&cfg.completion)?);
    if cfg.completion.api_key.is_none() {
        tracing::warn!(
            "No API key configured for {}; /chat will fail until GROQ_API_KEY or ATLASCHAT_API_KEY is set",
            provider.name()
        );
    } else if let Err(e) = provider.warmup().await {
        tracing::warn!("Provider warmup failed: {}", e);
    }
    info!(
        "Completion provider: {} (model {})",
        provider.name(),
        cfg.completion.model
    );

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid bind address")?;

    let state = atlaschat::build_state(cfg, &secret, provider);
    state
        .transcripts
        .ensure_dir()
        .await
        .context("failed to create chats directory")?;
    info!(
        "Transcripts stored in {}",
        state.transcripts.dir().display()
    );

    let app = routes::app(state);

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped.");
    Ok(())
}

// ── Check config ───────────────────────────────────────────────────────────

fn check_config(cfg: &config::ServerConfig) -> anyhow::Result<()> {
    providers::create_provider(&cfg.completion)?;
    println!("bind:                {}:{}", cfg.host, cfg.port);
    println!("chats_dir:           {}", cfg.chats_dir.display());
    println!("web_dir:             {}", cfg.web_dir.display());
    println!("protect_transcripts: {}", cfg.protect_transcripts);
    println!("secure_cookies:      {}", cfg.secure_cookies);
    println!("provider:            {}", cfg.completion.provider);
    println!("model:               {}", cfg.completion.model);
    println!(
        "sampling:            max_tokens={} temperature={} top_p={}",
        cfg.completion.max_tokens, cfg.completion.temperature, cfg.completion.top_p
    );
    println!("history_limit:       {}", cfg.completion.history_limit);
    println!(
        "api_key:             {}",
        if cfg.completion.api_key.is_some() { "set" } else { "missing" }
    );
    println!(
        "session_secret:      {}",
        if cfg.session_secret.is_some() { "configured" } else { "file/generated" }
    );
    Ok(())
}

// ── Graceful shutdown ──────────────────────────────────────────────────────

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server...");
}

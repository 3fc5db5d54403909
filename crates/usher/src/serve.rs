// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `usher serve` command implementation.
//!
//! Loads the event catalog, builds the embedding index, opens the booking
//! ledger, selects the configured generation backend, and serves WebSocket
//! sessions over axum.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use usher_agent::{templates, SessionDeps, SessionOptions};
use usher_cache::{MemoryCache, NoopCache};
use usher_catalog::EventStore;
use usher_config::UsherConfig;
use usher_context::ContextStore;
use usher_core::{Embedder, GenerationProvider, TtlCache, UsherError};
use usher_gemini::GeminiProvider;
use usher_ledger::BookingLedger;
use usher_ollama::OllamaProvider;
use usher_search::{OnnxEmbedder, SearchEngine};

use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared services every session borrows.
    pub deps: SessionDeps,
    /// Per-session tunables lifted from config.
    pub opts: SessionOptions,
}

/// Runs the `usher serve` command.
///
/// Wires every service explicitly, then blocks on the axum server until
/// the process is terminated.
pub async fn run_serve(config: UsherConfig) -> Result<(), UsherError> {
    init_tracing(&config.agent.log_level);

    info!(name = config.agent.name.as_str(), "starting usher serve");

    let store = Arc::new(EventStore::load(Path::new(&config.server.catalog_path)).await?);
    info!(
        events = store.len(),
        path = config.server.catalog_path.as_str(),
        "event catalog loaded"
    );

    let cache: Arc<dyn TtlCache> = if config.cache.enabled {
        Arc::new(MemoryCache::new(config.cache.capacity))
    } else {
        info!("caching disabled by configuration");
        Arc::new(NoopCache)
    };

    let embedder: Arc<dyn Embedder> =
        Arc::new(OnnxEmbedder::new(Path::new(&config.embedding.model_path))?);
    let engine = Arc::new(SearchEngine::build(
        store.clone(),
        embedder,
        cache.clone(),
        config.search.relevance_threshold,
        Duration::from_secs(config.search.cache_ttl_secs),
    )?);

    let ledger = Arc::new(BookingLedger::new(
        PathBuf::from(&config.server.bookings_path),
        store.clone(),
    ));

    let contexts = Arc::new(ContextStore::new(
        cache.clone(),
        config.context.history_turns,
        config.context.mentioned_events,
        Duration::from_secs(config.context.ttl_secs),
    ));

    let provider = build_provider(&config)?;
    info!(backend = provider.name(), "generation backend ready");

    let state = AppState {
        deps: SessionDeps {
            engine,
            ledger,
            contexts,
            provider,
            cache,
        },
        opts: SessionOptions {
            system_prompt: config
                .agent
                .system_prompt
                .clone()
                .unwrap_or_else(|| templates::SYSTEM_PROMPT.to_string()),
            max_reply_tokens: config.agent.max_reply_tokens,
            top_k: config.search.top_k,
            similar_top_k: config.search.similar_top_k,
            reply_ttl: Duration::from_secs(config.cache.reply_ttl_secs),
            generation_timeout: Duration::from_secs(config.provider.timeout_secs),
        },
    };

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = &config.server.bind_address;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| UsherError::Config(format!("failed to bind to {addr}: {e}")))?;

    info!("listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| UsherError::Internal(format!("server error: {e}")))?;

    Ok(())
}

/// Constructs the generation backend named by `provider.backend`.
fn build_provider(config: &UsherConfig) -> Result<Arc<dyn GenerationProvider>, UsherError> {
    match config.provider.backend.as_str() {
        "ollama" => {
            debug!(
                url = config.ollama.url.as_str(),
                model = config.ollama.model.as_str(),
                "using ollama backend"
            );
            Ok(Arc::new(OllamaProvider::new(
                config.ollama.url.clone(),
                config.ollama.model.clone(),
                config.ollama.temperature,
                Duration::from_secs(config.ollama.timeout_secs),
            )?))
        }
        "gemini" => {
            debug!(model = config.gemini.model.as_str(), "using gemini backend");
            Ok(Arc::new(GeminiProvider::new(
                config.gemini.api_key.clone(),
                config.gemini.model.clone(),
                config.gemini.temperature,
                Duration::from_secs(config.provider.timeout_secs),
            )?))
        }
        other => Err(UsherError::Config(format!(
            "unknown provider backend '{other}' (expected 'ollama' or 'gemini')"
        ))),
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("usher={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

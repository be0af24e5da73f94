//! Relay Server - agent chain service backend
//!
//! A standalone Rust backend server for the Relay agent chain, providing:
//! - `POST /process` - run the chain on a query, streaming progress over SSE
//! - `GET /health` - liveness probe
//! - `GET /metrics` - Prometheus text exposition of the orchestrator counters
//!
//! This crate can be used standalone (via `relay-cli`) or embedded in other
//! applications that bring their own agents.

pub mod api;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use relay_core::{AgentCapability, MetricsRegistry, Orchestrator, RelaySettings};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use self::state::{AppState, AppStateInner};

/// Configuration for the Relay backend server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl From<&RelaySettings> for ServerConfig {
    fn from(settings: &RelaySettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the relay crates log at `level`.
pub fn init_tracing(level: &str) {
    let default_filter = format!(
        "relay_server={level},relay_core={level},relay_cli={level},tower_http=info",
        level = level.to_lowercase()
    );
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .try_init();
}

/// Create a shared `AppState` from settings and an already-built agent chain.
pub fn create_app_state(
    settings: RelaySettings,
    agents: Vec<Arc<dyn AgentCapability>>,
    metrics: Arc<MetricsRegistry>,
) -> Result<AppState, String> {
    settings
        .validate()
        .map_err(|e| format!("Invalid settings: {}", e))?;

    let orchestrator = Orchestrator::new(agents, settings.orchestrator_config(), metrics.clone())
        .map_err(|e| format!("Failed to build orchestrator: {}", e))?;

    Ok(Arc::new(AppStateInner::new(settings, orchestrator, metrics)))
}

/// Create a shared `AppState` for the chain described by `settings`.
pub fn create_app_state_from_settings(settings: RelaySettings) -> Result<AppState, String> {
    let agents = settings
        .chain()
        .and_then(|chain| chain.build_agents())
        .map_err(|e| format!("Failed to load agent chain: {}", e))?;

    create_app_state(settings, agents, Arc::new(MetricsRegistry::new()))
}

/// Build the HTTP router for `state`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server with a pre-built `AppState`.
///
/// Returns the actual address the server is listening on; the serve loop
/// runs in a background task.
pub async fn start_server(config: ServerConfig, state: AppState) -> Result<SocketAddr, String> {
    tracing::info!(
        "Starting {} on {}:{} (chain: {})",
        state.settings.app_name,
        config.host,
        config.port,
        state.orchestrator.workflow_name()
    );

    let app = build_router(state);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("Relay server listening on {}", local_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local_addr)
}

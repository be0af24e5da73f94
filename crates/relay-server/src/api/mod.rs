pub mod health;
pub mod metrics;
pub mod process;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all sub-routes.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/process", process::router())
        .nest("/health", health::router())
        .nest("/metrics", metrics::router())
}

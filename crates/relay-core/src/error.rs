//! Core error types for the Relay service.
//!
//! `ServerError` is the HTTP-facing error. When the `axum` feature is enabled,
//! it also implements `IntoResponse` so it can be used directly as an axum
//! handler error type. `ConfigError` covers everything that can go wrong
//! while assembling a chain at startup.

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Startup-time configuration failures. These are fatal to process startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Need at least two agents for agent-to-agent orchestration, got {0}")]
    TooFewAgents(usize),

    #[error("Agent at position {0} has an empty name")]
    EmptyAgentName(usize),

    #[error("Duplicate agent name '{0}'")]
    DuplicateAgentName(String),

    #[error("Unknown adapter '{adapter}' for agent '{agent}'")]
    UnknownAdapter { agent: String, adapter: String },

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("Failed to load chain definition: {0}")]
    Chain(String),
}

// ---------------------------------------------------------------------------
// axum integration (opt-in via feature flag)
// ---------------------------------------------------------------------------

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(all(test, feature = "axum"))]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;

    #[test]
    fn test_bad_request_response() {
        let response = ServerError::BadRequest("Invalid request body".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}

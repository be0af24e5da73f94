//! Process API - /process
//!
//! POST /process - Run the agent chain on a query with SSE progress streaming
//!
//! Request body: `{"query": "<non-empty string>"}`. Every SSE event carries
//! one JSON-encoded progress event or the final result in its `data:` field.

use axum::{
    body::Bytes,
    extract::State,
    response::sse::{Event, Sse},
    routing::post,
    Router,
};
use relay_core::{ServerError, WorkflowMessage};
use std::convert::Infallible;
use std::pin::Pin;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

type SseStream = Pin<Box<dyn tokio_stream::Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(process))
}

/// Extract a usable query from a raw request body.
fn parse_query(body: &[u8]) -> Result<String, ServerError> {
    let json: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "Invalid request body");
        ServerError::BadRequest("Invalid request body".to_string())
    })?;

    match json.get("query").and_then(|q| q.as_str()) {
        Some(q) if !q.trim().is_empty() => Ok(q.to_string()),
        _ => Err(ServerError::BadRequest("Invalid 'query' in request".to_string())),
    }
}

fn to_event(message: WorkflowMessage) -> Event {
    match message.to_json() {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode workflow event");
            Event::default().comment("encoding error")
        }
    }
}

async fn process(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Sse<SseStream>, ServerError> {
    let query = parse_query(&body)?;

    tracing::info!(
        query_chars = query.chars().count(),
        workflow = %state.orchestrator.workflow_name(),
        "Processing query"
    );

    let stream: SseStream = Box::pin(
        state
            .orchestrator
            .execute(query)
            .map(|message| Ok::<_, Infallible>(to_event(message))),
    );
    Ok(Sse::new(stream))
}

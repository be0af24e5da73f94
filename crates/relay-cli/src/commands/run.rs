//! `relay run`: Execute the chain once and print the event stream.
//!
//! Each event is printed as its wire frame (`data: {...}`), so the output is
//! exactly what an HTTP client of `/process` would receive.

use std::sync::Arc;

use relay_core::{MetricsRegistry, Orchestrator, RelaySettings};
use tokio_stream::StreamExt;

pub async fn run(settings: RelaySettings, query: String) -> Result<(), String> {
    relay_server::init_tracing(&settings.log_level);

    if query.trim().is_empty() {
        return Err("Query must not be empty".to_string());
    }
    settings
        .validate()
        .map_err(|e| format!("Invalid settings: {}", e))?;

    let agents = settings
        .chain()
        .and_then(|chain| chain.build_agents())
        .map_err(|e| format!("Failed to load agent chain: {}", e))?;
    let orchestrator = Orchestrator::new(
        agents,
        settings.orchestrator_config(),
        Arc::new(MetricsRegistry::new()),
    )
    .map_err(|e| format!("Failed to build orchestrator: {}", e))?;

    let mut stream = orchestrator.execute(query);
    let mut completed = false;
    while let Some(message) = stream.next().await {
        completed = message.is_final();
        let frame = message
            .encode_frame()
            .map_err(|e| format!("Failed to encode event: {}", e))?;
        print!("{}", frame);
    }

    if completed {
        Ok(())
    } else {
        Err("Workflow did not complete".to_string())
    }
}

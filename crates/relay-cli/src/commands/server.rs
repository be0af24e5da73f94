//! `relay server`: Start the Relay HTTP server.

use relay_core::RelaySettings;

pub async fn run(settings: RelaySettings) -> Result<(), String> {
    relay_server::init_tracing(&settings.log_level);

    let config = relay_server::ServerConfig::from(&settings);
    let state = relay_server::create_app_state_from_settings(settings)?;

    println!("Starting Relay server on {}:{}...", config.host, config.port);

    let addr = relay_server::start_server(config, state).await?;
    println!("Relay server listening on http://{}", addr);

    // Keep the process running until interrupted
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    println!("\nShutting down...");
    Ok(())
}

//! Relay CLI: run the agent chain service or execute a chain locally.
//!
//! Reuses the same core domain logic (relay-core) and server bootstrap
//! (relay-server) as the HTTP deployment.

mod commands;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use relay_core::RelaySettings;

/// Relay: sequential agent chain orchestration
#[derive(Parser)]
#[command(name = "relay", version, about = "Relay: sequential agent chain orchestration")]
pub struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every subcommand, each with an environment fallback.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Application name reported by /health
    #[arg(long, env = "RELAY_APP_NAME", default_value = relay_core::config::DEFAULT_APP_NAME, global = true)]
    app_name: String,

    /// Log level for the relay crates (overridden by RUST_LOG)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Per-step timeout in seconds
    #[arg(long, env = "AGENT_TIMEOUT_SECONDS", default_value_t = 30, global = true)]
    agent_timeout: u64,

    /// Total attempts per step on transient failures
    #[arg(long, env = "AGENT_RETRY_ATTEMPTS", default_value_t = 2, global = true)]
    retry_attempts: u32,

    /// Base backoff in seconds before the first retry
    #[arg(long, env = "AGENT_RETRY_BACKOFF", default_value_t = 1, global = true)]
    retry_backoff: u64,

    /// Maximum backoff in seconds between retries
    #[arg(long, env = "AGENT_RETRY_MAX_BACKOFF", default_value_t = 10, global = true)]
    retry_max_backoff: u64,

    /// Capacity of the per-request event channel
    #[arg(long, env = "RELAY_EVENT_BUFFER", default_value_t = 16, global = true)]
    event_buffer: usize,

    /// Chain definition YAML (defaults to the built-in research chain)
    #[arg(long, env = "RELAY_CHAIN_FILE", global = true)]
    chain: Option<String>,

    /// Model of the built-in research agent
    #[arg(long, env = "MODEL_1", default_value = "openai/gpt-4o", global = true)]
    model_1: String,

    /// Model of the built-in analysis agent
    #[arg(long, env = "MODEL_2", default_value = "gemini-2.0", global = true)]
    model_2: String,

    /// Model of the built-in summary agent
    #[arg(long, env = "MODEL_3", default_value = "gemini-2.0-flash", global = true)]
    model_3: String,

    /// Use the offline echo adapter for every agent
    #[arg(long, env = "RELAY_OFFLINE", global = true)]
    offline: bool,
}

impl SettingsArgs {
    fn into_settings(self, host: String, port: u16) -> RelaySettings {
        RelaySettings {
            app_name: self.app_name,
            host,
            port,
            log_level: self.log_level,
            agent_timeout: Duration::from_secs(self.agent_timeout),
            retry_attempts: self.retry_attempts,
            retry_backoff: Duration::from_secs(self.retry_backoff),
            retry_max_backoff: Duration::from_secs(self.retry_max_backoff),
            event_buffer: self.event_buffer,
            chain_file: self.chain,
            models: [self.model_1, self.model_2, self.model_3],
            offline: self.offline,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Relay HTTP server
    Server {
        /// Host to bind to
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 8000)]
        port: u16,
    },

    /// Run the chain once on a query and print the event stream
    Run {
        /// The query fed to the first agent
        query: String,
    },

    /// List the agents of the configured chain
    Agents,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Server { host, port } => {
            commands::server::run(cli.settings.into_settings(host, port)).await
        }
        Commands::Run { query } => {
            let settings = cli.settings.into_settings("127.0.0.1".to_string(), 0);
            commands::run::run(settings, query).await
        }
        Commands::Agents => {
            let settings = cli.settings.into_settings("127.0.0.1".to_string(), 0);
            commands::agents::run(settings)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

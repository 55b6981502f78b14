//! A2A demo agents - Main Entry Point

use a2a_agents::a2a::client::A2aClient;
use a2a_agents::a2a::executor::MessageSendConfiguration;
use a2a_agents::config::AppConfig;
use a2a_agents::launcher::{build_provider, launch, serve_agent, AgentName};
use a2a_agents::observability::init_default_logging;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

const DEFAULT_SEND_URL: &str = "http://localhost:9999";
const DEFAULT_SEND_MESSAGE: &str = "Analyze the current state of the NVDA stock";

/// A2A demo agent servers
#[derive(Parser)]
#[command(name = "a2a-agents")]
#[command(about = "A2A JSON-RPC demo agents: orchestrator, task breakdowns and LLM specialists")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single agent server
    Serve {
        #[arg(value_enum)]
        agent: AgentName,
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the trending, analyzer and host agents together
    Launch {
        /// Also start the orchestrator
        #[arg(long)]
        with_orchestrator: bool,
    },
    /// Send a message/send request to an agent and print the response
    Send {
        #[arg(long, default_value = DEFAULT_SEND_URL)]
        url: String,
        #[arg(default_value = DEFAULT_SEND_MESSAGE)]
        message: String,
        /// Ask the agent not to block until the task finishes
        #[arg(long)]
        non_blocking: bool,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { agent, port } => run_single(config, agent, port).await,
        Commands::Launch { with_orchestrator } => run_launch(config, with_orchestrator).await,
        Commands::Send {
            url,
            message,
            non_blocking,
        } => send_message(&config, &url, &message, non_blocking).await,
        Commands::Config {
            action: ConfigAction::Show,
        } => show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

/// Flip the watch channel on Ctrl-C or SIGTERM
fn spawn_signal_handler() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = tx.send(true);
    });

    rx
}

#[cfg(unix)]
async fn wait_for_signal() {
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!("Cannot listen for SIGTERM: {}", e);
            let _ = signal::ctrl_c().await;
            info!("Received Ctrl-C, shutting down gracefully...");
            return;
        }
    };

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = signal::ctrl_c().await;
    info!("Received Ctrl-C, shutting down gracefully...");
}

async fn run_single(config: AppConfig, agent: AgentName, port: Option<u16>) -> CliResult {
    let port = port.unwrap_or_else(|| agent.port(&config.ports));
    let provider = build_provider(&config)?;
    if agent.requires_llm() && provider.is_none() {
        return Err(format!(
            "{agent} agent needs an LLM API key in ${}",
            config.llm.api_key_env
        )
        .into());
    }

    let shutdown = spawn_signal_handler();
    serve_agent(&config, agent, port, provider, shutdown).await?;
    info!("Application shutdown complete");
    Ok(())
}

async fn run_launch(config: AppConfig, with_orchestrator: bool) -> CliResult {
    let mut agents = Vec::new();
    if with_orchestrator {
        agents.push(AgentName::Orchestrator);
    }
    agents.extend(AgentName::SPECIALISTS);

    info!(agents = ?agents, "Launching agents");
    let shutdown = spawn_signal_handler();
    let started = launch(&config, &agents, shutdown).await?;
    info!(agents = started.len(), "Application shutdown complete");
    Ok(())
}

async fn send_message(config: &AppConfig, url: &str, message: &str, non_blocking: bool) -> CliResult {
    let client = A2aClient::from_config(&config.client)?;

    let card = client.fetch_agent_card(url).await?;
    info!(agent = %card.name, url = %url, "Sending message");

    let configuration = non_blocking.then(|| MessageSendConfiguration {
        blocking: Some(false),
        ..Default::default()
    });
    let response = client.send_message(url, message, configuration).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn show_config(config: &AppConfig) -> CliResult {
    println!("Current configuration:");
    println!("{}", config.to_toml_string()?);
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use std::net::IpAddr;
use tracing::{error, info};

use qupal::admin_client::AdminClient;
use qupal::chat::ChatSession;
use qupal::constants;
use qupal::llm_interaction::{LlmClient, LlmConfig};
use qupal::web_server::{self, ServerConfig};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the QUPAL web server.
    Start {
        #[arg(long, default_value_t = 9900, env = "QUPAL_PORT", help = "Port for the web server.")]
        port: u16,
        #[arg(long, default_value = "127.0.0.1", env = "QUPAL_HOST", help = "Address to bind.")]
        host: IpAddr,
        #[arg(
            long,
            env = "QUPAL_FORCE_LOCAL",
            help = "Answer from local rules only, never call the model API."
        )]
        local: bool,
    },
    /// Chat with QUPAL in the terminal.
    Chat {
        #[arg(long, help = "Answer from local rules only, never call the model API.")]
        local: bool,
    },
    /// Manage the API key of a running server.
    Key {
        #[arg(
            long,
            default_value = "http://127.0.0.1:9900",
            env = "QUPAL_SERVER",
            help = "Base URL of the running server."
        )]
        server: String,
        #[arg(
            long,
            env = "QUPAL_ADMIN_TOKEN",
            hide_env_values = true,
            help = "Admin token configured on the server."
        )]
        admin_token: String,
        #[command(subcommand)]
        action: KeyCommands,
    },
}

// Define subcommands for the 'key' command
#[derive(clap::Subcommand, Debug)]
enum KeyCommands {
    /// Replace the API key used for model calls.
    Set {
        #[arg(value_parser = clap::value_parser!(String))]
        value: String,
    },
    /// Remove the API key; the server falls back to local rules.
    Clear,
    /// Show whether a key is set and which model is used.
    Status,
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,qupal=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { port, host, local } => {
            info!("Starting QUPAL on {}:{}...", host, port);
            let config = ServerConfig::from_env(host, port, local);

            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(config).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            let ctrl_c = tokio::signal::ctrl_c();
            // Pin the ctrl_c future to the stack so its address is stable
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat { local } => {
            let llm = LlmClient::new(LlmConfig::from_env())
                .context("Failed to build HTTP client for model API")?;
            let api_key = constants::OPENAI_API_KEY.clone();
            let has_api_key = api_key.is_some();
            let model = llm.with_key(api_key);

            let stdin = std::io::stdin();
            ChatSession::new(&model, local, has_api_key)
                .run(stdin.lock(), std::io::stdout())
                .await
                .context("Chat session failed")?;
        }
        Commands::Key {
            server,
            admin_token,
            action,
        } => {
            let client = AdminClient::new(&server, &admin_token);
            match action {
                KeyCommands::Set { value } => {
                    client.set_key(&value).await?;
                    println!("API key updated on {}", server);
                }
                KeyCommands::Clear => {
                    client.clear_key().await?;
                    println!("API key cleared on {}", server);
                }
                KeyCommands::Status => {
                    let status = client.status().await?;
                    println!("{}", serde_json::to_string_pretty(&status)?);
                }
            }
        }
    }

    Ok(())
}

mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use runtime::tools::definitions::flight_info_tool;
use runtime::{ChatRequest, ChatService, GeminiClient, IncomingMessage, ToolRegistry};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "purser.toml";

#[derive(Parser)]
#[command(name = "purser")]
#[command(about = "A tool-calling generation service", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt through the generation loop
    Ask {
        /// The user prompt.
        prompt: String,
        /// Optional system prompt.
        #[arg(short, long)]
        system: Option<String>,
    },
    /// List the registered tools
    Tools,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("purser=info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Ask { prompt, system } => cmd_ask(&config, &prompt, system.as_deref()).await,
        Commands::Tools => cmd_tools(),
    }
}

async fn cmd_ask(config: &Config, prompt: &str, system: Option<&str>) -> Result<()> {
    let api_key = config.api_key()?;
    let client = GeminiClient::builder(api_key, &config.model.model).build()?;
    let registry = build_registry()?;
    let service =
        ChatService::new(Arc::new(registry), client).with_config(config.run_config());

    let response = service
        .handle(ChatRequest {
            request_id: None,
            messages: vec![IncomingMessage::new("user", prompt)],
            system_prompt: system.map(String::from),
        })
        .await?;

    if !response.tool_calls.is_empty() {
        eprintln!(
            "[{}] {} tool call(s) executed",
            response.request_id,
            response.tool_calls.len()
        );
    }
    println!("{}", response.text);
    Ok(())
}

fn cmd_tools() -> Result<()> {
    let registry = build_registry()?;
    for spec in registry.declarations() {
        println!("{:<20} {}", spec.name, spec.description);
    }
    Ok(())
}

/// Register every shipped tool. Runs once at startup; a duplicate name
/// is fatal here rather than surfacing mid-conversation.
fn build_registry() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(flight_info_tool())?;
    Ok(registry)
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if std::path::Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

//! Lua Code Bot - main entry point

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lua_code_bot::bot::{self, Launch};
use lua_code_bot::config::{self, EnvFile, MODEL_NAME};
use lua_code_bot::{metrics, Config, GeminiClient};

#[derive(Parser)]
#[command(name = "lua_code_bot")]
#[command(about = "Discord bot that writes Lua code with Google Gemini", long_about = None)]
#[command(version)]
struct Cli {
    /// Env file merged into the environment at startup, if it exists
    #[arg(long, default_value = config::ENV_FILE)]
    env_file: PathBuf,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load the env file before logging so RUST_LOG can come from it
    let env_file = config::load_env_file(&cli.env_file);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("lua_code_bot=info".parse()?),
        )
        .init();

    match env_file {
        Ok(EnvFile::Loaded(path)) => info!(path = %path.display(), ".env file found and loaded"),
        Ok(EnvFile::Missing(path)) => {
            info!(path = %path.display(), ".env file not found, using process environment")
        }
        Err(err) => warn!(path = %cli.env_file.display(), "Failed to load env file: {}", err),
    }

    let config = Config::from_env().inspect_err(|err| {
        error!("FATAL ERROR: {}", err);
        error!("Action: check your .env file syntax and make sure the key is set.");
    })?;

    let gemini = GeminiClient::new(config.gemini_api_key(), MODEL_NAME).inspect_err(|err| {
        error!("FATAL ERROR: Could not initialize Gemini client. Error: {}", err);
    })?;

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    match bot::launch(&config, gemini).await {
        Ok(Launch::MissingToken) => {}
        Ok(Launch::Stopped) => info!("Discord client stopped"),
        Err(err) => error!("FATAL RUNTIME ERROR: The bot failed to start! Reason: {}", err),
    }

    Ok(())
}

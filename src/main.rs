use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use turngate::config::{Config, SessionConfig};
use turngate::session::SessionManager;
use turngate::transport::TransportServer;

/// Real-time end-of-turn detection for speech streams.
#[derive(Parser, Debug)]
#[command(name = "turngate", version, about)]
struct Cli {
    /// Path to config file (default: ~/.config/turngate/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Unix socket path to listen on
    #[arg(short, long)]
    socket: Option<PathBuf>,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.quiet, cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let session_config = SessionConfig::from_config(&config)?;

    if config.asr.enabled {
        warn!("asr.enabled is set but no transcription backend is built in; eot messages will carry a null transcript");
    }

    let socket_path = cli.socket.unwrap_or_else(TransportServer::default_socket_path);
    let server = TransportServer::new(socket_path);
    info!(
        version = %turngate::version_string(),
        sample_rate = session_config.sample_rate,
        eot_threshold = session_config.eot_frame_threshold(),
        "starting turngate"
    );

    let manager = SessionManager::new(session_config);
    server.start(manager).await?;

    Ok(())
}

/// Configure the tracing subscriber from CLI flags, with RUST_LOG taking
/// precedence when set.
fn init_logging(quiet: bool, verbose: u8) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("turngate={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/turngate/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        let default_path = Config::default_path();
        Config::load_or_default(&default_path)?
    };

    Ok(config.with_env_overrides())
}

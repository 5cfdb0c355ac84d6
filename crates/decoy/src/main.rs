use anyhow::Context;
use clap::Parser;
use decoy::config::Config;
use decoy::{MockServer, MockSession};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Programmable HTTP test double
#[derive(Parser, Debug)]
#[command(name = "decoy", version, about)]
struct Args {
    /// Stub configuration file (YAML or JSON)
    #[arg(short, long, env = "DECOY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen host from the config file
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port from the config file (0 = ephemeral)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Validate the configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str())),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(host) = args.host {
        config.listen.host = host;
    }
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    config.validate()?;

    if args.validate {
        println!("Configuration is valid ({} stubs defined)", config.stubs.len());
        return Ok(());
    }

    let session = MockSession::from_config(&config).context("failed to register stubs")?;
    let addr = config.listen.socket_addr()?;
    let mut server = MockServer::start(Arc::new(session), addr).await?;
    info!(
        "Serving {} stub rule(s) on {}",
        server.session().rules().len(),
        server.uri()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown signal received");
    server.stop().await?;
    Ok(())
}

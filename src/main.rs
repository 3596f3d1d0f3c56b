//! mockd - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use mockd::{Config, Dispatcher, Server};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Parser, Debug)]
#[command(
    name = "mockd",
    about = "Standalone HTTP mock server - static, weighted, and sequenced stub responses",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mockd.yaml")]
    config: PathBuf,

    /// Listen address (e.g., "0.0.0.0:8080"); overrides $ADDR and the config file
    #[arg(short, long, value_name = "ADDR")]
    addr: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Print default config if requested
    if args.print_config {
        let default_config = include_str!("../demos/default-config.yaml");
        println!("{}", default_config);
        return Ok(());
    }

    // Load configuration
    let config = if args.config.exists() {
        info!(path = ?args.config, "Loading configuration");
        Config::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Configuration file not found: {:?}", args.config);
    } else {
        info!("Using default configuration (no endpoints)");
        Config::default()
    };

    // Building the endpoints is the validation step: every strategy,
    // status, header, and body is checked here, before anything binds.
    let endpoints = config.build_endpoints()?;

    // Validate and exit if requested
    if args.validate {
        println!(
            "Configuration is valid ({} endpoints defined)",
            endpoints.len()
        );
        return Ok(());
    }

    info!(endpoints = endpoints.len(), "Configuration loaded");

    let addr = resolve_addr(args.addr, config.listen.as_deref())?;
    let dispatcher = Dispatcher::new(endpoints, config.settings)?;

    Server::bind(addr).serve(dispatcher).await?;

    Ok(())
}

/// Pick the listen address: the `--addr` flag wins, then the `ADDR`
/// environment variable, then the config file, then the default.
fn resolve_addr(cli: Option<SocketAddr>, config_listen: Option<&str>) -> Result<SocketAddr> {
    if let Some(addr) = cli {
        return Ok(addr);
    }

    let raw = match std::env::var("ADDR") {
        Ok(value) if !value.is_empty() => value,
        _ => config_listen.unwrap_or(DEFAULT_ADDR).to_string(),
    };

    match raw.parse() {
        Ok(addr) => Ok(addr),
        Err(_) => anyhow::bail!("invalid listen address: {raw}"),
    }
}

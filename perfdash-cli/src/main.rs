//! perfdash CLI - monitoring dashboard for web applications
//!
//! Entry point for the `perfdash` binary:
//! - `serve`: run the HTTP server (measurement ingestion, JSON API, and the
//!   HTML dashboard pages)
//! - `check-config`: load an INI config file and print the resolved
//!   settings, including the VCS-derived version when GIT is configured

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use perfdash_core::DashboardConfig;
use perfdash_server::{create_pool, run_server, ServerConfig};

mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "perfdash",
    author,
    version,
    about = "Monitoring dashboard: record per-request performance measurements and render aggregate charts"
)]
struct Cli {
    /// Verbose (debug) logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the dashboard HTTP server
    Serve(ServeArgs),
    /// Load a config file and print the resolved settings
    CheckConfig(CheckConfigArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Path to the INI config file; defaults apply when omitted
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Database URL, overriding the config file
    #[arg(long)]
    database: Option<String>,
}

#[derive(Parser, Debug)]
struct CheckConfigArgs {
    /// Path to the INI config file
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(cli.debug)?;

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::CheckConfig(args) => check_config(args),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(database) = args.database {
        config.database_url = database;
    }

    tracing::info!(version = %config.version, database = %config.database_url, "starting perfdash");

    let pool = create_pool(&config.database_url)
        .await
        .with_context(|| format!("connecting to {}", config.database_url))?;

    run_server(pool, config, ServerConfig { bind_addr: args.bind }).await?;
    Ok(())
}

fn check_config(args: CheckConfigArgs) -> Result<()> {
    let config = DashboardConfig::from_file(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    println!("version:   {}", config.version);
    println!("link:      {}", config.link);
    println!("database:  {}", config.database_url);
    println!(
        "group_by:  {}",
        config.group_by.as_deref().unwrap_or("(none)")
    );
    Ok(())
}

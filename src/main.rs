//! AI Hub HTTP server - main entry point.
//!
//! Loads `.env`, builds configuration from the environment (CLI flags win),
//! opens the store and serves the API until Ctrl-C.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use aihub_core::http::HttpServer;
use aihub_core::{Config, Hub};

#[derive(Debug, Parser)]
#[command(name = "aihub-server", version, about = "AI Hub API server")]
struct Args {
    /// Address to listen on, e.g. 0.0.0.0:5000.
    #[arg(long, env = "AIHUB_LISTEN_ADDR")]
    listen: Option<String>,

    /// SQLite database file.
    #[arg(long, env = "DATABASE_PATH")]
    database: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "AIHUB_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit JSON logs.
    #[arg(long)]
    json_logs: bool,
}

fn load_config(args: Args) -> aihub_core::Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    if let Some(database) = args.database {
        config.store.database_path = database;
    }
    if let Some(level) = args.log_level {
        config.observability.log_level = level;
    }
    if args.json_logs {
        config.observability.json_logs = true;
    }
    Ok(config)
}

async fn run(config: Config) -> aihub_core::Result<()> {
    let hub = Arc::new(Hub::from_config(config)?);
    let server = HttpServer::from_hub(hub)?;

    let cancel = server.cancel_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
        cancel.cancel();
    });

    server.serve().await
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match load_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    aihub_core::observability::init_tracing(&config.observability);
    tracing::info!(
        environment = %config.server.environment,
        addr = %config.server.listen_addr,
        "AI Hub server starting"
    );

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

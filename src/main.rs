use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use request_dispatch::config::{load_config, AppConfig};
use request_dispatch::demo;
use request_dispatch::http::HttpServer;
use request_dispatch::lifecycle::{signals, Shutdown, StartupError};
use request_dispatch::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "request-dispatch")]
#[command(about = "Router, middleware chain and DI container over axum", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Print the route table
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path).map_err(StartupError::from)?,
        None => AppConfig::default(),
    };
    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "request-dispatch starting"
    );

    let app = demo::application(config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Routes => {
            for route in app.router().routes() {
                println!(
                    "{:<7} {:<24} {:<16} {}",
                    route.method().as_str(),
                    route.path(),
                    route.name().unwrap_or("-"),
                    route.action().describe()
                );
            }
        }
        Commands::Serve => {
            let config = app.config();
            tracing::info!(
                bind_address = %config.listener.bind_address,
                max_connections = config.listener.max_connections,
                request_timeout_secs = config.timeouts.request_secs,
                "Configuration loaded"
            );

            if config.observability.metrics_enabled {
                let addr = config
                    .observability
                    .metrics_address
                    .parse()
                    .map_err(|e: std::net::AddrParseError| StartupError::Metrics(e.to_string()))?;
                metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
            }

            let listener = TcpListener::bind(&config.listener.bind_address)
                .await
                .map_err(StartupError::Io)?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");

            let shutdown = Shutdown::new();
            let server_shutdown = shutdown.subscribe();
            signals::spawn_signal_listener(shutdown);

            HttpServer::new(&app).run(listener, server_shutdown).await?;
            tracing::info!("Shutdown complete");
        }
    }

    Ok(())
}

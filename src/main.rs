//! keyrelay HTTP server
//!
//! Loads configuration and provider secrets once, then serves the chat and
//! location proxies with Axum.

use clap::Parser;
use keyrelay::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    secrets::Secrets,
    telemetry,
};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // A missing config file is fine: every setting has a default
    let config_exists = Path::new(&cli.config).exists();
    let config = if config_exists {
        Config::from_file(&cli.config)?
    } else {
        Config::default()
    };

    telemetry::init(&config.observability.log_level);

    if config_exists {
        tracing::info!(path = %cli.config, "Loaded configuration");
    } else {
        tracing::info!(path = %cli.config, "Configuration file not found, using defaults");
    }

    let secrets = Secrets::from_env(&config);
    let config = Arc::new(config);
    let state = AppState::new(config.clone(), secrets)?;
    let app = handlers::router(state);

    let addr = config.bind_addr()?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("Chat proxy available at http://{}{}", addr, config.chat_route());
    tracing::info!(
        "Location proxy available at http://{}{}",
        addr,
        config.location_route()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

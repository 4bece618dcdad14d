//! Sentitick Server - streams sentiment-driven up-move probabilities
//!
//! Polls news and prices for every tracked symbol, keeps an online classifier
//! per symbol, and pushes ticks to WebSocket subscribers at
//! `ws://<bind>/ws/stream?symbol=<SYMBOL>`.
//!
//! # Usage
//! ```sh
//! MODE=mock cargo run --bin server -- --symbols AAPL,TSLA
//! ```
//!
//! Metrics are pushed as `METRICS_JSON:` lines on stdout every
//! `OBSERVABILITY_INTERVAL` seconds unless `OBSERVABILITY_ENABLED=false`.

use anyhow::{Context, Result};
use clap::Parser;
use sentitick::application::system::Application;
use sentitick::config::{Config, Mode};
use sentitick::infrastructure::observability::MetricsReporter;
use sentitick::infrastructure::websocket::TickStreamServer;
use std::str::FromStr;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(version, about = "Real-time news sentiment tick stream")]
struct Args {
    /// Run mode: live or mock (overrides MODE)
    #[arg(long)]
    mode: Option<String>,

    /// Comma separated symbols (overrides SYMBOLS)
    #[arg(long)]
    symbols: Option<String>,

    /// Listen address for the tick stream (overrides WS_BIND_ADDRESS)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Sentitick Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    info!(
        "Configuration loaded: Mode={:?}, Symbols={:?}, News={:?}, Price={:?}",
        config.mode,
        config.stream.symbols,
        config.stream.news_poll_interval,
        config.stream.price_poll_interval
    );

    let listener = TickStreamServer::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;

    let observability = config.observability.clone();
    let app = Application::build(config).await?;
    let handle = app.start().await?;

    let reporter_task = if observability.enabled {
        let reporter = MetricsReporter::new(
            handle.registry.clone(),
            handle.broadcaster.clone(),
            handle.predictor.clone(),
            handle.metrics.clone(),
            observability.interval,
        );
        let shutdown = handle.shutdown_signal();
        info!("Metrics reporter started (interval: {:?})", observability.interval);
        Some(tokio::spawn(reporter.run(shutdown)))
    } else {
        info!("Metrics reporting disabled.");
        None
    };

    let server = TickStreamServer::new(handle.registry.clone(), handle.broadcaster.clone());
    let shutdown = handle.shutdown_signal();
    let server_task = tokio::spawn(async move { server.serve(listener, shutdown).await });

    info!("Server running. Press Ctrl+C to shutdown.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received.");

    handle.shutdown().await?;
    server_task.await.context("Tick stream server task failed")?;
    if let Some(task) = reporter_task {
        task.await.context("Metrics reporter task failed")?;
    }
    info!("Shutdown complete.");

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(mode) = &args.mode {
        config.mode = Mode::from_str(mode)?;
    }
    if let Some(symbols) = &args.symbols {
        config.stream.symbols = sentitick::config::parse_symbols(symbols);
        config.stream.validate()?;
    }
    if let Some(bind) = &args.bind {
        config.server.bind_address = bind.clone();
    }

    Ok(config)
}

// src/main.rs - Trader OMS Entry Point
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::{env, sync::Arc};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal,
    sync::mpsc::UnboundedReceiver,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use trader_oms::{
    transport::rest, ChannelTransport, CorrelationOutcome, FixFactory, InboundMessage, OmsConfig,
    OmsError, OmsResult, OutboundMessage, SequentialClOrdIdGenerator, TradeClient,
};

// Configuration loading
fn load_config() -> OmsResult<OmsConfig> {
    let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    Config::builder()
        .add_source(File::with_name(&format!("{config_dir}/default")).required(false))
        .add_source(File::with_name(&format!("{config_dir}/local")).required(false))
        .add_source(Environment::with_prefix("OMS").separator("__"))
        .build()
        .and_then(Config::try_deserialize::<OmsConfig>)
        .map_err(|e| OmsError::Config(e.to_string()))
}

fn init_tracing(config: &OmsConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    if config.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

/// Stand-in for the FIX session engine's outbound queue
async fn log_outbound(mut rx: UnboundedReceiver<OutboundMessage>) {
    while let Some(out) = rx.recv().await {
        info!(session = %out.session, message = %out.message, "Outbound FIX message");
    }
    debug!("Outbound channel closed");
}

/// Read `tag=value` execution reports from stdin, one per line
async fn read_inbound(client: Arc<TradeClient>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Failed to read inbound messages");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let outcome = InboundMessage::parse(&line).and_then(|msg| {
            let session = msg.local_session()?;
            client.deliver(&msg, &session)
        });
        match outcome {
            Ok(CorrelationOutcome::Applied { order, .. }) => {
                info!(order_id = order.id, closed = %order.closed, open = %order.open, "Order updated");
            }
            Ok(CorrelationOutcome::Unmatched { .. }) => {}
            Err(e) => warn!(error = %e, "Rejected inbound message"),
        }
    }
    debug!("Inbound stream closed");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install color_eyre for better error messages
    color_eyre::install().map_err(|e| anyhow::anyhow!("Failed to install color_eyre: {e}"))?;

    let (config, load_error) = match load_config() {
        Ok(config) => (config, None),
        Err(e) => (OmsConfig::default(), Some(e)),
    };

    init_tracing(&config);
    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    info!("Starting {} v{}", trader_oms::NAME, trader_oms::VERSION);
    debug!("Configuration loaded: {:?}", config);

    let (transport, outbound) = ChannelTransport::new();
    let client = Arc::new(TradeClient::new(
        Arc::new(SequentialClOrdIdGenerator::new()),
        FixFactory::new(config.fix.price_precision, config.fix.quantity_precision),
        Arc::new(transport),
    ));

    for session in &config.fix.sessions {
        client.on_session_created(session.session_id());
    }
    if config.fix.sessions.is_empty() {
        warn!("No FIX sessions configured; every order submission will be rejected");
    }

    tokio::spawn(log_outbound(outbound));
    tokio::spawn(read_inbound(client.clone()));

    // Graceful shutdown
    let shutdown_signal = async {
        let _ = signal::ctrl_c().await;
        info!("Shutdown signal received, shutting down gracefully...");
    };

    rest::start_server(&config.server, client, shutdown_signal)
        .await
        .context("REST API server failed")?;

    info!("Server shutdown complete");
    Ok(())
}

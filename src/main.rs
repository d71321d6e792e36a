use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chatbridge::cards::CardTemplates;
use chatbridge::config::Config;
use chatbridge::dispatch::Dispatcher;
use chatbridge::export::SheetsExporter;
use chatbridge::gateway::MessagingGateway;
use chatbridge::ocr::OcrClient;
use chatbridge::platform::RestClient;
use chatbridge::server::{AppState, build_app};
use chatbridge::store::MessageStore;

#[derive(Parser)]
#[command(name = "chatbridge", about = "Messaging-platform webhook bridge")]
struct Args {
    /// Path to the YAML config file.
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)
        .await
        .with_context(|| format!("failed to load config from {}", args.config))?;

    let store = MessageStore::new();
    let platform = Arc::new(RestClient::new(
        config.platform.base_url.clone(),
        config.platform.channel_access_token.clone(),
    ));
    let gateway = MessagingGateway::new(platform);
    let cards = CardTemplates::new(config.cards.edit_url.clone(), config.cards.list_url.clone());
    let ocr = config.ocr.endpoint.clone().map(OcrClient::new);
    let exporter = SheetsExporter::new(&config.export);

    let ocr_configured = ocr.is_some();
    let export_configured = exporter.is_configured();
    info!(ocr_configured, export_configured, "services wired");

    let dispatcher = Dispatcher::new(
        store.clone(),
        gateway.clone(),
        cards.clone(),
        ocr,
        exporter,
    );

    let state = AppState {
        store,
        gateway,
        cards,
        dispatcher,
        channel_secret: config.platform.channel_secret.clone(),
        ocr_configured,
        export_configured,
    };

    let app = build_app(state, config.server.request_timeout_seconds);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}

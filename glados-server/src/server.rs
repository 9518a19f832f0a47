// glados-server/src/server.rs

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use glados_core::config::ClientConfig;
use glados_core::memory::SqliteMemory;
use glados_core::platforms::slack::{SlackPoster, SlackRtmTransport};
use glados_core::plugins::PluginCatalog;
use glados_core::trigger_server::start_trigger_server;
use glados_core::{Error, GladosClient};

/// Connects to Slack and serves until Ctrl-C or until Slack closes the socket.
pub async fn run_bot(config: ClientConfig) -> Result<(), Error> {
    let memory = Arc::new(SqliteMemory::open(&config.database_url).await?);
    let poster = Arc::new(
        SlackPoster::new(config.token.clone())?.with_response_trace(config.debug_mode()),
    );
    let transport = SlackRtmTransport::new(config.token.clone())?;
    let catalog = PluginCatalog::with_builtins();

    let mut client =
        GladosClient::connect(transport, poster, memory.clone(), &catalog, &config).await?;

    // A busy port only costs us the trigger endpoint, not the bot.
    let trigger = match config.trigger_port {
        Some(port) => match start_trigger_server(port, client.async_gateway()).await {
            Ok(server) => Some(server),
            Err(e) => {
                error!("Async trigger server unavailable: {}", e);
                None
            }
        },
        None => None,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ctrlc_handle = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
            return;
        }
        info!("Ctrl-C detected; closing connection...");
        let _ = shutdown_tx.send(true);
    });

    let processed = client.run(shutdown_rx).await;
    info!("Event loop finished after {} event(s).", processed);

    if let Some(server) = trigger {
        server.shutdown().await;
    }
    let result = client.shutdown().await;
    ctrlc_handle.abort();
    memory.database().close().await;
    result
}

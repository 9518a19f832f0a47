//! src/client.rs
//!
//! One connection's lifecycle: handshake, session, plugins, the inbound
//! loop, and the ordered close (teardown, flush, disconnect).

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info};

use glados_common::models::InboundEvent;
use glados_common::traits::{ChatTransport, MemoryStore, MessagePoster};

use crate::config::ClientConfig;
use crate::dispatch::{AsyncDispatchGateway, DispatchOutcome, InboundDispatcher};
use crate::outbound::OutboundGateway;
use crate::plugins::{PluginCatalog, PluginRegistry};
use crate::session::SessionContext;
use crate::Error;

pub struct GladosClient<T: ChatTransport> {
    transport: T,
    session: Arc<SessionContext>,
    dispatcher: InboundDispatcher,
    registry: PluginRegistry,
    memory: Arc<dyn MemoryStore>,
    outbound: Arc<OutboundGateway>,
    closed: bool,
}

impl<T: ChatTransport> GladosClient<T> {
    /// Connects `transport`, builds the session from the handshake, then
    /// loads, constructs and sets up every plugin in the manifest.
    /// Plugin failures are logged and skipped; transport failures are not.
    pub async fn connect(
        mut transport: T,
        poster: Arc<dyn MessagePoster>,
        memory: Arc<dyn MemoryStore>,
        catalog: &PluginCatalog,
        config: &ClientConfig,
    ) -> Result<Self, Error> {
        let handshake = transport.connect().await?;
        let session = Arc::new(SessionContext::from_handshake(&handshake, &config.session));

        let outbound = Arc::new(OutboundGateway::new(
            poster,
            session.general_channel_id().map(str::to_string),
        ));

        let descriptors = PluginRegistry::load(&config.manifest_path, catalog);
        let registry = PluginRegistry::initialize(descriptors, memory.clone(), outbound.clone()).await;

        if session.debug_mode() {
            info!("Hello!");
        }

        Ok(Self {
            transport,
            dispatcher: InboundDispatcher::new(session.clone()),
            session,
            registry,
            memory,
            outbound,
            closed: false,
        })
    }

    /// Processes events one at a time until the stream ends or `shutdown`
    /// flips to true. Returns how many events were read. Does not close the
    /// client; call [`GladosClient::shutdown`] afterwards.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut processed = 0;
        let mut signal_open = true;

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested; leaving the event loop.");
                break;
            }

            tokio::select! {
                changed = shutdown.changed(), if signal_open => {
                    if changed.is_err() {
                        // Nobody can signal any more; run until the stream ends.
                        signal_open = false;
                    }
                }
                maybe_event = self.transport.next_event() => {
                    match maybe_event {
                        Some(event) => {
                            processed += 1;
                            self.handle_event(&event).await;
                        }
                        None => {
                            info!("Event stream closed.");
                            break;
                        }
                    }
                }
            }
        }
        processed
    }

    /// Filters and routes one event through the sync plugins.
    pub async fn handle_event(&mut self, event: &InboundEvent) -> DispatchOutcome {
        let outcome = self
            .dispatcher
            .dispatch(event, self.registry.sync_plugins_mut())
            .await;
        debug!("Dispatch outcome: {:?}", outcome);
        outcome
    }

    pub async fn handle_async(&self, plugin_name: &str, payload: Value) -> Result<(), Error> {
        self.registry.async_gateway().dispatch_async(plugin_name, payload).await
    }

    pub fn async_gateway(&self) -> AsyncDispatchGateway {
        self.registry.async_gateway()
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn outbound(&self) -> Arc<OutboundGateway> {
        self.outbound.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Tears down every plugin, then flushes memory, then disconnects.
    /// Runs once; later calls return `Ok(())` without doing anything.
    /// Every step runs even if an earlier one fails; the first error wins.
    pub async fn shutdown(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.registry.teardown_all().await;

        let flushed = self.memory.flush().await;
        if let Err(e) = &flushed {
            error!("Failed to flush memory: {}", e);
        }

        let disconnected = self.transport.disconnect().await;
        if let Err(e) = &disconnected {
            error!("Failed to disconnect: {}", e);
        }

        if self.session.debug_mode() {
            info!("You monster");
        }
        flushed.and(disconnected)
    }
}

//! plugins/registry.rs
//!
//! Owns every live plugin for one connection. Sync plugins live in a plain
//! `Vec` driven by the inbound loop; async plugins live in a table behind a
//! mutex so the out-of-band gateway can reach them from other tasks.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};

use glados_common::traits::MemoryStore;

use crate::dispatch::async_gateway::AsyncDispatchGateway;
use crate::outbound::{ChannelPoster, GeneralBroadcaster, OutboundGateway};
use crate::plugins::catalog::PluginCatalog;
use crate::plugins::guard::{guarded, guarded_sync};
use crate::plugins::manifest::load_manifest;
use crate::plugins::types::{
    AsyncPluginContext, LoadedAsyncPlugin, LoadedMessagePlugin, MessagePluginContext,
    PluginConstructor, PluginDescriptor,
};
use crate::Error;

/// Name-addressed async plugins, kept in construction order.
#[derive(Default)]
pub struct AsyncPluginTable {
    entries: Vec<LoadedAsyncPlugin>,
}

impl AsyncPluginTable {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LoadedAsyncPlugin> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: LoadedAsyncPlugin) {
        self.entries.push(entry);
    }

    fn take_all(&mut self) -> Vec<LoadedAsyncPlugin> {
        std::mem::take(&mut self.entries)
    }
}

pub struct PluginRegistry {
    sync_plugins: Vec<LoadedMessagePlugin>,
    async_plugins: Arc<AsyncMutex<AsyncPluginTable>>,
}

impl PluginRegistry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self {
            sync_plugins: Vec::new(),
            async_plugins: Arc::new(AsyncMutex::new(AsyncPluginTable::default())),
        }
    }

    /// Reads the manifest at `path` and resolves it against `catalog`.
    pub fn load(path: &Path, catalog: &PluginCatalog) -> Vec<PluginDescriptor> {
        let entries = load_manifest(path);
        let descriptors = catalog.resolve_all(&entries);
        info!(
            "{} of {} manifest entries resolved",
            descriptors.len(),
            entries.len()
        );
        descriptors
    }

    /// Constructs every descriptor, then runs `setup` on the survivors:
    /// sync plugins in order first, then async plugins in order.
    pub async fn initialize(
        descriptors: Vec<PluginDescriptor>,
        memory: Arc<dyn MemoryStore>,
        outbound: Arc<OutboundGateway>,
    ) -> Self {
        let mut constructed_sync = Vec::new();
        let mut constructed_async: Vec<LoadedAsyncPlugin> = Vec::new();

        for descriptor in descriptors {
            let name = descriptor.name.clone();
            let built = match &descriptor.constructor {
                PluginConstructor::Message(build) => {
                    let ctx = MessagePluginContext {
                        name: name.clone(),
                        memory: memory.clone(),
                        poster: ChannelPoster::new(outbound.clone()),
                    };
                    guarded_sync(&name, || build(ctx))
                        .and_then(|r| r)
                        .map_err(|e| Error::construction(&name, e))
                        .map(|plugin| constructed_sync.push(LoadedMessagePlugin { name: name.clone(), plugin }))
                }
                PluginConstructor::Async(build) => {
                    if constructed_async.iter().any(|p| p.name == name) {
                        Err(Error::construction(&name, "an async plugin with this name is already registered"))
                    } else {
                        let ctx = AsyncPluginContext {
                            name: name.clone(),
                            memory: memory.clone(),
                            broadcaster: GeneralBroadcaster::new(outbound.clone()),
                        };
                        guarded_sync(&name, || build(ctx))
                            .and_then(|r| r)
                            .map_err(|e| Error::construction(&name, e))
                            .map(|plugin| constructed_async.push(LoadedAsyncPlugin { name: name.clone(), plugin }))
                    }
                }
            };
            if let Err(e) = built {
                error!("{}", e);
            }
        }

        let mut sync_plugins = Vec::with_capacity(constructed_sync.len());
        for mut entry in constructed_sync {
            match guarded(&entry.name, entry.plugin.setup()).await {
                Ok(()) => sync_plugins.push(entry),
                Err(e) => error!("Problem setting up plugin {}: {}", entry.name, e),
            }
        }

        let mut table = AsyncPluginTable::default();
        for mut entry in constructed_async {
            match guarded(&entry.name, entry.plugin.setup()).await {
                Ok(()) => table.push(entry),
                Err(e) => error!("Problem setting up plugin {}: {}", entry.name, e),
            }
        }

        info!(
            "Plugins ready: sync={:?} async={:?}",
            sync_plugins.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            table.names()
        );

        Self {
            sync_plugins,
            async_plugins: Arc::new(AsyncMutex::new(table)),
        }
    }

    /// Sync plugins in dispatch order.
    pub fn sync_plugins_mut(&mut self) -> &mut [LoadedMessagePlugin] {
        &mut self.sync_plugins
    }

    pub fn sync_plugin_names(&self) -> Vec<String> {
        self.sync_plugins.iter().map(|p| p.name.clone()).collect()
    }

    pub async fn async_plugin_names(&self) -> Vec<String> {
        self.async_plugins.lock().await.names()
    }

    /// A handle for out-of-band dispatch; cheap to clone and send elsewhere.
    pub fn async_gateway(&self) -> AsyncDispatchGateway {
        AsyncDispatchGateway::new(self.async_plugins.clone())
    }

    /// Tears down every live plugin once. The registry is empty afterwards,
    /// so calling this again does nothing.
    pub async fn teardown_all(&mut self) -> usize {
        let mut torn_down = 0;

        for mut entry in std::mem::take(&mut self.sync_plugins) {
            if let Err(e) = guarded(&entry.name, entry.plugin.teardown()).await {
                warn!("Problem tearing down plugin {}: {}", entry.name, e);
            }
            torn_down += 1;
        }

        let async_entries = self.async_plugins.lock().await.take_all();
        for mut entry in async_entries {
            if let Err(e) = guarded(&entry.name, entry.plugin.teardown()).await {
                warn!("Problem tearing down plugin {}: {}", entry.name, e);
            }
            torn_down += 1;
        }

        if torn_down > 0 {
            info!("Tore down {} plugin(s)", torn_down);
        }
        torn_down
    }
}

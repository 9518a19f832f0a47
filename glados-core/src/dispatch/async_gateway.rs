//! dispatch/async_gateway.rs
//!
//! Out-of-band path: deliver a payload to exactly one async plugin, by name.
//! No sender or channel filtering happens here.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error};

use crate::plugins::guard::guarded;
use crate::plugins::registry::AsyncPluginTable;
use crate::Error;

#[derive(Clone)]
pub struct AsyncDispatchGateway {
    plugins: Arc<AsyncMutex<AsyncPluginTable>>,
}

impl AsyncDispatchGateway {
    pub(crate) fn new(plugins: Arc<AsyncMutex<AsyncPluginTable>>) -> Self {
        Self { plugins }
    }

    /// The table lock is held for the whole call, so two dispatches never
    /// run concurrently.
    pub async fn dispatch_async(&self, plugin_name: &str, payload: Value) -> Result<(), Error> {
        let mut table = self.plugins.lock().await;
        let entry = table
            .get_mut(plugin_name)
            .ok_or_else(|| Error::UnknownAsyncTarget(plugin_name.to_string()))?;

        debug!("(ASYNC) => {}", entry.name);
        guarded(&entry.name, entry.plugin.handle(payload))
            .await
            .map_err(|e| {
                error!("Async plugin {} failed: {}", plugin_name, e);
                match e {
                    Error::PluginRuntime { .. } => e,
                    other => Error::runtime(plugin_name, other),
                }
            })
    }

    pub async fn has_plugin(&self, plugin_name: &str) -> bool {
        self.plugins.lock().await.contains(plugin_name)
    }

    pub async fn plugin_names(&self) -> Vec<String> {
        self.plugins.lock().await.names()
    }
}

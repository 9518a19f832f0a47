use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use glados_common::traits::{AsyncPlugin, MemoryStore, PluginLifecycle};

use crate::outbound::GeneralBroadcaster;
use crate::plugins::types::AsyncPluginContext;
use crate::Error;

/// Relays externally triggered announcements (`{"text": "..."}`) to the
/// general channel and keeps the last one in memory.
pub struct Announcer {
    name: String,
    memory: Arc<dyn MemoryStore>,
    broadcaster: GeneralBroadcaster,
    sent: u64,
}

impl Announcer {
    pub fn new(ctx: AsyncPluginContext) -> Self {
        Self {
            name: ctx.name,
            memory: ctx.memory,
            broadcaster: ctx.broadcaster,
            sent: 0,
        }
    }
}

#[async_trait]
impl PluginLifecycle for Announcer {
    async fn teardown(&mut self) -> Result<(), Error> {
        info!("Announcer sent {} announcement(s) this session", self.sent);
        Ok(())
    }
}

#[async_trait]
impl AsyncPlugin for Announcer {
    async fn handle(&mut self, payload: Value) -> Result<(), Error> {
        let text = payload
            .get("text")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Parse("announcement payload needs a non-empty \"text\"".into()))?;

        self.broadcaster.post_general(text).await?;
        self.sent += 1;
        self.memory
            .put(&self.name, "last", json!({ "text": text }))
            .await
    }
}

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use glados_common::models::InboundEvent;
use glados_common::traits::{MemoryStore, MessagePlugin, PluginLifecycle};

use crate::outbound::ChannelPoster;
use crate::plugins::types::MessagePluginContext;
use crate::Error;

const COMMAND: &str = "!seen";

/// Remembers when each user last spoke. Passive for ordinary messages (never
/// claims them); answers and claims `!seen <@USER>` queries.
pub struct LastSeen {
    name: String,
    memory: Arc<dyn MemoryStore>,
    poster: ChannelPoster,
    consumed: bool,
}

impl LastSeen {
    pub fn new(ctx: MessagePluginContext) -> Self {
        Self {
            name: ctx.name,
            memory: ctx.memory,
            poster: ctx.poster,
            consumed: false,
        }
    }

    /// `"!seen <@U123>"` -> `Some("U123")`
    fn query_target(text: &str) -> Option<&str> {
        let rest = text.trim().strip_prefix(COMMAND)?.trim();
        let id = rest.strip_prefix("<@")?.strip_suffix('>')?;
        // Mentions may carry a display name: <@U123|chell>
        Some(id.split('|').next().unwrap_or(id))
    }
}

#[async_trait]
impl PluginLifecycle for LastSeen {}

#[async_trait]
impl MessagePlugin for LastSeen {
    fn can_handle(&self, event: &InboundEvent) -> bool {
        event.event_type() == Some("message") && event.sender_id.is_some()
    }

    async fn handle(&mut self, event: &InboundEvent) -> Result<(), Error> {
        self.consumed = false;

        if let (Some(target), Some(channel)) = (
            event.text().and_then(Self::query_target),
            event.channel_id.as_deref(),
        ) {
            let reply = match self.memory.get(&self.name, target).await? {
                Some(record) => format!(
                    "<@{}> was last seen at {}.",
                    target,
                    record["at"].as_str().unwrap_or("an unknown time")
                ),
                None => format!("I have no record of <@{target}>."),
            };
            self.poster.post(&reply, channel, None).await?;
            self.consumed = true;
        }

        if let Some(sender) = event.sender_id.as_deref() {
            self.memory
                .put(
                    &self.name,
                    sender,
                    json!({
                        "at": event.received_at.to_rfc3339(),
                        "channel": event.channel_id,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    fn consumes_message(&self) -> bool {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_target() {
        assert_eq!(LastSeen::query_target("!seen <@U123>"), Some("U123"));
        assert_eq!(LastSeen::query_target(" !seen   <@U123|chell> "), Some("U123"));
        assert_eq!(LastSeen::query_target("!seen chell"), None);
        assert_eq!(LastSeen::query_target("hello"), None);
    }
}

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use glados_common::models::InboundEvent;
use glados_common::traits::{MemoryStore, MessagePlugin, PluginLifecycle};

use crate::outbound::ChannelPoster;
use crate::plugins::types::MessagePluginContext;
use crate::Error;

const GREETINGS: &[&str] = &["hi", "hello", "hey", "hello glados"];

/// Answers a bare greeting in the channel it came from and claims the event.
pub struct Greeter {
    name: String,
    memory: Arc<dyn MemoryStore>,
    poster: ChannelPoster,
    consumed: bool,
}

impl Greeter {
    pub fn new(ctx: MessagePluginContext) -> Self {
        Self {
            name: ctx.name,
            memory: ctx.memory,
            poster: ctx.poster,
            consumed: false,
        }
    }

    fn is_greeting(text: &str) -> bool {
        let normalized = text
            .trim()
            .trim_end_matches(['!', '.', '?'])
            .to_lowercase();
        GREETINGS.contains(&normalized.as_str())
    }
}

#[async_trait]
impl PluginLifecycle for Greeter {}

#[async_trait]
impl MessagePlugin for Greeter {
    fn can_handle(&self, event: &InboundEvent) -> bool {
        matches!(event.event_type(), None | Some("message"))
            && event.text().is_some_and(Self::is_greeting)
    }

    async fn handle(&mut self, event: &InboundEvent) -> Result<(), Error> {
        self.consumed = false;
        let Some(channel) = event.channel_id.as_deref() else {
            debug!("Greeting without a channel; nowhere to answer");
            return Ok(());
        };

        let reply = match event.sender_id.as_deref() {
            Some(sender) => {
                let seen = self
                    .memory
                    .get(&self.name, sender)
                    .await?
                    .and_then(|v| v["greetings"].as_u64())
                    .unwrap_or(0);
                self.memory
                    .put(&self.name, sender, json!({ "greetings": seen + 1 }))
                    .await?;
                if seen == 0 {
                    format!("Hello, <@{sender}>.")
                } else {
                    format!("Oh. It's you, <@{sender}>.")
                }
            }
            None => "Hello.".to_string(),
        };

        self.poster.post(&reply, channel, None).await?;
        self.consumed = true;
        Ok(())
    }

    fn consumes_message(&self) -> bool {
        self.consumed
    }
}

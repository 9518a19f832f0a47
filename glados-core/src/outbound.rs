//! src/outbound.rs
//!
//! The only write path plugins get. Sync plugins hold a [`ChannelPoster`]
//! (any channel, optional attachments); async plugins hold a
//! [`GeneralBroadcaster`] (general channel only).

use std::sync::Arc;

use glados_common::models::{Attachment, OutboundMessage};
use glados_common::traits::MessagePoster;
use tracing::debug;

use crate::Error;

pub struct OutboundGateway {
    poster: Arc<dyn MessagePoster>,
    general_channel_id: Option<String>,
}

impl OutboundGateway {
    pub fn new(poster: Arc<dyn MessagePoster>, general_channel_id: Option<String>) -> Self {
        Self {
            poster,
            general_channel_id,
        }
    }

    pub async fn post(
        &self,
        message: &str,
        channel: &str,
        attachments: Option<Vec<Attachment>>,
    ) -> Result<(), Error> {
        let mut outbound = OutboundMessage::new(channel, message);
        outbound.attachments = attachments;
        debug!("(OUTBOUND) #{} => '{}'", channel, message);
        self.poster.post_message(&outbound).await
    }

    pub async fn post_general(&self, message: &str) -> Result<(), Error> {
        match self.general_channel_id.as_deref() {
            Some(channel) => self.post(message, channel, None).await,
            None => Err(Error::ChannelUnavailable("general".to_string())),
        }
    }

    pub fn general_channel_id(&self) -> Option<&str> {
        self.general_channel_id.as_deref()
    }
}

/// Full post capability handed to sync plugins.
#[derive(Clone)]
pub struct ChannelPoster {
    gateway: Arc<OutboundGateway>,
}

impl ChannelPoster {
    pub fn new(gateway: Arc<OutboundGateway>) -> Self {
        Self { gateway }
    }

    pub async fn post(
        &self,
        message: &str,
        channel: &str,
        attachments: Option<Vec<Attachment>>,
    ) -> Result<(), Error> {
        self.gateway.post(message, channel, attachments).await
    }
}

/// General-channel-only capability handed to async plugins.
#[derive(Clone)]
pub struct GeneralBroadcaster {
    gateway: Arc<OutboundGateway>,
}

impl GeneralBroadcaster {
    pub fn new(gateway: Arc<OutboundGateway>) -> Self {
        Self { gateway }
    }

    pub async fn post_general(&self, message: &str) -> Result<(), Error> {
        self.gateway.post_general(message).await
    }
}

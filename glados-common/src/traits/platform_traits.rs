use async_trait::async_trait;

use crate::error::Error;
use crate::models::{ConnectionStatus, InboundEvent, OutboundMessage, RtmHandshake};

/// The inbound half of a chat platform connection.
#[async_trait]
pub trait ChatTransport: Send {
    /// Performs the handshake and opens the realtime stream.
    async fn connect(&mut self) -> Result<RtmHandshake, Error>;

    /// Waits for the next decoded event. `None` once the stream is closed.
    async fn next_event(&mut self) -> Option<InboundEvent>;

    async fn disconnect(&mut self) -> Result<(), Error>;

    fn connection_status(&self) -> ConnectionStatus;
}

/// The outbound half: posting one message to one channel.
#[async_trait]
pub trait MessagePoster: Send + Sync {
    async fn post_message(&self, message: &OutboundMessage) -> Result<(), Error>;
}

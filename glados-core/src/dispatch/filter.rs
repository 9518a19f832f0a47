//! Side-effect-free admission rules for inbound events.

use glados_common::models::InboundEvent;

use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    /// Hand the event to the plugin walk.
    Route,
    /// Sent by us or by another bot; answering would loop.
    DropSelfPeer,
    /// Debug mode only listens in the debug channel.
    DropOutsideDebugChannel,
    /// Production ignores the debug channel.
    DropDebugChannel,
    /// Reply/ack frame with nothing to route.
    DropAcknowledgement,
}

impl FilterVerdict {
    pub fn is_route(&self) -> bool {
        matches!(self, FilterVerdict::Route)
    }
}

/// Rules apply in order and the first match wins. An absent channel id on
/// either side never matches.
pub fn filter_event(event: &InboundEvent, session: &SessionContext) -> FilterVerdict {
    if let Some(sender) = event.sender_id.as_deref() {
        if session.is_self_peer(sender) {
            return FilterVerdict::DropSelfPeer;
        }
    }

    if let Some(channel) = event.channel_id.as_deref() {
        let in_debug_channel = session.debug_channel_id() == Some(channel);
        if session.debug_mode() && !in_debug_channel {
            return FilterVerdict::DropOutsideDebugChannel;
        }
        if !session.debug_mode() && in_debug_channel {
            return FilterVerdict::DropDebugChannel;
        }
    }

    if event.is_acknowledgement {
        return FilterVerdict::DropAcknowledgement;
    }

    FilterVerdict::Route
}

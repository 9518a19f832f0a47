//! src/session.rs
//!
//! Per-connection identity: which peers are automated, and which channels
//! are the debug and general channels.

use std::collections::HashSet;

use glados_common::models::RtmHandshake;
use tracing::{info, warn};

use crate::config::SessionSettings;

/// Built once per connection and never shared across connections.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    self_peer_ids: HashSet<String>,
    debug_channel_id: Option<String>,
    general_channel_id: Option<String>,
    debug_mode: bool,
}

impl SessionContext {
    /// In debug mode the general channel is forced to the debug channel,
    /// even when the debug channel is absent.
    pub fn new(
        self_peer_ids: HashSet<String>,
        debug_channel_id: Option<String>,
        general_channel_id: Option<String>,
        debug_mode: bool,
    ) -> Self {
        let general_channel_id = if debug_mode {
            debug_channel_id.clone()
        } else {
            general_channel_id
        };
        Self {
            self_peer_ids,
            debug_channel_id,
            general_channel_id,
            debug_mode,
        }
    }

    pub fn from_handshake(handshake: &RtmHandshake, settings: &SessionSettings) -> Self {
        let self_peer_ids: HashSet<String> = handshake
            .users
            .iter()
            .filter(|u| u.is_bot)
            .map(|u| u.id.clone())
            .collect();

        // Last match wins if a workspace somehow lists duplicates.
        let mut debug_channel_id = None;
        let mut general_channel_id = None;
        for channel in &handshake.channels {
            if channel.name == settings.debug_channel_name {
                debug_channel_id = Some(channel.id.clone());
            }
            if channel.is_general {
                general_channel_id = Some(channel.id.clone());
            }
        }

        if debug_channel_id.is_none() {
            warn!(
                "Debug channel '#{}' not found in handshake",
                settings.debug_channel_name
            );
        }
        if general_channel_id.is_none() {
            warn!("No general channel found in handshake");
        }

        let ctx = Self::new(
            self_peer_ids,
            debug_channel_id,
            general_channel_id,
            settings.debug_mode,
        );
        info!(
            "Session ready: {} automated peers, debug={:?}, general={:?}, debug_mode={}",
            ctx.self_peer_ids.len(),
            ctx.debug_channel_id,
            ctx.general_channel_id,
            ctx.debug_mode
        );
        ctx
    }

    pub fn is_self_peer(&self, peer_id: &str) -> bool {
        self.self_peer_ids.contains(peer_id)
    }

    pub fn self_peer_ids(&self) -> &HashSet<String> {
        &self.self_peer_ids
    }

    pub fn debug_channel_id(&self) -> Option<&str> {
        self.debug_channel_id.as_deref()
    }

    pub fn general_channel_id(&self) -> Option<&str> {
        self.general_channel_id.as_deref()
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }
}

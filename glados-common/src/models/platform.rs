// File: glados-common/src/models/platform.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Error(String),
}

/// A workspace member as listed by the connection handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

/// A channel as listed by the connection handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_general: bool,
}

/// What the platform tells us at connection start: where the realtime
/// socket lives and which peers and channels are visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtmHandshake {
    pub url: String,
    #[serde(default)]
    pub users: Vec<PeerInfo>,
    #[serde(default)]
    pub channels: Vec<ChannelInfo>,
}

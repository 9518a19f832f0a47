//! Runtime configuration for one client connection.

use std::path::PathBuf;

pub const DEFAULT_MANIFEST_PATH: &str = "plugins.json";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://memory.db";
pub const DEFAULT_DEBUG_CHANNEL_NAME: &str = "aperture-science";
pub const DEFAULT_TRIGGER_PORT: u16 = 9393;

/// What `SessionContext::from_handshake` needs besides the handshake itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Name (not id) of the channel a debug deployment is confined to.
    pub debug_channel_name: String,
    pub debug_mode: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debug_channel_name: DEFAULT_DEBUG_CHANNEL_NAME.to_string(),
            debug_mode: false,
        }
    }
}

/// Everything the binary resolves from CLI flags and the environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub token: String,
    pub manifest_path: PathBuf,
    pub database_url: String,
    pub session: SessionSettings,
    /// Port for the local async-trigger endpoint; `None` disables it.
    pub trigger_port: Option<u16>,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            session: SessionSettings::default(),
            trigger_port: Some(DEFAULT_TRIGGER_PORT),
        }
    }

    pub fn debug_mode(&self) -> bool {
        self.session.debug_mode
    }
}

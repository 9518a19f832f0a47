// ================================================================
// File: glados-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Plugin manifest / registry:
    #[error("Plugin manifest not found: {0}")]
    ManifestMissing(String),

    #[error("Plugin manifest is malformed: {0}")]
    ManifestMalformed(String),

    #[error("Could not resolve plugin '{plugin}': {reason}")]
    PluginResolution { plugin: String, reason: String },

    #[error("Could not initialize plugin '{plugin}': {reason}")]
    PluginConstruction { plugin: String, reason: String },

    #[error("Plugin '{plugin}' failed: {reason}")]
    PluginRuntime { plugin: String, reason: String },

    #[error("Unknown async plugin: {0}")]
    UnknownAsyncTarget(String),

    // Outbound / transport:
    #[error("Channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // Wrapped library errors:
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl Error {
    pub fn resolution(plugin: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::PluginResolution {
            plugin: plugin.into(),
            reason: reason.to_string(),
        }
    }

    pub fn construction(plugin: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::PluginConstruction {
            plugin: plugin.into(),
            reason: reason.to_string(),
        }
    }

    pub fn runtime(plugin: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::PluginRuntime {
            plugin: plugin.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        // Plugin code may use anyhow internally.
        Error::Parse(e.to_string())
    }
}

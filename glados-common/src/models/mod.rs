// File: glados-common/src/models/mod.rs
pub mod event;
pub mod outbound;
pub mod platform;
pub mod plugin;

pub use event::InboundEvent;
pub use outbound::{Attachment, AttachmentField, OutboundMessage};
pub use platform::{ChannelInfo, ConnectionStatus, PeerInfo, RtmHandshake};
pub use plugin::{DispatchKind, PluginManifestEntry};

// src/plugins/types.rs
use std::fmt;
use std::sync::Arc;

use glados_common::models::DispatchKind;
use glados_common::traits::{AsyncPlugin, MemoryStore, MessagePlugin};

use crate::outbound::{ChannelPoster, GeneralBroadcaster};
use crate::Error;

/// What a sync plugin receives at construction.
#[derive(Clone)]
pub struct MessagePluginContext {
    /// The registered (class) name; a sensible memory namespace.
    pub name: String,
    pub memory: Arc<dyn MemoryStore>,
    pub poster: ChannelPoster,
}

/// What an async plugin receives at construction.
#[derive(Clone)]
pub struct AsyncPluginContext {
    pub name: String,
    pub memory: Arc<dyn MemoryStore>,
    pub broadcaster: GeneralBroadcaster,
}

pub type MessagePluginConstructor =
    Arc<dyn Fn(MessagePluginContext) -> Result<Box<dyn MessagePlugin>, Error> + Send + Sync>;

pub type AsyncPluginConstructor =
    Arc<dyn Fn(AsyncPluginContext) -> Result<Box<dyn AsyncPlugin>, Error> + Send + Sync>;

/// A constructible handler type, tagged with the flavour it builds.
#[derive(Clone)]
pub enum PluginConstructor {
    Message(MessagePluginConstructor),
    Async(AsyncPluginConstructor),
}

impl PluginConstructor {
    pub fn dispatch_kind(&self) -> DispatchKind {
        match self {
            PluginConstructor::Message(_) => DispatchKind::Sync,
            PluginConstructor::Async(_) => DispatchKind::Async,
        }
    }
}

/// A manifest entry that resolved against the catalog.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub module: String,
    pub dispatch_kind: DispatchKind,
    pub constructor: PluginConstructor,
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("dispatch_kind", &self.dispatch_kind)
            .finish_non_exhaustive()
    }
}

/// A live sync plugin, in dispatch order.
pub struct LoadedMessagePlugin {
    pub name: String,
    pub plugin: Box<dyn MessagePlugin>,
}

/// A live async plugin.
pub struct LoadedAsyncPlugin {
    pub name: String,
    pub plugin: Box<dyn AsyncPlugin>,
}

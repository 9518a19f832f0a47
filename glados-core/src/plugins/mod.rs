//! src/plugins/mod.rs
//!
//! Manifest loading, the plugin catalog, and the per-connection registry.

pub mod builtin;
pub mod catalog;
pub(crate) mod guard;
pub mod manifest;
pub mod registry;
pub mod types;

pub use catalog::PluginCatalog;
pub use registry::PluginRegistry;
pub use types::{AsyncPluginContext, MessagePluginContext, PluginDescriptor};

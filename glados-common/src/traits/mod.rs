pub mod memory_traits;
pub mod platform_traits;
pub mod plugin_traits;

pub use memory_traits::MemoryStore;
pub use platform_traits::{ChatTransport, MessagePoster};
pub use plugin_traits::{AsyncPlugin, MessagePlugin, PluginLifecycle};

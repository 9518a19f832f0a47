//! Plugins shipped with the bot. Anything else is registered by the binary
//! that embeds the core.

pub mod announcer;
pub mod greeter;
pub mod last_seen;

use crate::plugins::catalog::PluginCatalog;

pub use announcer::Announcer;
pub use greeter::Greeter;
pub use last_seen::LastSeen;

pub fn register_all(catalog: &mut PluginCatalog) {
    catalog.register_message("greeter", "Greeter", |ctx| Ok(Box::new(Greeter::new(ctx))));
    catalog.register_message("seen", "LastSeen", |ctx| Ok(Box::new(LastSeen::new(ctx))));
    catalog.register_async("announcer", "Announcer", |ctx| Ok(Box::new(Announcer::new(ctx))));
}

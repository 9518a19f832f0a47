//! The capability set every plugin exposes to the router.
//!
//! Plugins come in two flavours. A [`MessagePlugin`] sits in the ordered
//! inbound walk and may claim (consume) an event. An [`AsyncPlugin`] is never
//! part of the walk; it is addressed by name from an out-of-band trigger.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;
use crate::models::InboundEvent;

/// Setup/teardown hooks shared by both plugin flavours.
#[async_trait]
pub trait PluginLifecycle: Send + Sync {
    /// Called once after every plugin has been constructed.
    async fn setup(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Called once when the connection closes.
    async fn teardown(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

#[async_trait]
pub trait MessagePlugin: PluginLifecycle {
    /// Cheap check; `handle` is only called when this returns true.
    fn can_handle(&self, event: &InboundEvent) -> bool;

    async fn handle(&mut self, event: &InboundEvent) -> Result<(), Error>;

    /// Read right after `handle`. True stops the walk for this event.
    fn consumes_message(&self) -> bool {
        false
    }
}

#[async_trait]
pub trait AsyncPlugin: PluginLifecycle {
    async fn handle(&mut self, payload: Value) -> Result<(), Error>;
}

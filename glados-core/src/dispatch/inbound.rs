//! dispatch/inbound.rs
//!
//! First-consumer-wins walk over the sync plugins, after filtering.

use std::sync::Arc;

use tracing::{debug, error, trace};

use glados_common::models::InboundEvent;

use crate::dispatch::filter::{filter_event, FilterVerdict};
use crate::plugins::guard::{guarded, guarded_sync};
use crate::plugins::types::LoadedMessagePlugin;
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Filtered out before any plugin saw it.
    Dropped(FilterVerdict),
    /// `plugin` handled the event and claimed it.
    Consumed { plugin: String },
    /// Walked the whole list; these plugins handled it without claiming it.
    Unconsumed { handled_by: Vec<String> },
}

/// Debug mode traces every raw frame except our own echoes.
fn traces_raw(session: &SessionContext, verdict: FilterVerdict) -> bool {
    session.debug_mode() && verdict != FilterVerdict::DropSelfPeer
}

/// Stateless between events; holds only the session it filters against.
#[derive(Clone)]
pub struct InboundDispatcher {
    session: Arc<SessionContext>,
}

impl InboundDispatcher {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn dispatch(
        &self,
        event: &InboundEvent,
        plugins: &mut [LoadedMessagePlugin],
    ) -> DispatchOutcome {
        let verdict = filter_event(event, &self.session);
        if traces_raw(&self.session, verdict) {
            debug!("(INBOUND) {:?}", event.raw_payload);
        }
        if !verdict.is_route() {
            trace!("Dropping event: {:?}", verdict);
            return DispatchOutcome::Dropped(verdict);
        }

        let mut handled_by = Vec::new();
        for entry in plugins.iter_mut() {
            let claims = match guarded_sync(&entry.name, || entry.plugin.can_handle(event)) {
                Ok(claims) => claims,
                Err(e) => {
                    error!("{}", e);
                    continue;
                }
            };
            if !claims {
                continue;
            }

            if let Err(e) = guarded(&entry.name, entry.plugin.handle(event)).await {
                error!("Plugin {} failed to handle event: {}", entry.name, e);
                continue;
            }
            handled_by.push(entry.name.clone());

            let consumed = guarded_sync(&entry.name, || entry.plugin.consumes_message()).unwrap_or(false);
            if consumed {
                trace!("Event consumed by {}", entry.name);
                return DispatchOutcome::Consumed {
                    plugin: entry.name.clone(),
                };
            }
        }

        DispatchOutcome::Unconsumed { handled_by }
    }
}

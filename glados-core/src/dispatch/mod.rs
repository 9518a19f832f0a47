//! Routing of events to plugins: the filtered inbound walk and the
//! name-addressed async path.

pub mod async_gateway;
pub mod filter;
pub mod inbound;

pub use async_gateway::AsyncDispatchGateway;
pub use filter::{filter_event, FilterVerdict};
pub use inbound::{DispatchOutcome, InboundDispatcher};

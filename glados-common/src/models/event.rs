//! Inbound events as decoded from the chat platform's realtime stream.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Error;

/// One decoded frame from the realtime stream.
///
/// Only the fields the router needs are lifted out of the payload; plugins
/// read anything else straight from `raw_payload`.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub sender_id: Option<String>,
    pub channel_id: Option<String>,
    pub raw_payload: Map<String, Value>,
    /// Reply/ack frames carry an `"ok"` marker and nothing routable.
    pub is_acknowledgement: bool,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    /// Builds an event from an already-parsed JSON object.
    pub fn from_payload(raw_payload: Map<String, Value>) -> Self {
        let sender_id = raw_payload
            .get("user")
            .and_then(Value::as_str)
            .map(str::to_string);
        let channel_id = raw_payload
            .get("channel")
            .and_then(Value::as_str)
            .map(str::to_string);
        let is_acknowledgement = raw_payload.contains_key("ok");

        Self {
            sender_id,
            channel_id,
            raw_payload,
            is_acknowledgement,
            received_at: Utc::now(),
        }
    }

    /// Decodes one text frame. Anything that isn't a JSON object is rejected.
    pub fn from_json(raw: &str) -> Result<Self, Error> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(Self::from_payload(map)),
            other => Err(Error::Parse(format!(
                "expected a JSON object event, got: {other}"
            ))),
        }
    }

    /// The `"type"` field, e.g. `"message"` or `"presence_change"`.
    pub fn event_type(&self) -> Option<&str> {
        self.raw_payload.get("type").and_then(Value::as_str)
    }

    /// The `"text"` field of a message event.
    pub fn text(&self) -> Option<&str> {
        self.raw_payload.get("text").and_then(Value::as_str)
    }
}

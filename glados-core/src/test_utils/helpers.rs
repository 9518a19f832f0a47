// File: glados-core/src/test_utils/helpers.rs
//! Recording doubles and fixtures shared by unit and integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use glados_common::models::{
    ChannelInfo, ConnectionStatus, InboundEvent, OutboundMessage, PeerInfo, RtmHandshake,
};
use glados_common::traits::{
    AsyncPlugin, ChatTransport, MemoryStore, MessagePlugin, MessagePoster, PluginLifecycle,
};

use crate::memory::InMemoryStore;
use crate::Error;

pub const BOT_ID: &str = "U_GLADOS";
pub const HUMAN_ID: &str = "U_CHELL";
pub const GENERAL_ID: &str = "C_GENERAL";
pub const DEBUG_ID: &str = "C_APERTURE";
pub const OTHER_ID: &str = "C_RANDOM";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking plugin under test must not poison the log for the asserts.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ordered record of calls, shared between doubles and the test body.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.calls).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        lock(&self.calls).iter().position(|c| c == entry)
    }

    /// Entries that start with `prefix`, e.g. every `"Greeter."` call.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

/// How a recorded hook behaves after logging itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behavior {
    #[default]
    Succeed,
    Fail,
    Panic,
}

fn act(log: &CallLog, name: &str, hook: &str, behavior: Behavior) -> Result<(), Error> {
    log.record(format!("{name}.{hook}"));
    match behavior {
        Behavior::Succeed => Ok(()),
        Behavior::Fail => Err(Error::Platform(format!("{name}.{hook} failed"))),
        Behavior::Panic => panic!("{name}.{hook} panicked"),
    }
}

/// A sync plugin that logs every hook as `"<name>.<hook>"`.
pub struct RecordingPlugin {
    name: String,
    log: CallLog,
    claims: bool,
    consumes: bool,
    on_handle: Behavior,
    on_setup: Behavior,
    on_teardown: Behavior,
}

impl RecordingPlugin {
    /// Claims every event, does not consume, never fails.
    pub fn new(name: &str, log: CallLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            claims: true,
            consumes: false,
            on_handle: Behavior::Succeed,
            on_setup: Behavior::Succeed,
            on_teardown: Behavior::Succeed,
        }
    }

    pub fn claims(mut self, claims: bool) -> Self {
        self.claims = claims;
        self
    }

    pub fn consumes(mut self, consumes: bool) -> Self {
        self.consumes = consumes;
        self
    }

    pub fn on_handle(mut self, behavior: Behavior) -> Self {
        self.on_handle = behavior;
        self
    }

    pub fn on_setup(mut self, behavior: Behavior) -> Self {
        self.on_setup = behavior;
        self
    }

    pub fn on_teardown(mut self, behavior: Behavior) -> Self {
        self.on_teardown = behavior;
        self
    }
}

#[async_trait]
impl PluginLifecycle for RecordingPlugin {
    async fn setup(&mut self) -> Result<(), Error> {
        act(&self.log, &self.name, "setup", self.on_setup)
    }

    async fn teardown(&mut self) -> Result<(), Error> {
        act(&self.log, &self.name, "teardown", self.on_teardown)
    }
}

#[async_trait]
impl MessagePlugin for RecordingPlugin {
    fn can_handle(&self, _event: &InboundEvent) -> bool {
        self.log.record(format!("{}.can_handle", self.name));
        self.claims
    }

    async fn handle(&mut self, _event: &InboundEvent) -> Result<(), Error> {
        act(&self.log, &self.name, "handle", self.on_handle)
    }

    fn consumes_message(&self) -> bool {
        self.consumes
    }
}

/// An async plugin that logs `"<name>.handle:<payload>"` per dispatch.
pub struct RecordingAsyncPlugin {
    name: String,
    log: CallLog,
    on_handle: Behavior,
    on_setup: Behavior,
    on_teardown: Behavior,
}

impl RecordingAsyncPlugin {
    pub fn new(name: &str, log: CallLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            on_handle: Behavior::Succeed,
            on_setup: Behavior::Succeed,
            on_teardown: Behavior::Succeed,
        }
    }

    pub fn on_handle(mut self, behavior: Behavior) -> Self {
        self.on_handle = behavior;
        self
    }

    pub fn on_setup(mut self, behavior: Behavior) -> Self {
        self.on_setup = behavior;
        self
    }

    pub fn on_teardown(mut self, behavior: Behavior) -> Self {
        self.on_teardown = behavior;
        self
    }
}

#[async_trait]
impl PluginLifecycle for RecordingAsyncPlugin {
    async fn setup(&mut self) -> Result<(), Error> {
        act(&self.log, &self.name, "setup", self.on_setup)
    }

    async fn teardown(&mut self) -> Result<(), Error> {
        act(&self.log, &self.name, "teardown", self.on_teardown)
    }
}

#[async_trait]
impl AsyncPlugin for RecordingAsyncPlugin {
    async fn handle(&mut self, payload: Value) -> Result<(), Error> {
        act(
            &self.log,
            &self.name,
            &format!("handle:{payload}"),
            self.on_handle,
        )
    }
}

/// Collects every posted message instead of sending it anywhere.
#[derive(Clone, Default)]
pub struct RecordingPoster {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    fail: bool,
}

impl RecordingPoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every post returns a platform error (after being recorded).
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl MessagePoster for RecordingPoster {
    async fn post_message(&self, message: &OutboundMessage) -> Result<(), Error> {
        lock(&self.sent).push(message.clone());
        if self.fail {
            return Err(Error::Platform("not_authed".into()));
        }
        Ok(())
    }
}

/// Plays back a fixed handshake and event list.
pub struct ScriptedTransport {
    handshake: RtmHandshake,
    events: VecDeque<InboundEvent>,
    log: CallLog,
    status: ConnectionStatus,
    fail_connect: bool,
    hold_open: bool,
}

impl ScriptedTransport {
    pub fn new(handshake: RtmHandshake, events: Vec<InboundEvent>, log: CallLog) -> Self {
        Self {
            handshake,
            events: events.into(),
            log,
            status: ConnectionStatus::Disconnected,
            fail_connect: false,
            hold_open: false,
        }
    }

    /// Keep the stream open after the script runs out, so only a shutdown
    /// signal ends the run loop.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn connect(&mut self) -> Result<RtmHandshake, Error> {
        self.log.record("transport.connect");
        if self.fail_connect {
            self.status = ConnectionStatus::Error("invalid_auth".into());
            return Err(Error::Platform("invalid_auth".into()));
        }
        self.status = ConnectionStatus::Connected;
        Ok(self.handshake.clone())
    }

    async fn next_event(&mut self) -> Option<InboundEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        if self.hold_open {
            std::future::pending::<()>().await;
        }
        None
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.log.record("transport.disconnect");
        self.status = ConnectionStatus::Disconnected;
        Ok(())
    }

    fn connection_status(&self) -> ConnectionStatus {
        self.status.clone()
    }
}

/// `InMemoryStore` that also logs `"memory.flush"`, for ordering asserts.
pub struct LoggingMemory {
    inner: InMemoryStore,
    log: CallLog,
}

impl LoggingMemory {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: InMemoryStore::new(),
            log,
        }
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }
}

#[async_trait]
impl MemoryStore for LoggingMemory {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, Error> {
        self.inner.get(namespace, key).await
    }

    async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<(), Error> {
        self.inner.put(namespace, key, value).await
    }

    async fn remove(&self, namespace: &str, key: &str) -> Result<(), Error> {
        self.inner.remove(namespace, key).await
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<String>, Error> {
        self.inner.keys(namespace).await
    }

    async fn flush(&self) -> Result<(), Error> {
        self.log.record("memory.flush");
        self.inner.flush().await
    }
}

/// A workspace with the bot, one human, and general/debug/other channels.
pub fn handshake_fixture() -> RtmHandshake {
    RtmHandshake {
        url: "wss://example.invalid/rtm".to_string(),
        users: vec![
            PeerInfo {
                id: BOT_ID.to_string(),
                name: Some("glados".to_string()),
                is_bot: true,
            },
            PeerInfo {
                id: HUMAN_ID.to_string(),
                name: Some("chell".to_string()),
                is_bot: false,
            },
        ],
        channels: vec![
            ChannelInfo {
                id: GENERAL_ID.to_string(),
                name: "general".to_string(),
                is_general: true,
            },
            ChannelInfo {
                id: DEBUG_ID.to_string(),
                name: "aperture-science".to_string(),
                is_general: false,
            },
            ChannelInfo {
                id: OTHER_ID.to_string(),
                name: "random".to_string(),
                is_general: false,
            },
        ],
    }
}

pub fn message_event(sender: &str, channel: &str, text: &str) -> InboundEvent {
    let payload = json!({
        "type": "message",
        "user": sender,
        "channel": channel,
        "text": text,
    });
    match payload {
        Value::Object(map) => InboundEvent::from_payload(map),
        _ => unreachable!("json! object literal"),
    }
}

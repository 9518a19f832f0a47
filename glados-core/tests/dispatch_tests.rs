// tests/dispatch_tests.rs

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use glados_common::models::{DispatchKind, InboundEvent, PluginManifestEntry};
use glados_common::traits::MemoryStore;
use glados_core::dispatch::{DispatchOutcome, FilterVerdict, InboundDispatcher};
use glados_core::memory::InMemoryStore;
use glados_core::outbound::OutboundGateway;
use glados_core::plugins::{PluginCatalog, PluginRegistry};
use glados_core::session::SessionContext;
use glados_core::test_utils::helpers::*;

fn session(debug_mode: bool) -> Arc<SessionContext> {
    Arc::new(SessionContext::new(
        HashSet::from([BOT_ID.to_string()]),
        Some(DEBUG_ID.to_string()),
        Some(GENERAL_ID.to_string()),
        debug_mode,
    ))
}

/// Registers one `RecordingPlugin` per spec under module = lowercase name.
async fn registry_of(plugins: Vec<RecordingSpec>, log: &CallLog) -> PluginRegistry {
    let mut catalog = PluginCatalog::new();
    let mut entries = Vec::new();
    for spec in plugins {
        let log = log.clone();
        let module = spec.name.to_lowercase();
        let name = spec.name;
        catalog.register_message(&module, name, move |_ctx| {
            Ok(Box::new(
                RecordingPlugin::new(name, log.clone())
                    .claims(spec.claims)
                    .consumes(spec.consumes)
                    .on_handle(spec.on_handle),
            ))
        });
        entries.push(PluginManifestEntry::new(&module, name, DispatchKind::Sync));
    }
    let descriptors = catalog.resolve_all(&entries);
    let outbound = Arc::new(OutboundGateway::new(
        Arc::new(RecordingPoster::new()),
        Some(GENERAL_ID.to_string()),
    ));
    let registry =
        PluginRegistry::initialize(descriptors, Arc::new(InMemoryStore::new()), outbound).await;
    log.clear();
    registry
}

#[derive(Clone, Copy)]
struct RecordingSpec {
    name: &'static str,
    claims: bool,
    consumes: bool,
    on_handle: Behavior,
}

fn plugin(name: &'static str) -> RecordingSpec {
    RecordingSpec {
        name,
        claims: true,
        consumes: false,
        on_handle: Behavior::Succeed,
    }
}

#[tokio::test]
async fn test_first_consumer_wins() {
    let log = CallLog::new();
    let mut registry = registry_of(
        vec![
            RecordingSpec { claims: false, ..plugin("A") },
            RecordingSpec { consumes: true, ..plugin("B") },
            plugin("C"),
        ],
        &log,
    )
    .await;

    let dispatcher = InboundDispatcher::new(session(false));
    let outcome = dispatcher
        .dispatch(&message_event(HUMAN_ID, GENERAL_ID, "x"), registry.sync_plugins_mut())
        .await;

    assert_eq!(outcome, DispatchOutcome::Consumed { plugin: "B".into() });
    assert_eq!(log.entries(), ["A.can_handle", "B.can_handle", "B.handle"]);
    assert!(log.with_prefix("C.").is_empty());
}

#[tokio::test]
async fn test_non_consuming_plugins_all_handle() {
    let log = CallLog::new();
    let mut registry = registry_of(vec![plugin("A"), plugin("B")], &log).await;

    let outcome = InboundDispatcher::new(session(false))
        .dispatch(&message_event(HUMAN_ID, GENERAL_ID, "x"), registry.sync_plugins_mut())
        .await;

    assert_eq!(
        outcome,
        DispatchOutcome::Unconsumed { handled_by: vec!["A".into(), "B".into()] }
    );
    assert_eq!(
        log.entries(),
        ["A.can_handle", "A.handle", "B.can_handle", "B.handle"]
    );
}

#[tokio::test]
async fn test_self_peer_reaches_no_plugin() {
    let log = CallLog::new();
    let mut registry = registry_of(vec![plugin("A"), plugin("B")], &log).await;

    let outcome = InboundDispatcher::new(session(false))
        .dispatch(&message_event(BOT_ID, GENERAL_ID, "hello"), registry.sync_plugins_mut())
        .await;

    assert_eq!(outcome, DispatchOutcome::Dropped(FilterVerdict::DropSelfPeer));
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_debug_and_production_channel_isolation() {
    let log = CallLog::new();
    let mut registry = registry_of(vec![plugin("A")], &log).await;

    let debug = InboundDispatcher::new(session(true));
    let outcome = debug
        .dispatch(&message_event(HUMAN_ID, OTHER_ID, "x"), registry.sync_plugins_mut())
        .await;
    assert_eq!(outcome, DispatchOutcome::Dropped(FilterVerdict::DropOutsideDebugChannel));
    let outcome = debug
        .dispatch(&message_event(HUMAN_ID, DEBUG_ID, "x"), registry.sync_plugins_mut())
        .await;
    assert!(matches!(outcome, DispatchOutcome::Unconsumed { .. }));

    let production = InboundDispatcher::new(session(false));
    let outcome = production
        .dispatch(&message_event(HUMAN_ID, DEBUG_ID, "x"), registry.sync_plugins_mut())
        .await;
    assert_eq!(outcome, DispatchOutcome::Dropped(FilterVerdict::DropDebugChannel));

    assert_eq!(log.count("A.handle"), 1);
}

#[tokio::test]
async fn test_acknowledgements_are_dropped() {
    let log = CallLog::new();
    let mut registry = registry_of(vec![plugin("A")], &log).await;

    let ack = InboundEvent::from_json(r#"{"ok": true, "reply_to": 1, "ts": "1.0"}"#).unwrap();
    let outcome = InboundDispatcher::new(session(false))
        .dispatch(&ack, registry.sync_plugins_mut())
        .await;

    assert_eq!(outcome, DispatchOutcome::Dropped(FilterVerdict::DropAcknowledgement));
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_failing_plugins_do_not_stop_the_walk() {
    let log = CallLog::new();
    let mut registry = registry_of(
        vec![
            RecordingSpec { on_handle: Behavior::Fail, consumes: true, ..plugin("A") },
            RecordingSpec { on_handle: Behavior::Panic, consumes: true, ..plugin("B") },
            RecordingSpec { consumes: true, ..plugin("C") },
        ],
        &log,
    )
    .await;

    let outcome = InboundDispatcher::new(session(false))
        .dispatch(&message_event(HUMAN_ID, GENERAL_ID, "x"), registry.sync_plugins_mut())
        .await;

    assert_eq!(outcome, DispatchOutcome::Consumed { plugin: "C".into() });
    assert_eq!(log.count("A.handle"), 1);
    assert_eq!(log.count("B.handle"), 1);
    assert_eq!(log.count("C.handle"), 1);

    // The registry is still usable after a panic.
    let again = InboundDispatcher::new(session(false))
        .dispatch(&message_event(HUMAN_ID, GENERAL_ID, "y"), registry.sync_plugins_mut())
        .await;
    assert_eq!(again, DispatchOutcome::Consumed { plugin: "C".into() });
}

#[tokio::test]
async fn test_greeter_answers_and_claims() {
    let poster = RecordingPoster::new();
    let memory = Arc::new(InMemoryStore::new());
    let outbound = Arc::new(OutboundGateway::new(
        Arc::new(poster.clone()),
        Some(GENERAL_ID.to_string()),
    ));
    let entries = vec![
        PluginManifestEntry::new("greeter", "Greeter", DispatchKind::Sync),
        PluginManifestEntry::new("seen", "LastSeen", DispatchKind::Sync),
    ];
    let descriptors = PluginCatalog::with_builtins().resolve_all(&entries);
    let mut registry = PluginRegistry::initialize(descriptors, memory.clone(), outbound).await;
    let dispatcher = InboundDispatcher::new(session(false));

    let outcome = dispatcher
        .dispatch(&message_event(HUMAN_ID, OTHER_ID, "Hello!"), registry.sync_plugins_mut())
        .await;
    assert_eq!(outcome, DispatchOutcome::Consumed { plugin: "Greeter".into() });

    let sent = poster.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, OTHER_ID);
    assert_eq!(sent[0].text, format!("Hello, <@{HUMAN_ID}>."));
    assert!(sent[0].as_user);

    // LastSeen sat behind the consumer and never ran.
    assert_eq!(memory.get("LastSeen", HUMAN_ID).await.unwrap(), None);
    assert_eq!(
        memory.get("Greeter", HUMAN_ID).await.unwrap(),
        Some(json!({ "greetings": 1 }))
    );

    // Anything else falls through to LastSeen.
    let outcome = dispatcher
        .dispatch(&message_event(HUMAN_ID, OTHER_ID, "the cake"), registry.sync_plugins_mut())
        .await;
    assert_eq!(
        outcome,
        DispatchOutcome::Unconsumed { handled_by: vec!["LastSeen".into()] }
    );
    assert!(memory.get("LastSeen", HUMAN_ID).await.unwrap().is_some());
    assert_eq!(poster.sent().len(), 1);
}

#[tokio::test]
async fn test_last_seen_answers_queries() {
    let poster = RecordingPoster::new();
    let outbound = Arc::new(OutboundGateway::new(Arc::new(poster.clone()), None));
    let entries = vec![PluginManifestEntry::new("seen", "LastSeen", DispatchKind::Sync)];
    let descriptors = PluginCatalog::with_builtins().resolve_all(&entries);
    let mut registry =
        PluginRegistry::initialize(descriptors, Arc::new(InMemoryStore::new()), outbound).await;
    let dispatcher = InboundDispatcher::new(session(false));

    dispatcher
        .dispatch(&message_event("U_WHEATLEY", OTHER_ID, "hi"), registry.sync_plugins_mut())
        .await;
    let outcome = dispatcher
        .dispatch(
            &message_event(HUMAN_ID, GENERAL_ID, "!seen <@U_WHEATLEY>"),
            registry.sync_plugins_mut(),
        )
        .await;

    assert_eq!(outcome, DispatchOutcome::Consumed { plugin: "LastSeen".into() });
    let sent = poster.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, GENERAL_ID);
    assert!(sent[0].text.starts_with("<@U_WHEATLEY> was last seen at "));
}

// tests/registry_tests.rs

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use glados_common::traits::MessagePlugin;
use glados_core::memory::InMemoryStore;
use glados_core::outbound::OutboundGateway;
use glados_core::plugins::{PluginCatalog, PluginRegistry};
use glados_core::test_utils::helpers::*;
use glados_core::Error;

fn write_manifest(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("plugins.json");
    std::fs::write(&path, body).unwrap();
    path
}

fn outbound() -> Arc<OutboundGateway> {
    Arc::new(OutboundGateway::new(
        Arc::new(RecordingPoster::new()),
        Some(GENERAL_ID.to_string()),
    ))
}

fn recording_catalog(log: &CallLog) -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    for (module, class) in [("alpha", "Alpha"), ("beta", "Beta"), ("zeta", "Zeta")] {
        let log = log.clone();
        catalog.register_message(module, class, move |_| {
            Ok(Box::new(RecordingPlugin::new(class, log.clone())))
        });
    }
    for (module, class) in [("relay_a", "Relay"), ("relay_b", "Relay"), ("pager", "Pager")] {
        let log = log.clone();
        catalog.register_async(module, class, move |_| {
            Ok(Box::new(RecordingAsyncPlugin::new(class, log.clone())))
        });
    }
    catalog
}

#[tokio::test]
async fn test_unresolvable_entries_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write_manifest(
        &dir,
        r#"{
            "beta":    {"plugin_class": "Beta",    "plugin_type": "normal"},
            "missing": {"plugin_class": "Missing", "plugin_type": "normal"},
            "alpha":   {"plugin_class": "Alpha",   "plugin_type": "threaded"},
            "zeta":    {"plugin_class": "Zeta",    "plugin_type": "normal"},
            "pager":   {"plugin_class": "Pager",   "plugin_type": "async"},
            "broken":  "not an object"
        }"#,
    );

    let descriptors = PluginRegistry::load(&path, &recording_catalog(&CallLog::new()));
    let names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Beta", "Zeta", "Pager"]);
}

#[tokio::test]
async fn test_manifest_order_is_dispatch_order() {
    let dir = TempDir::new().unwrap();
    let path = write_manifest(
        &dir,
        r#"{
            "zeta":  {"plugin_class": "Zeta",  "plugin_type": "normal"},
            "alpha": {"plugin_class": "Alpha", "plugin_type": "normal"},
            "beta":  {"plugin_class": "Beta",  "plugin_type": "normal"}
        }"#,
    );
    let log = CallLog::new();
    let descriptors = PluginRegistry::load(&path, &recording_catalog(&log));
    let registry =
        PluginRegistry::initialize(descriptors, Arc::new(InMemoryStore::new()), outbound()).await;

    assert_eq!(registry.sync_plugin_names(), ["Zeta", "Alpha", "Beta"]);
    assert_eq!(log.entries(), ["Zeta.setup", "Alpha.setup", "Beta.setup"]);
}

#[tokio::test]
async fn test_missing_or_malformed_manifest_loads_nothing() {
    let dir = TempDir::new().unwrap();
    let catalog = recording_catalog(&CallLog::new());

    let missing = dir.path().join("nope.json");
    assert!(PluginRegistry::load(&missing, &catalog).is_empty());

    let malformed = write_manifest(&dir, r#"{"alpha": {"plugin_class": "Alpha""#);
    assert!(PluginRegistry::load(&malformed, &catalog).is_empty());

    let not_an_object = write_manifest(&dir, r#"["alpha", "beta"]"#);
    assert!(PluginRegistry::load(&not_an_object, &catalog).is_empty());
}

#[tokio::test]
async fn test_construction_and_setup_failures_are_isolated() {
    let log = CallLog::new();
    let mut catalog = recording_catalog(&log);
    catalog.register_message("refuses", "Refuses", |_| {
        Err(Error::Platform("no neurotoxin configured".into()))
    });
    catalog.register_message("explodes", "Explodes", |_| -> Result<Box<dyn MessagePlugin>, Error> {
        panic!("constructor blew up")
    });
    let l = log.clone();
    catalog.register_message("shy", "Shy", move |_| {
        Ok(Box::new(RecordingPlugin::new("Shy", l.clone()).on_setup(Behavior::Fail)))
    });
    let l = log.clone();
    catalog.register_async("moody", "Moody", move |_| {
        Ok(Box::new(RecordingAsyncPlugin::new("Moody", l.clone()).on_setup(Behavior::Panic)))
    });

    let dir = TempDir::new().unwrap();
    let path = write_manifest(
        &dir,
        r#"{
            "alpha":    {"plugin_class": "Alpha",    "plugin_type": "normal"},
            "refuses":  {"plugin_class": "Refuses",  "plugin_type": "normal"},
            "explodes": {"plugin_class": "Explodes", "plugin_type": "normal"},
            "shy":      {"plugin_class": "Shy",      "plugin_type": "normal"},
            "beta":     {"plugin_class": "Beta",     "plugin_type": "normal"},
            "moody":    {"plugin_class": "Moody",    "plugin_type": "async"},
            "pager":    {"plugin_class": "Pager",    "plugin_type": "async"}
        }"#,
    );
    let descriptors = PluginRegistry::load(&path, &catalog);
    assert_eq!(descriptors.len(), 7);

    let mut registry =
        PluginRegistry::initialize(descriptors, Arc::new(InMemoryStore::new()), outbound()).await;
    assert_eq!(registry.sync_plugin_names(), ["Alpha", "Beta"]);
    assert_eq!(registry.async_plugin_names().await, ["Pager"]);

    // Setup ran on everything constructed; sync first, then async.
    assert_eq!(
        log.entries(),
        ["Alpha.setup", "Shy.setup", "Beta.setup", "Moody.setup", "Pager.setup"]
    );

    log.clear();
    registry.teardown_all().await;
    assert_eq!(log.entries(), ["Alpha.teardown", "Beta.teardown", "Pager.teardown"]);
}

#[tokio::test]
async fn test_duplicate_async_names_keep_the_first() {
    let log = CallLog::new();
    let dir = TempDir::new().unwrap();
    let path = write_manifest(
        &dir,
        r#"{
            "relay_a": {"plugin_class": "Relay", "plugin_type": "async"},
            "relay_b": {"plugin_class": "Relay", "plugin_type": "async"}
        }"#,
    );
    let descriptors = PluginRegistry::load(&path, &recording_catalog(&log));
    assert_eq!(descriptors.len(), 2);

    let registry =
        PluginRegistry::initialize(descriptors, Arc::new(InMemoryStore::new()), outbound()).await;
    assert_eq!(registry.async_plugin_names().await, ["Relay"]);
    assert_eq!(log.count("Relay.setup"), 1);
}

#[tokio::test]
async fn test_teardown_runs_exactly_once() {
    let log = CallLog::new();
    let mut catalog = recording_catalog(&log);
    let l = log.clone();
    catalog.register_message("grumpy", "Grumpy", move |_| {
        Ok(Box::new(RecordingPlugin::new("Grumpy", l.clone()).on_teardown(Behavior::Panic)))
    });

    let dir = TempDir::new().unwrap();
    let path = write_manifest(
        &dir,
        r#"{
            "grumpy": {"plugin_class": "Grumpy", "plugin_type": "normal"},
            "alpha":  {"plugin_class": "Alpha",  "plugin_type": "normal"},
            "pager":  {"plugin_class": "Pager",  "plugin_type": "async"}
        }"#,
    );
    let descriptors = PluginRegistry::load(&path, &catalog);
    let mut registry =
        PluginRegistry::initialize(descriptors, Arc::new(InMemoryStore::new()), outbound()).await;

    assert_eq!(registry.teardown_all().await, 3);
    assert_eq!(registry.teardown_all().await, 0);

    for name in ["Grumpy", "Alpha", "Pager"] {
        assert_eq!(log.count(&format!("{name}.teardown")), 1, "{name}");
    }
    assert!(registry.sync_plugin_names().is_empty());
    assert!(registry.async_plugin_names().await.is_empty());
}

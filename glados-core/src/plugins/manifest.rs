//! plugins/manifest.rs
//!
//! Reads `plugins.json`:
//!
//! ```json
//! {
//!     "greeter":   {"plugin_class": "Greeter",   "plugin_type": "normal"},
//!     "announcer": {"plugin_class": "Announcer", "plugin_type": "async"}
//! }
//! ```
//!
//! Key order in the file is dispatch priority, so the object is walked in
//! document order rather than collected into a map.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use glados_common::models::PluginManifestEntry;

use crate::Error;

/// A parsed manifest. Entries whose shape is wrong are kept aside in
/// `invalid` so the rest of the file still loads.
#[derive(Debug, Default)]
pub struct Manifest {
    pub entries: Vec<PluginManifestEntry>,
    pub invalid: Vec<Error>,
}

#[derive(Deserialize)]
struct RawEntry {
    plugin_class: String,
    plugin_type: String,
}

struct OrderedObject(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedObject;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object mapping module names to plugin entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<OrderedObject, A::Error> {
                let mut out = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    // A repeated module keeps its first position and takes the later value.
                    match out.iter_mut().find(|(k, _): &&mut (String, Value)| *k == key) {
                        Some((_, existing)) => *existing = value,
                        None => out.push((key, value)),
                    }
                }
                Ok(OrderedObject(out))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

pub fn parse_manifest(raw: &str) -> Result<Manifest, Error> {
    let OrderedObject(items) =
        serde_json::from_str(raw).map_err(|e| Error::ManifestMalformed(e.to_string()))?;

    let mut manifest = Manifest::default();
    for (module_name, value) in items {
        match serde_json::from_value::<RawEntry>(value) {
            Ok(raw) => manifest.entries.push(PluginManifestEntry {
                module_name,
                class_name: raw.plugin_class,
                plugin_type: raw.plugin_type,
            }),
            Err(e) => manifest
                .invalid
                .push(Error::resolution(module_name, format!("invalid manifest entry: {e}"))),
        }
    }
    Ok(manifest)
}

pub fn read_manifest(path: &Path) -> Result<Manifest, Error> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::ManifestMissing(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    parse_manifest(&raw)
}

/// Never fails: a missing or malformed file means zero plugins.
pub fn load_manifest(path: &Path) -> Vec<PluginManifestEntry> {
    match read_manifest(path) {
        Ok(manifest) => {
            for problem in &manifest.invalid {
                error!("Problem loading plugin: {}", problem);
            }
            info!(
                "Loaded {} plugin entries from {:?}",
                manifest.entries.len(),
                path
            );
            manifest.entries
        }
        Err(Error::ManifestMissing(p)) => {
            warn!("Could not load plugins: no manifest at {}", p);
            Vec::new()
        }
        Err(e) => {
            error!("Could not load plugins from {:?}: {}", path, e);
            Vec::new()
        }
    }
}

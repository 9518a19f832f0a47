//! plugins/catalog.rs
//!
//! Explicit registry of every plugin type this binary can build, keyed by
//! (module, class) exactly as the manifest names them.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info};

use glados_common::models::PluginManifestEntry;
use glados_common::traits::{AsyncPlugin, MessagePlugin};

use crate::plugins::builtin;
use crate::plugins::types::{
    AsyncPluginContext, MessagePluginContext, PluginConstructor, PluginDescriptor,
};
use crate::Error;

#[derive(Clone, Default)]
pub struct PluginCatalog {
    modules: BTreeMap<String, BTreeMap<String, PluginConstructor>>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog pre-populated with the plugins shipped in this crate.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        builtin::register_all(&mut catalog);
        catalog
    }

    pub fn register_message<F>(&mut self, module: &str, class: &str, constructor: F)
    where
        F: Fn(MessagePluginContext) -> Result<Box<dyn MessagePlugin>, Error> + Send + Sync + 'static,
    {
        self.insert(module, class, PluginConstructor::Message(Arc::new(constructor)));
    }

    pub fn register_async<F>(&mut self, module: &str, class: &str, constructor: F)
    where
        F: Fn(AsyncPluginContext) -> Result<Box<dyn AsyncPlugin>, Error> + Send + Sync + 'static,
    {
        self.insert(module, class, PluginConstructor::Async(Arc::new(constructor)));
    }

    fn insert(&mut self, module: &str, class: &str, constructor: PluginConstructor) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(class.to_string(), constructor);
    }

    pub fn contains(&self, module: &str, class: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|classes| classes.contains_key(class))
    }

    /// Resolves one manifest entry.
    pub fn resolve(&self, entry: &PluginManifestEntry) -> Result<PluginDescriptor, Error> {
        let plugin = entry.class_name.as_str();

        let kind = entry.dispatch_kind().ok_or_else(|| {
            Error::resolution(plugin, format!("unknown plugin_type '{}'", entry.plugin_type))
        })?;

        let classes = self.modules.get(&entry.module_name).ok_or_else(|| {
            Error::resolution(plugin, format!("no plugin module named '{}'", entry.module_name))
        })?;

        let constructor = classes.get(plugin).ok_or_else(|| {
            Error::resolution(
                plugin,
                format!("module '{}' has no plugin class '{}'", entry.module_name, plugin),
            )
        })?;

        if constructor.dispatch_kind() != kind {
            return Err(Error::resolution(
                plugin,
                format!(
                    "manifest declares plugin_type '{}' but the class is a '{}' plugin",
                    kind,
                    constructor.dispatch_kind()
                ),
            ));
        }

        Ok(PluginDescriptor {
            name: plugin.to_string(),
            module: entry.module_name.clone(),
            dispatch_kind: kind,
            constructor: constructor.clone(),
        })
    }

    /// Resolves every entry in order. Failures are logged and skipped.
    pub fn resolve_all(&self, entries: &[PluginManifestEntry]) -> Vec<PluginDescriptor> {
        let mut descriptors = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.resolve(entry) {
                Ok(descriptor) => {
                    info!(
                        "Resolved plugin '{}' from module '{}' ({})",
                        descriptor.name, descriptor.module, descriptor.dispatch_kind
                    );
                    descriptors.push(descriptor);
                }
                Err(e) => error!("Problem loading plugin {}: {}", entry.class_name, e),
            }
        }
        descriptors
    }
}

use std::fmt;

/// How a plugin is reached: through the inbound walk, or by name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    /// Manifest value `"normal"`.
    Sync,
    /// Manifest value `"async"`.
    Async,
}

impl DispatchKind {
    pub fn from_manifest(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(DispatchKind::Sync),
            "async" => Some(DispatchKind::Async),
            _ => None,
        }
    }
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchKind::Sync => write!(f, "normal"),
            DispatchKind::Async => write!(f, "async"),
        }
    }
}

/// One `"module": {"plugin_class": .., "plugin_type": ..}` line of `plugins.json`.
///
/// `plugin_type` is kept raw so an unknown value fails resolution for this
/// entry only, instead of failing the whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifestEntry {
    pub module_name: String,
    pub class_name: String,
    pub plugin_type: String,
}

impl PluginManifestEntry {
    pub fn new(
        module_name: impl Into<String>,
        class_name: impl Into<String>,
        kind: DispatchKind,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            class_name: class_name.into(),
            plugin_type: kind.to_string(),
        }
    }

    pub fn dispatch_kind(&self) -> Option<DispatchKind> {
        DispatchKind::from_manifest(&self.plugin_type)
    }
}

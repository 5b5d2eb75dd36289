use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};
use crate::filter::FilterState;
use crate::geocode::ResolverConfig;
use crate::surface::{BackendKind, VendorCredentials};

/// Engine bootstrap configuration.
///
/// Serializable so host applications can persist/load the map setup without
/// inventing their own ad-hoc format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEngineConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Absent credentials keep the vendor backend selectable but empty.
    #[serde(default)]
    pub vendor_credentials: Option<VendorCredentials>,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub initial_filter: FilterState,
    /// Move the viewport to cover the drawn markers after data, filter and
    /// backend changes. Off, the map only moves when the user does.
    #[serde(default = "default_auto_fit")]
    pub auto_fit: bool,
}

impl Default for MapEngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MapEngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: default_backend(),
            vendor_credentials: None,
            resolver: ResolverConfig::default(),
            initial_filter: FilterState::default(),
            auto_fit: default_auto_fit(),
        }
    }

    #[must_use]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn with_vendor_credentials(mut self, credentials: VendorCredentials) -> Self {
        self.vendor_credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_initial_filter(mut self, initial_filter: FilterState) -> Self {
        self.initial_filter = initial_filter;
        self
    }

    #[must_use]
    pub fn with_auto_fit(mut self, auto_fit: bool) -> Self {
        self.auto_fit = auto_fit;
        self
    }

    /// Serializes config to pretty JSON for debug/config files.
    pub fn to_json_pretty(&self) -> MapResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MapError::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Deserializes config from JSON.
    pub fn from_json_str(input: &str) -> MapResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| MapError::InvalidData(format!("failed to parse config: {e}")))
    }
}

fn default_backend() -> BackendKind {
    BackendKind::OpenTile
}

fn default_auto_fit() -> bool {
    true
}

//! Overlay configuration.

use serde::{Deserialize, Serialize};

/// Default name of the field that names an object's prototype.
pub const DEFAULT_TYPE_KEY: &str = "__type";

/// Options fixed when an overlay is constructed.
///
/// Every overlay carries its own copy, so differently configured overlays
/// coexist in one process. Missing fields take their defaults when the
/// configuration is deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Skip diagnostics that only help while developing, such as the
    /// warning for assigning one overlay into another.
    pub production: bool,
    /// Resolve getters and setters from registered prototypes.
    pub accessors: bool,
    /// Field of an object value naming its prototype.
    pub type_key: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            production: false,
            accessors: true,
            type_key: DEFAULT_TYPE_KEY.to_string(),
        }
    }
}

impl OverlayConfig {
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn accessors(mut self, accessors: bool) -> Self {
        self.accessors = accessors;
        self
    }

    pub fn type_key(mut self, type_key: impl Into<String>) -> Self {
        self.type_key = type_key.into();
        self
    }
}

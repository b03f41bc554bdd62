//! Model type configuration.
//!
//! A [`ModelConfig`] is the configuration object passed when declaring a model
//! type. Its only recognized option is `properties`, the defaults template.
//! Configurations can be built in code or parsed from JSON or TOML text:
//!
//! ```
//! use champ_core::ModelConfig;
//!
//! let config = ModelConfig::from_json_str(r#"{ "properties": { "title": "" } }"#)?;
//! assert!(config.properties.contains_key("title"));
//! # Ok::<(), champ_core::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigResult;
use crate::logging::targets;
use crate::model::PropertyMap;

/// Configuration for declaring a model type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Default property values copied into every new instance.
    pub properties: PropertyMap,
}

impl ModelConfig {
    /// Create an empty configuration (no default properties).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        tracing::debug!(target: targets::CONFIG, properties = config.properties.len(), "parsed JSON model config");
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    ///
    /// Defaults live in a `[properties]` table.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        tracing::debug!(target: targets::CONFIG, properties = config.properties.len(), "parsed TOML model config");
        Ok(config)
    }
}

impl From<PropertyMap> for ModelConfig {
    fn from(properties: PropertyMap) -> Self {
        Self { properties }
    }
}

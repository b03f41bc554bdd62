//! Registry of declared model types.
//!
//! A [`ModelRegistry`] maps type names to [`ModelType`]s so that models can be
//! declared in one place and instantiated by name elsewhere. Types declared
//! through a registry publish to the registry's publisher.
//!
//! ```
//! use champ_core::{ModelConfig, ModelRegistry};
//! use serde_json::json;
//!
//! let registry = ModelRegistry::new();
//! registry.declare("Todo", ModelConfig::new().with_property("done", false))?;
//!
//! let todo = registry.create("Todo", "todo-1")?;
//! assert_eq!(todo.get("done")?, json!(false));
//! # Ok::<(), champ_core::ModelError>(())
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bus::{EventBus, EventPublisher};
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult, Result};
use crate::logging::targets;
use crate::model::{Model, ModelType};

/// Thread-safe map from type name to declared [`ModelType`].
pub struct ModelRegistry {
    types: RwLock<HashMap<String, ModelType>>,
    publisher: Arc<dyn EventPublisher>,
}

impl ModelRegistry {
    /// Create a registry whose types publish to the global [`EventBus`].
    pub fn new() -> Self {
        Self::with_publisher(EventBus::global())
    }

    /// Create a registry whose types publish to `publisher`.
    pub fn with_publisher(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            publisher,
        }
    }

    /// Declare a model type and register it.
    ///
    /// Fails with [`ModelError::DuplicateType`] if the name is taken, or
    /// [`ModelError::InvalidTypeName`] if it is empty.
    pub fn declare(&self, name: impl Into<String>, config: ModelConfig) -> ModelResult<ModelType> {
        let model_type = ModelType::builder(name)
            .config(config)
            .publisher(self.publisher.clone())
            .build()?;
        self.register(model_type.clone())?;
        Ok(model_type)
    }

    /// Declare a model type from a JSON config document.
    ///
    /// Fails with [`Error::Config`](crate::Error::Config) if `text` is not a
    /// valid config, or [`Error::Model`](crate::Error::Model) if the
    /// declaration itself is rejected.
    pub fn declare_json(&self, name: impl Into<String>, text: &str) -> Result<ModelType> {
        let config = ModelConfig::from_json_str(text)?;
        Ok(self.declare(name, config)?)
    }

    /// Declare a model type from a TOML config document. Errors as for
    /// [`declare_json`](Self::declare_json).
    pub fn declare_toml(&self, name: impl Into<String>, text: &str) -> Result<ModelType> {
        let config = ModelConfig::from_toml_str(text)?;
        Ok(self.declare(name, config)?)
    }

    /// Register an already declared model type under its own name.
    pub fn register(&self, model_type: ModelType) -> ModelResult<()> {
        let mut types = self.types.write();
        if types.contains_key(model_type.name()) {
            return Err(ModelError::DuplicateType {
                name: model_type.name().to_string(),
            });
        }
        tracing::debug!(target: targets::REGISTRY, type_name = model_type.name(), "registered model type");
        types.insert(model_type.name().to_string(), model_type);
        Ok(())
    }

    /// Look up a model type by name.
    pub fn get(&self, name: &str) -> Option<ModelType> {
        self.types.read().get(name).cloned()
    }

    /// Create an instance of the named type.
    ///
    /// Fails with [`ModelError::UnknownType`] if no such type is registered.
    pub fn create(&self, type_name: &str, id: impl Into<String>) -> ModelResult<Model> {
        let model_type = self.get(type_name).ok_or_else(|| ModelError::UnknownType {
            name: type_name.to_string(),
        })?;
        Ok(model_type.create(id))
    }

    /// Whether a type with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Names of all registered types, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Remove every registered type. Existing instances keep working.
    pub fn clear(&self) {
        self.types.write().clear();
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("types", &self.type_names())
            .finish_non_exhaustive()
    }
}

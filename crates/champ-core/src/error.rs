//! Error types for Champ.

/// Errors raised by model types, model instances and the model registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A read asked for a property that is not in the instance's store.
    ///
    /// Raised for properties that were never written as well as for
    /// properties removed by [`Model::reset`](crate::Model::reset).
    #[error("Property doesn't exist: {name}")]
    PropertyNotFound {
        /// The name of the property that was requested.
        name: String,
    },

    /// A model type was declared with an empty name.
    #[error("Invalid model type name '{name}': type names must not be empty")]
    InvalidTypeName {
        /// The rejected name.
        name: String,
    },

    /// A registry already holds a model type with this name.
    #[error("Model type '{name}' is already declared")]
    DuplicateType {
        /// The name of the existing type.
        name: String,
    },

    /// A registry has no model type with this name.
    #[error("Model type '{name}' is not declared")]
    UnknownType {
        /// The requested type name.
        name: String,
    },
}

impl ModelError {
    /// Create a property-not-found error.
    pub fn property_not_found(name: impl Into<String>) -> Self {
        Self::PropertyNotFound { name: name.into() }
    }

    /// Returns `true` if this is a [`ModelError::PropertyNotFound`].
    pub fn is_property_not_found(&self) -> bool {
        matches!(self, Self::PropertyNotFound { .. })
    }
}

/// Errors raised while parsing a [`ModelConfig`](crate::ModelConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON text was malformed or had an unexpected shape.
    #[error("Invalid JSON model configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The TOML text was malformed or had an unexpected shape.
    #[error("Invalid TOML model configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// The main error type for Champ operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model-related error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result type for configuration parsing.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A specialized Result type for Champ operations.
pub type Result<T> = std::result::Result<T, Error>;

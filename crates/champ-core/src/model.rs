//! Observable models.
//!
//! A model is a named bag of properties with change notification. Model
//! *types* are declared once with a defaults template; each instance gets
//! its own copy of those defaults and an identity.
//!
//! # Key Types
//!
//! - [`ModelType`] - A declared model type: name, defaults template, publisher
//! - [`Model`] - A model instance with an id and a property store
//! - [`PropertyRequest`] - Argument of the unified [`Model::property`] entry point
//!
//! # Change Notification
//!
//! Every write that is not silent publishes a [`ChangeEvent`] on the channel
//! `<TypeName>:changed` once the value is stored. Batch writes publish one
//! event per entry, in the batch's order. [`Model::reset`] never publishes.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use champ_core::{EventBus, ModelType, PropertyRequest};
//! use serde_json::json;
//!
//! let bus = Arc::new(EventBus::new());
//! bus.subscribe("TestModel:changed", |event| {
//!     println!("{} is now {}", event.property, event.value);
//! });
//!
//! let test_model = ModelType::builder("TestModel")
//!     .property("testProp", "test")
//!     .publisher(bus.clone())
//!     .build()?;
//!
//! let model = test_model.create("testModel");
//! assert_eq!(model.property("testProp")?, Some(json!("test")));
//!
//! model.property(("testProp", "new value"))?;
//! model.property(PropertyRequest::write("quiet", 1).silent())?;
//!
//! model.reset();
//! assert!(model.property("quiet").is_err());
//! # Ok::<(), champ_core::ModelError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::bus::{ChangeEvent, EventBus, EventPublisher};
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::logging::targets;

/// Mapping from property name to value.
///
/// Iterates in insertion order, so a batch written from a map notifies in the
/// order its entries were inserted.
pub type PropertyMap = serde_json::Map<String, Value>;

/// Suffix appended to a type name to form its change channel.
pub const CHANGED_SUFFIX: &str = ":changed";

/// A request to [`Model::property`].
///
/// Requests are usually built with the constructor functions or converted
/// from the shorthand forms:
///
/// | Shorthand                      | Request                                  |
/// |--------------------------------|------------------------------------------|
/// | `"name"`                       | `Read`                                   |
/// | `("name", value)`              | `Write`                                  |
/// | `("name", value, true)`        | silent `Write`                           |
/// | `PropertyMap`                  | `BatchWrite`                             |
/// | `(PropertyMap, true)`          | silent `BatchWrite`                      |
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyRequest {
    /// Read the current value of a property.
    Read {
        /// Property name.
        name: String,
    },
    /// Write one property, creating it if needed.
    Write {
        /// Property name.
        name: String,
        /// New value.
        value: Value,
        /// Skip the change notification.
        silent: bool,
    },
    /// Write several properties in order.
    BatchWrite {
        /// `(name, value)` pairs, applied in order.
        entries: Vec<(String, Value)>,
        /// Skip every change notification in the batch.
        silent: bool,
    },
}

impl PropertyRequest {
    /// A read request.
    pub fn read(name: impl Into<String>) -> Self {
        Self::Read { name: name.into() }
    }

    /// A notifying write request.
    pub fn write(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Write {
            name: name.into(),
            value: value.into(),
            silent: false,
        }
    }

    /// A notifying batch write request.
    pub fn batch<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::BatchWrite {
            entries: entries
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
            silent: false,
        }
    }

    /// Make a write request silent. Reads are unaffected.
    pub fn silent(self) -> Self {
        self.with_silent(true)
    }

    /// Set the silent flag of a write request. Reads are unaffected.
    pub fn with_silent(self, silent: bool) -> Self {
        match self {
            Self::Write { name, value, .. } => Self::Write {
                name,
                value,
                silent,
            },
            Self::BatchWrite { entries, .. } => Self::BatchWrite { entries, silent },
            read => read,
        }
    }

    /// Whether this request writes.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Read { .. })
    }
}

impl From<&str> for PropertyRequest {
    fn from(name: &str) -> Self {
        Self::read(name)
    }
}

impl From<String> for PropertyRequest {
    fn from(name: String) -> Self {
        Self::read(name)
    }
}

impl<V: Into<Value>> From<(&str, V)> for PropertyRequest {
    fn from((name, value): (&str, V)) -> Self {
        Self::write(name, value)
    }
}

impl<V: Into<Value>> From<(&str, V, bool)> for PropertyRequest {
    fn from((name, value, silent): (&str, V, bool)) -> Self {
        Self::write(name, value).with_silent(silent)
    }
}

impl From<PropertyMap> for PropertyRequest {
    fn from(entries: PropertyMap) -> Self {
        Self::batch(entries)
    }
}

impl From<(PropertyMap, bool)> for PropertyRequest {
    fn from((entries, silent): (PropertyMap, bool)) -> Self {
        Self::batch(entries).with_silent(silent)
    }
}

struct ModelTypeInner {
    name: String,
    channel: String,
    defaults: PropertyMap,
    publisher: Arc<dyn EventPublisher>,
}

/// A declared model type.
///
/// Holds the type name, the immutable defaults template and the publisher
/// that instances send change notifications to. Cloning is cheap; clones
/// share the same declaration.
#[derive(Clone)]
pub struct ModelType {
    inner: Arc<ModelTypeInner>,
}

impl ModelType {
    /// Declare a model type that publishes to the global [`EventBus`].
    pub fn new(name: impl Into<String>, config: ModelConfig) -> ModelResult<Self> {
        Self::builder(name).config(config).build()
    }

    /// Start declaring a model type.
    pub fn builder(name: impl Into<String>) -> ModelTypeBuilder {
        ModelTypeBuilder::new(name)
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The channel change notifications are published on (`<name>:changed`).
    pub fn channel(&self) -> &str {
        &self.inner.channel
    }

    /// The defaults template.
    pub fn defaults(&self) -> &PropertyMap {
        &self.inner.defaults
    }

    /// Whether the defaults template contains `name`.
    pub fn has_default(&self, name: &str) -> bool {
        self.inner.defaults.contains_key(name)
    }

    /// The publisher instances of this type notify.
    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        &self.inner.publisher
    }

    /// Create an instance seeded with the defaults template.
    pub fn create(&self, id: impl Into<String>) -> Model {
        self.create_with(id, ModelOptions::default())
    }

    /// Create an instance with construction options.
    ///
    /// Option properties are written silently over the seeded defaults. They
    /// do not change the template, so [`Model::reset`] discards them.
    pub fn create_with(&self, id: impl Into<String>, options: ModelOptions) -> Model {
        let mut store = self.inner.defaults.clone();
        store.extend(options.properties);
        let model = Model {
            id: id.into(),
            model_type: self.clone(),
            store: RwLock::new(store),
        };
        tracing::trace!(target: targets::MODEL, type_name = self.name(), id = %model.id, "created model");
        model
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.inner.name)
            .field("defaults", &self.inner.defaults)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ModelType`].
pub struct ModelTypeBuilder {
    name: String,
    properties: PropertyMap,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl ModelTypeBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: PropertyMap::new(),
            publisher: None,
        }
    }

    /// Add a default property.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Add several default properties.
    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.properties.extend(
            properties
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    /// Add the defaults from a configuration object.
    pub fn config(self, config: ModelConfig) -> Self {
        self.properties(config.properties)
    }

    /// Publish change notifications to `publisher` instead of the global bus.
    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Finish the declaration.
    ///
    /// Fails with [`ModelError::InvalidTypeName`] when the name is empty.
    pub fn build(self) -> ModelResult<ModelType> {
        if self.name.trim().is_empty() {
            return Err(ModelError::InvalidTypeName { name: self.name });
        }

        let publisher = match self.publisher {
            Some(publisher) => publisher,
            None => EventBus::global(),
        };
        let channel = format!("{}{}", self.name, CHANGED_SUFFIX);
        tracing::debug!(
            target: targets::MODEL,
            type_name = %self.name,
            defaults = self.properties.len(),
            "declared model type"
        );

        Ok(ModelType {
            inner: Arc::new(ModelTypeInner {
                name: self.name,
                channel,
                defaults: self.properties,
                publisher,
            }),
        })
    }
}

/// Options for [`ModelType::create_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOptions {
    /// Initial values written over the defaults, without notification.
    pub properties: PropertyMap,
}

impl ModelOptions {
    /// Add an initial property value.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// A model instance.
///
/// The property store is private to the instance and only changes through
/// [`property`](Self::property) (and its shorthands) or [`reset`](Self::reset).
pub struct Model {
    id: String,
    model_type: ModelType,
    store: RwLock<PropertyMap>,
}

impl Model {
    /// The identity supplied at construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The name of this model's type.
    pub fn type_name(&self) -> &str {
        self.model_type.name()
    }

    /// This model's type.
    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    /// Read, write or batch-write properties.
    ///
    /// Reads return `Some(value)` and fail with
    /// [`ModelError::PropertyNotFound`] when the property is absent. Writes
    /// always succeed and return `None`.
    pub fn property(&self, request: impl Into<PropertyRequest>) -> ModelResult<Option<Value>> {
        match request.into() {
            PropertyRequest::Read { name } => self.read(&name).map(Some),
            PropertyRequest::Write {
                name,
                value,
                silent,
            } => {
                self.write(name, value, silent);
                Ok(None)
            }
            PropertyRequest::BatchWrite { entries, silent } => {
                self.write_batch(entries, silent);
                Ok(None)
            }
        }
    }

    /// Read a property.
    pub fn get(&self, name: &str) -> ModelResult<Value> {
        self.read(name)
    }

    /// Write a property and publish a change notification.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.write(name.into(), value.into(), false);
    }

    /// Write a property without notification.
    pub fn set_silent(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.write(name.into(), value.into(), true);
    }

    /// Write several properties in order, one notification each.
    pub fn set_many<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.write_batch(entries.into_iter().map(|(k, v)| (k.into(), v.into())), false);
    }

    /// Write several properties in order without notification.
    pub fn set_many_silent<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.write_batch(entries.into_iter().map(|(k, v)| (k.into(), v.into())), true);
    }

    /// Restore the store to a fresh copy of the type's defaults.
    ///
    /// Properties added since construction are removed. No notification is
    /// published.
    pub fn reset(&self) {
        *self.store.write() = self.model_type.defaults().clone();
        tracing::debug!(target: targets::MODEL, type_name = self.type_name(), id = %self.id, "reset model");
    }

    /// Whether the store currently contains `name`.
    pub fn has_property(&self, name: &str) -> bool {
        self.store.read().contains_key(name)
    }

    /// Names of all properties in the store, sorted.
    pub fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.store.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// A snapshot of the whole store.
    pub fn properties(&self) -> PropertyMap {
        self.store.read().clone()
    }

    /// Number of properties in the store.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    fn read(&self, name: &str) -> ModelResult<Value> {
        self.store
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::property_not_found(name))
    }

    fn write(&self, name: String, value: Value, silent: bool) {
        // The guard is a temporary, so the lock is released before publishing.
        self.store.write().insert(name.clone(), value.clone());
        tracing::trace!(target: targets::MODEL, id = %self.id, property = %name, silent, "wrote property");

        if !silent {
            self.model_type
                .publisher()
                .publish(self.model_type.channel(), ChangeEvent::new(name, value));
        }
    }

    fn write_batch<I>(&self, entries: I, silent: bool)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (name, value) in entries {
            self.write(name, value, silent);
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("type_name", &self.type_name())
            .field("properties", &*self.store.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, ChangeEvent)>>,
    }

    impl EventPublisher for Recorder {
        fn publish(&self, channel: &str, event: ChangeEvent) {
            self.events.lock().push((channel.to_string(), event));
        }
    }

    impl Recorder {
        fn take(&self) -> Vec<(String, ChangeEvent)> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    fn test_type() -> (ModelType, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let model_type = ModelType::builder("TestModel")
            .property("testProp", "test")
            .publisher(recorder.clone())
            .build()
            .unwrap();
        (model_type, recorder)
    }

    fn changed(property: &str, value: Value) -> (String, ChangeEvent) {
        ("TestModel:changed".to_string(), ChangeEvent::new(property, value))
    }

    #[test]
    fn test_declaration() {
        let (model_type, recorder) = test_type();
        assert_eq!(model_type.name(), "TestModel");
        assert_eq!(model_type.channel(), "TestModel:changed");
        assert!(model_type.has_default("testProp"));
        assert!(!model_type.has_default("newProp"));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_empty_type_name_rejected() {
        for name in ["", "   "] {
            let err = ModelType::builder(name).build().unwrap_err();
            assert_eq!(
                err,
                ModelError::InvalidTypeName {
                    name: name.to_string()
                }
            );
        }
    }

    #[test]
    fn test_create_seeds_defaults() {
        let (model_type, recorder) = test_type();
        let model = model_type.create("testModel");

        assert_eq!(model.id(), "testModel");
        assert_eq!(model.type_name(), "TestModel");
        assert_eq!(model.properties()["testProp"], json!("test"));
        assert_eq!(model.property("testProp").unwrap(), Some(json!("test")));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let (model_type, recorder) = test_type();
        let model = model_type.create("testModel");

        assert_eq!(model.property(("testProp", "new test value")).unwrap(), None);
        assert_eq!(model.get("testProp").unwrap(), json!("new test value"));
        assert_eq!(
            recorder.take(),
            vec![changed("testProp", json!("new test value"))]
        );
    }

    #[test]
    fn test_silent_write() {
        let (model_type, recorder) = test_type();
        let model = model_type.create("testModel");

        model.property(("testProp", "new test value", true)).unwrap();
        model.set_silent("newProp", "new value");

        assert_eq!(model.get("testProp").unwrap(), json!("new test value"));
        assert_eq!(model.get("newProp").unwrap(), json!("new value"));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_missing_property() {
        let (model_type, recorder) = test_type();
        let model = model_type.create("testModel");

        let err = model.property("doesntExist").unwrap_err();
        assert_eq!(err, ModelError::property_not_found("doesntExist"));
        assert!(!model.has_property("doesntExist"));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_write_creates_property() {
        let (model_type, recorder) = test_type();
        let model = model_type.create("testModel");

        model.set("newProp", "new value");
        assert_eq!(model.get("newProp").unwrap(), json!("new value"));
        assert_eq!(recorder.take(), vec![changed("newProp", json!("new value"))]);
        assert!(!model_type.has_default("newProp"));
    }

    #[test]
    fn test_batch_write_notifies_per_entry_in_order() {
        let (model_type, recorder) = test_type();
        let model = model_type.create("testModel");

        model
            .property(PropertyRequest::batch([
                ("testProp", "new value"),
                ("newProp", "also new value"),
            ]))
            .unwrap();

        assert_eq!(model.get("testProp").unwrap(), json!("new value"));
        assert_eq!(model.get("newProp").unwrap(), json!("also new value"));
        assert_eq!(
            recorder.take(),
            vec![
                changed("testProp", json!("new value")),
                changed("newProp", json!("also new value")),
            ]
        );
    }

    #[test]
    fn test_silent_batch_write() {
        let (model_type, recorder) = test_type();
        let model = model_type.create("testModel");

        let mut entries = PropertyMap::new();
        entries.insert("newProp".into(), json!("changed again"));
        model.property((entries, true)).unwrap();
        model.set_many_silent([("a", 1), ("b", 2)]);

        assert_eq!(model.get("newProp").unwrap(), json!("changed again"));
        assert_eq!(model.get("b").unwrap(), json!(2));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_reset() {
        let (model_type, recorder) = test_type();
        let model = model_type.create("testModel");

        model.set_many([("testProp", "a"), ("newProp", "b")]);
        recorder.take();
        model.reset();

        assert_eq!(model.get("testProp").unwrap(), json!("test"));
        assert!(model.get("newProp").unwrap_err().is_property_not_found());
        assert!(recorder.take().is_empty());

        model.set("testProp", "z");
        model.reset();
        model.reset();
        assert_eq!(model.properties(), *model_type.defaults());
    }

    #[test]
    fn test_instances_are_isolated() {
        let (model_type, _recorder) = test_type();
        let a = model_type.create("a");
        let b = model_type.create("b");

        a.set("testProp", "changed");
        a.set("extra", json!({ "nested": [1, 2] }));

        assert_eq!(b.get("testProp").unwrap(), json!("test"));
        assert!(!b.has_property("extra"));
        assert_eq!(model_type.create("c").get("testProp").unwrap(), json!("test"));
    }

    #[test]
    fn test_composite_defaults_are_copied() {
        let recorder = Arc::new(Recorder::default());
        let model_type = ModelType::builder("List")
            .property("items", json!(["a"]))
            .publisher(recorder)
            .build()
            .unwrap();

        let a = model_type.create("a");
        let mut items = a.get("items").unwrap();
        if let Some(array) = items.as_array_mut() {
            array.push(json!("b"));
        }
        a.set("items", items);

        assert_eq!(a.get("items").unwrap(), json!(["a", "b"]));
        assert_eq!(model_type.defaults()["items"], json!(["a"]));
        assert_eq!(model_type.create("b").get("items").unwrap(), json!(["a"]));
    }

    #[test]
    fn test_create_with_options() {
        let (model_type, recorder) = test_type();
        let model = model_type.create_with(
            "testModel",
            ModelOptions::default().with_property("testProp", "custom"),
        );

        assert_eq!(model.get("testProp").unwrap(), json!("custom"));
        assert!(recorder.take().is_empty());

        model.reset();
        assert_eq!(model.get("testProp").unwrap(), json!("test"));
    }

    #[test]
    fn test_introspection() {
        let (model_type, _recorder) = test_type();
        let model = model_type.create("testModel");
        model.set_silent("alpha", 1);

        assert_eq!(model.property_names(), vec!["alpha", "testProp"]);
        assert_eq!(model.len(), 2);
        assert!(!model.is_empty());
        assert!(model_type.create("empty").len() == 1);
    }

    #[test]
    fn test_request_shorthands() {
        assert_eq!(PropertyRequest::from("p"), PropertyRequest::read("p"));
        assert_eq!(
            PropertyRequest::from(("p", 1)),
            PropertyRequest::Write {
                name: "p".into(),
                value: json!(1),
                silent: false
            }
        );
        assert_eq!(
            PropertyRequest::from(("p", 1, true)),
            PropertyRequest::write("p", 1).silent()
        );
        assert_eq!(PropertyRequest::read("p").silent(), PropertyRequest::read("p"));
        assert!(!PropertyRequest::read("p").is_write());
        assert!(PropertyRequest::batch([("p", 1)]).is_write());
    }

    #[test]
    fn test_listener_can_read_model_during_notification() {
        let bus = Arc::new(EventBus::new());
        let model_type = ModelType::builder("Reentrant")
            .property("count", 0)
            .publisher(bus.clone())
            .build()
            .unwrap();
        let model = Arc::new(model_type.create("r"));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let model_clone = model.clone();
        let seen_clone = seen.clone();
        bus.subscribe("Reentrant:changed", move |event| {
            let current = model_clone.get(&event.property).unwrap();
            seen_clone.lock().push(current);
        });

        model.set_many([("count", 1), ("count", 2)]);
        assert_eq!(*seen.lock(), vec![json!(1), json!(2)]);
    }
}

//! Core systems for Champ.
//!
//! This crate provides the data layer of the Champ component framework:
//!
//! - **Models**: Named model types with a defaults template, instantiated
//!   with an identity, read and written through a single entry point
//! - **Change Notification**: Every non-silent write publishes a
//!   `{ property, value }` event on `<TypeName>:changed`
//! - **Event Bus**: Channel-keyed broadcast bus built on the signal/slot system
//! - **Signal/Slot System**: Type-safe synchronous notification
//! - **Registry**: Declare model types once, instantiate them by name
//!
//! # Model Example
//!
//! ```
//! use std::sync::Arc;
//! use champ_core::{EventBus, ModelType};
//! use serde_json::json;
//!
//! let bus = Arc::new(EventBus::new());
//! bus.subscribe("TestModel:changed", |event| {
//!     println!("{} changed to {}", event.property, event.value);
//! });
//!
//! let test_model = ModelType::builder("TestModel")
//!     .property("testProp", "test")
//!     .publisher(bus)
//!     .build()?;
//!
//! let model = test_model.create("testModel");
//! model.set("testProp", "new value");
//! assert_eq!(model.get("testProp")?, json!("new value"));
//!
//! model.reset();
//! assert_eq!(model.get("testProp")?, json!("test"));
//! # Ok::<(), champ_core::ModelError>(())
//! ```
//!
//! # Signal/Slot Example
//!
//! ```
//! use champ_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod bus;
mod config;
mod error;
pub mod logging;
pub mod model;
mod registry;
pub mod signal;

pub use bus::{ChangeEvent, EventBus, EventPublisher, Subscription};
pub use config::ModelConfig;
pub use error::{ConfigError, ConfigResult, Error, ModelError, ModelResult, Result};
pub use model::{
    Model, ModelOptions, ModelType, ModelTypeBuilder, PropertyMap, PropertyRequest,
    CHANGED_SUFFIX,
};
pub use registry::ModelRegistry;
pub use signal::{ConnectionId, Signal};

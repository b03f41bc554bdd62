//! Channel-keyed event bus for model change notifications.
//!
//! Models publish a [`ChangeEvent`] on the channel `<TypeName>:changed` every
//! time a property is written (unless the write is silent). Models only see
//! the [`EventPublisher`] trait, so tests and applications can substitute
//! their own publisher; [`EventBus`] is the standard implementation, with one
//! [`Signal`] per channel.
//!
//! # Example
//!
//! ```
//! use champ_core::{ChangeEvent, EventBus, EventPublisher};
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//! let sub = bus.subscribe("Todo:changed", |event| {
//!     println!("{} -> {}", event.property, event.value);
//! });
//!
//! bus.publish("Todo:changed", ChangeEvent::new("title", json!("Buy milk")));
//! bus.unsubscribe(&sub);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging::targets;
use crate::signal::{ConnectionId, Signal};

/// Payload of a change notification: the written property and its new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Name of the property that was written.
    pub property: String,
    /// The value that was just written.
    pub value: Value,
}

impl ChangeEvent {
    /// Create a change event.
    pub fn new(property: impl Into<String>, value: Value) -> Self {
        Self {
            property: property.into(),
            value,
        }
    }
}

/// Something that change notifications can be published to.
///
/// Publishing is fire-and-forget: implementations deliver synchronously to
/// whoever is listening on `channel` and report nothing back.
pub trait EventPublisher: Send + Sync {
    /// Publish `event` on `channel`.
    fn publish(&self, channel: &str, event: ChangeEvent);
}

/// Handle for a listener registered with [`EventBus::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    channel: String,
    id: ConnectionId,
}

impl Subscription {
    /// The channel this subscription listens on.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// A broadcast bus with named channels.
///
/// Listeners on a channel are invoked synchronously, in subscription order,
/// on the thread that publishes.
#[derive(Default)]
pub struct EventBus {
    channels: RwLock<HashMap<String, Arc<Signal<ChangeEvent>>>>,
}

/// Process-wide bus (lazily created).
static GLOBAL_BUS: Mutex<Option<Arc<EventBus>>> = Mutex::new(None);

impl EventBus {
    /// Create a bus with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the process-wide bus, creating it on first use.
    ///
    /// Model types declared without an explicit publisher publish here.
    pub fn global() -> Arc<EventBus> {
        GLOBAL_BUS
            .lock()
            .get_or_insert_with(|| Arc::new(EventBus::new()))
            .clone()
    }

    /// Register a listener on `channel`.
    pub fn subscribe<F>(&self, channel: &str, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        // Connect under the channel lock so a concurrent unsubscribe cannot
        // drop the channel between lookup and connect.
        let mut channels = self.channels.write();
        let id = channels
            .entry(channel.to_string())
            .or_default()
            .connect(listener);
        drop(channels);
        tracing::trace!(target: targets::BUS, channel, "listener subscribed");
        Subscription {
            channel: channel.to_string(),
            id,
        }
    }

    /// Remove a listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut channels = self.channels.write();
        let Some(signal) = channels.get(&subscription.channel) else {
            return false;
        };
        let removed = signal.disconnect(subscription.id);
        if signal.connection_count() == 0 {
            channels.remove(&subscription.channel);
        }
        removed
    }

    /// Publish `event` on `channel`. Same as [`EventPublisher::publish`].
    pub fn trigger(&self, channel: &str, event: ChangeEvent) {
        self.publish(channel, event);
    }

    /// Number of listeners currently subscribed to `channel`.
    pub fn listener_count(&self, channel: &str) -> usize {
        self.channels
            .read()
            .get(channel)
            .map_or(0, |signal| signal.connection_count())
    }

    /// Names of all channels that have at least one listener.
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every listener on every channel.
    ///
    /// Events already being delivered when this is called stop reaching the
    /// dropped listeners.
    pub fn clear(&self) {
        let mut channels = self.channels.write();
        for signal in channels.values() {
            signal.disconnect_all();
        }
        channels.clear();
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, channel: &str, event: ChangeEvent) {
        // Clone the signal out so listeners run without the channel lock held.
        let signal = self.channels.read().get(channel).cloned();
        match signal {
            Some(signal) => {
                let delivered = signal.emit(event);
                tracing::trace!(target: targets::BUS, channel, delivered, "published event");
            }
            None => {
                tracing::trace!(target: targets::BUS, channel, "no listeners for event");
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels())
            .finish()
    }
}

//! Signal/slot primitive used by the event bus.
//!
//! A [`Signal<Args>`] holds any number of connected slots (closures). Emitting
//! the signal invokes every slot synchronously, on the emitting thread, in the
//! order the slots were connected.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal itself
//! - [`ConnectionId`] - Returned when connecting a slot, used to disconnect it
//!
//! # Example
//!
//! ```
//! use champ_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//!
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! text_changed.emit("Hello, World!".to_string());
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is disconnected or the signal
    /// is dropped.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Connection storage. `order` keeps connection order stable across
/// disconnects, since slot indices are reused by the slot map.
struct Connections<Args> {
    slots: SlotMap<ConnectionId, Slot<Args>>,
    order: Vec<ConnectionId>,
}

impl<Args> Connections<Args> {
    fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    fn snapshot(&self) -> Vec<Slot<Args>> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(*id).cloned())
            .collect()
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(String, i32)` for multiple arguments.
///
/// # Re-entrancy
///
/// Slots are invoked after the connection lock is released, so a slot may
/// connect or disconnect slots on the same signal, or emit it again. Changes
/// made during an emission take effect from the next emission.
pub struct Signal<Args> {
    connections: Mutex<Connections<Args>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Connections::new()),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// ```
    /// use champ_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let slot: Slot<Args> = Arc::new(slot);
        let mut connections = self.connections.lock();
        let id = connections.slots.insert(slot);
        connections.order.push(id);
        id
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock();
        if connections.slots.remove(id).is_some() {
            connections.order.retain(|existing| *existing != id);
            true
        } else {
            false
        }
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        let mut connections = self.connections.lock();
        connections.slots.clear();
        connections.order.clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Emit the signal, invoking all connected slots in connection order.
    ///
    /// Returns the number of slots invoked.
    #[tracing::instrument(skip_all, target = "champ_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> usize {
        let slots = self.connections.lock().snapshot();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in &slots {
            slot(&args);
        }
        slots.len()
    }
}

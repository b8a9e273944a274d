//! Store events
//!
//! Listeners are called synchronously after a mutation has been persisted,
//! in registration order.

use parking_lot::RwLock;
use serde_json::Value;

/// A committed mutation
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A key was inserted or overwritten
    Set { key: String, value: Value },

    /// A key was removed (only emitted when it existed)
    Remove { key: String },

    /// A key was rewritten through `update`
    Update { key: String, value: Value },

    /// Every entry was removed
    Clear,

    /// A batch of keys was overlaid onto the state
    Merge { keys: Vec<String> },
}

type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

/// Registered event listeners
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.listeners.write().push(Box::new(listener));
    }

    /// Deliver an event to every listener
    pub fn emit(&self, event: &StoreEvent) {
        for listener in self.listeners.read().iter() {
            listener(event);
        }
    }
}

//! Engine event relay.
//!
//! The engine emits discrete events (frame arrived, status changed) which the
//! façade relays to its subscribers without transformation, in the order the
//! engine delivered them. The relay is an explicit channel mechanism: each
//! subscriber gets its own receiver, and a dropped receiver is pruned on the
//! next broadcast.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::RwLock;

/// A discrete event emitted by the capture engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// New frames are available up to (and including) this index
    FrameArrived { index: u64 },
    /// Engine status string changed
    StatusChanged { status: String },
}

/// Broadcast relay from the engine to façade subscribers.
pub struct EventRelay {
    subscribers: RwLock<Vec<Sender<EngineEvent>>>,
}

impl EventRelay {
    /// Create a relay with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to engine events. Events broadcast after this call are
    /// delivered to the returned receiver in broadcast order.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (tx, rx) = channel();
        self.subscribers.write().unwrap().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber, pruning dropped ones.
    pub fn broadcast(&self, event: EngineEvent) {
        let mut subscribers = self.subscribers.write().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers at the last broadcast.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap().len()
    }
}

impl Default for EventRelay {
    fn default() -> Self {
        Self::new()
    }
}

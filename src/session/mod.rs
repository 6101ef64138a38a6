//! Session client façade.
//!
//! Bridges compiled filters and frame requests to the external capture
//! engine: named filter slots, frame windows, scoped reader/writer handles,
//! and the engine event relay.
//!
//! The façade is generic over the engine rather than boxing it: a session
//! talks to exactly one engine, and static dispatch keeps the frame-window
//! path free of vtable overhead.

pub mod engine;
pub mod events;
pub mod handle;

pub use engine::{CaptureEngine, RawFrame, NULL_HANDLE};
pub use events::{EngineEvent, EventRelay};
pub use handle::{HandleKind, SourceHandle};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::filter::compile;
use crate::frame::Frame;
use crate::token::TokenTable;

/// Client-side session against one capture engine.
///
/// Owns the named filter slots, the token table, and the event relay. Filter
/// slot numbers come from a sequential pool that never reuses or frees a
/// number; installation under a given id is last-write-wins.
pub struct SessionClient<E: CaptureEngine> {
    engine: Arc<E>,
    tokens: TokenTable,
    filter_slots: RwLock<HashMap<String, u32>>,
    next_slot: AtomicU32,
    events: EventRelay,
}

impl<E: CaptureEngine + 'static> SessionClient<E> {
    /// Create a session over the given engine.
    pub fn new(engine: Arc<E>) -> Self {
        let tokens = TokenTable::new(engine.clone());
        Self {
            engine,
            tokens,
            filter_slots: RwLock::new(HashMap::new()),
            next_slot: AtomicU32::new(0),
            events: EventRelay::new(),
        }
    }

    /// The session's token table.
    pub fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    /// Compile `expression` and install it in the engine under `id`.
    ///
    /// An empty expression installs a match-all predicate. The first
    /// installation under a new id allocates the next sequential slot;
    /// later installations under the same id replace the predicate in that
    /// slot, atomically from the caller's point of view.
    pub fn set_filter(&self, id: &str, expression: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::InvalidArgument("empty filter id".to_string()));
        }

        let filter = compile(expression)?;
        let slot = self.slot_for(id);
        tracing::debug!(id, slot, "installing filter");
        self.engine.install_filter(slot, &filter);
        Ok(())
    }

    /// Resolve a filter id to its slot, allocating on first sight.
    fn slot_for(&self, id: &str) -> u32 {
        {
            let slots = self.filter_slots.read().unwrap();
            if let Some(&slot) = slots.get(id) {
                return slot;
            }
        }
        let mut slots = self.filter_slots.write().unwrap();
        *slots
            .entry(id.to_string())
            .or_insert_with(|| self.next_slot.fetch_add(1, Ordering::Relaxed))
    }

    /// Fetch the frames in `[start, end)`, without building their trees.
    pub fn frames(&self, start: u64, end: u64) -> Vec<Frame> {
        self.engine
            .frames(start, end)
            .into_iter()
            .map(wrap_frame)
            .collect()
    }

    /// Fetch the frames in `[start, end)` matching the filter installed
    /// under `id`. Fails if no filter was ever installed under `id`.
    pub fn filtered_frames(&self, id: &str, start: u64, end: u64) -> Result<Vec<Frame>> {
        let slot = {
            let slots = self.filter_slots.read().unwrap();
            slots.get(id).copied()
        };
        let slot = slot
            .ok_or_else(|| Error::InvalidArgument(format!("no filter installed under `{id}`")))?;
        Ok(self
            .engine
            .filtered_frames(slot, start, end)
            .into_iter()
            .map(wrap_frame)
            .collect())
    }

    /// Open a scoped reader handle for a registered source id.
    pub fn create_reader(&self, id: &str, arg: &str) -> Result<SourceHandle<E>> {
        let raw = self.engine.open_reader(id, arg);
        if raw == NULL_HANDLE {
            return Err(Error::UnregisteredSource { id: id.to_string() });
        }
        Ok(SourceHandle::new(self.engine.clone(), raw, HandleKind::Reader))
    }

    /// Open a scoped writer handle for a registered source id.
    pub fn create_writer(&self, id: &str, arg: &str) -> Result<SourceHandle<E>> {
        let raw = self.engine.open_writer(id, arg);
        if raw == NULL_HANDLE {
            return Err(Error::UnregisteredSource { id: id.to_string() });
        }
        Ok(SourceHandle::new(self.engine.clone(), raw, HandleKind::Writer))
    }

    /// Subscribe to engine events relayed through this session.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Deliver an engine event to all subscribers, in arrival order.
    ///
    /// Called by the engine integration when the engine emits an event;
    /// delivery is synchronous relative to this call.
    pub fn deliver(&self, event: EngineEvent) {
        self.events.broadcast(event);
    }

    /// Release the engine-side session. Safe to call with reader/writer
    /// handles still open; the façade does not track their releases.
    pub fn close(&self) {
        tracing::debug!("closing engine session");
        self.engine.close();
    }
}

fn wrap_frame(raw: RawFrame) -> Frame {
    Frame::new(raw.index, raw.nodes, raw.child_counts)
}

impl<E: CaptureEngine> std::fmt::Debug for SessionClient<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("filters", &self.filter_slots.read().unwrap().len())
            .field("tokens", &self.tokens)
            .finish()
    }
}

//! Scoped reader/writer handles.
//!
//! Handles are the only cancellable resources in this layer: releasing the
//! handle closes it through the engine. Release is idempotent (a second
//! release is a no-op) and never panics, and also runs on drop so the handle
//! is closed on every exit path.

use std::sync::Arc;

use super::engine::CaptureEngine;

/// Which engine endpoint a handle was opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Reader,
    Writer,
}

/// A scoped engine resource. Closed explicitly via [`SourceHandle::release`]
/// or implicitly on drop, whichever comes first.
pub struct SourceHandle<E: CaptureEngine> {
    engine: Arc<E>,
    raw: u64,
    kind: HandleKind,
    released: bool,
}

impl<E: CaptureEngine> SourceHandle<E> {
    pub(crate) fn new(engine: Arc<E>, raw: u64, kind: HandleKind) -> Self {
        Self {
            engine,
            raw,
            kind,
            released: false,
        }
    }

    /// The raw engine handle value.
    pub fn raw(&self) -> u64 {
        self.raw
    }

    /// Reader or writer.
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Whether this handle has been released.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Close the handle through the engine. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        tracing::debug!(handle = self.raw, kind = ?self.kind, "released handle");
        match self.kind {
            HandleKind::Reader => self.engine.close_reader(self.raw),
            HandleKind::Writer => self.engine.close_writer(self.raw),
        }
    }
}

impl<E: CaptureEngine> Drop for SourceHandle<E> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<E: CaptureEngine> std::fmt::Debug for SourceHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceHandle")
            .field("raw", &self.raw)
            .field("kind", &self.kind)
            .field("released", &self.released)
            .finish()
    }
}

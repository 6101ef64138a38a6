//! Capture engine seam.
//!
//! The native capture engine is an external collaborator: it assigns tokens,
//! evaluates installed filters, dissects frames, and owns reader/writer
//! handles. This module defines the client-side contract for talking to it.

use crate::filter::CompiledFilter;
use crate::frame::LayerRecord;
use crate::token::TokenAuthority;

/// Engine handle value meaning "unknown source id".
pub const NULL_HANDLE: u64 = 0;

/// A raw frame record as returned by the engine: the flat layer stream,
/// not yet reconstructed into a tree.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Frame index assigned by the engine
    pub index: u64,
    /// Flat layer records in stream order
    pub nodes: Vec<LayerRecord>,
    /// Direct-child count per record, parallel to `nodes`
    pub child_counts: Vec<u32>,
}

/// Consumed capabilities of the external capture engine.
///
/// The engine also acts as the token authority, so every implementation
/// carries [`TokenAuthority`] as a supertrait. All methods are expected to
/// complete synchronously relative to the call that triggered them.
pub trait CaptureEngine: TokenAuthority {
    /// Install a compiled predicate under a numeric filter slot.
    /// Installation is last-write-wins per slot.
    fn install_filter(&self, slot: u32, filter: &CompiledFilter);

    /// Fetch the raw frame records in `[start, end)`.
    fn frames(&self, start: u64, end: u64) -> Vec<RawFrame>;

    /// Fetch the raw frame records in `[start, end)` that matched the
    /// predicate installed under `slot`.
    fn filtered_frames(&self, slot: u32, start: u64, end: u64) -> Vec<RawFrame>;

    /// Open a reader handle. Returns [`NULL_HANDLE`] for an unknown id.
    fn open_reader(&self, id: &str, arg: &str) -> u64;

    /// Open a writer handle. Returns [`NULL_HANDLE`] for an unknown id.
    fn open_writer(&self, id: &str, arg: &str) -> u64;

    /// Close a reader handle. Must tolerate handles that are already gone.
    fn close_reader(&self, handle: u64);

    /// Close a writer handle. Must tolerate handles that are already gone.
    fn close_writer(&self, handle: u64);

    /// Release the engine-side session.
    fn close(&self);
}

//! Frame layer trees.
//!
//! The engine returns a frame's protocol dissection as a flat stream: a list
//! of layer records plus a parallel list of child counts. Each count states
//! how many of the immediately following records are that record's *direct*
//! children; the children appear as a contiguous block, before any of their
//! own descendants. [`build_layer_tree`] rebuilds the nested tree from that
//! stream, and [`Frame`] memoizes the result so the tree is built at most
//! once per frame.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::token::Token;

/// One flat layer record as delivered by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRecord {
    /// Interned protocol/layer name token
    pub id: Token,
    /// Raw bytes covered by this layer
    pub data: Bytes,
}

impl LayerRecord {
    /// Create a record with no payload.
    pub fn new(id: Token) -> Self {
        Self {
            id,
            data: Bytes::new(),
        }
    }

    /// Create a record with a payload.
    pub fn with_data(id: Token, data: Bytes) -> Self {
        Self { id, data }
    }
}

/// One node of a frame's reconstructed protocol-layer tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Interned protocol/layer name token
    pub id: Token,
    /// Raw bytes covered by this layer
    pub data: Bytes,
    /// Nested layers, in stream order
    pub children: Vec<Layer>,
}

impl Layer {
    /// Total number of layers in this subtree, including self.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Layer::len).sum::<usize>()
    }

    /// Always false: a layer tree contains at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Depth-first search for the first layer with the given token.
    pub fn find(&self, id: Token) -> Option<&Layer> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// Rebuild a nested layer tree from the flat record stream.
///
/// `nodes` and `child_counts` are consumed strictly in lockstep from the
/// front. The stream must describe exactly one rooted tree: a count that
/// runs the cursor past the end, a length mismatch between the two inputs,
/// or leftover records after the root subtree completes all fail with
/// [`Error::MalformedFrameData`].
pub fn build_layer_tree(nodes: Vec<LayerRecord>, child_counts: Vec<u32>) -> Result<Layer> {
    if nodes.len() != child_counts.len() {
        return Err(Error::malformed(format!(
            "{} layer records but {} child counts",
            nodes.len(),
            child_counts.len()
        )));
    }

    let mut nodes: VecDeque<LayerRecord> = nodes.into();
    let mut counts: VecDeque<u32> = child_counts.into();

    let record = nodes
        .pop_front()
        .ok_or_else(|| Error::malformed("empty layer stream"))?;
    let count = counts
        .pop_front()
        .ok_or_else(|| Error::malformed("empty child count stream"))?;

    let children = take_children(&mut nodes, &mut counts, count)?;

    if !nodes.is_empty() || !counts.is_empty() {
        return Err(Error::malformed(format!(
            "{} layer records left after the root subtree",
            nodes.len().max(counts.len())
        )));
    }

    Ok(Layer {
        id: record.id,
        data: record.data,
        children,
    })
}

/// Pop `count` direct-child records off the queue fronts, then attach each
/// child's own subtree in declared order.
fn take_children(
    nodes: &mut VecDeque<LayerRecord>,
    counts: &mut VecDeque<u32>,
    count: u32,
) -> Result<Vec<Layer>> {
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let record = nodes
            .pop_front()
            .ok_or_else(|| Error::malformed("child count overruns layer stream"))?;
        let child_count = counts
            .pop_front()
            .ok_or_else(|| Error::malformed("child count overruns count stream"))?;
        records.push((record, child_count));
    }

    let mut layers = Vec::with_capacity(records.len());
    for (record, child_count) in records {
        let children = take_children(nodes, counts, child_count)?;
        layers.push(Layer {
            id: record.id,
            data: record.data,
            children,
        });
    }
    Ok(layers)
}

/// One captured frame: its index, the raw flat layer stream, and the lazily
/// built, cached layer tree.
///
/// The tree is a pure function of the immutable stream, built at most once;
/// a failed build caches nothing so no partial tree is ever observed.
pub struct Frame {
    index: u64,
    nodes: Vec<LayerRecord>,
    child_counts: Vec<u32>,
    root: RwLock<Option<Arc<Layer>>>,
}

impl Frame {
    /// Wrap a raw frame record. The tree is not built until [`Frame::root`]
    /// is first called.
    pub fn new(index: u64, nodes: Vec<LayerRecord>, child_counts: Vec<u32>) -> Self {
        Self {
            index,
            nodes,
            child_counts,
            root: RwLock::new(None),
        }
    }

    /// Frame index as assigned by the engine.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The raw flat layer stream as delivered by the engine.
    pub fn records(&self) -> &[LayerRecord] {
        &self.nodes
    }

    /// The reconstructed root layer, built on first access and cached.
    pub fn root(&self) -> Result<Arc<Layer>> {
        {
            let cached = self.root.read().unwrap();
            if let Some(layer) = cached.as_ref() {
                return Ok(layer.clone());
            }
        }

        let layer = Arc::new(build_layer_tree(
            self.nodes.clone(),
            self.child_counts.clone(),
        )?);

        let mut cached = self.root.write().unwrap();
        // A racing builder may have filled the cache; keep the first result.
        Ok(cached.get_or_insert_with(|| layer).clone())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("layers", &self.nodes.len())
            .field("built", &self.root.read().unwrap().is_some())
            .finish()
    }
}

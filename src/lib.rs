//! # capquery
//!
//! Client-side query layer for an external packet capture/dissection engine.
//!
//! capquery sits between an interactive UI and a native capture engine. It
//! interns human-readable protocol/attribute names into the compact integer
//! tokens the engine speaks, compiles user-typed filter/macro expressions
//! into an annotated syntax tree the engine can evaluate, and rebuilds the
//! nested protocol-layer tree of a captured frame from the flat stream the
//! engine returns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use capquery::prelude::*;
//! use std::sync::Arc;
//!
//! # struct NullEngine;
//! # impl TokenAuthority for NullEngine {
//! #     fn intern(&self, _: &str) -> u32 { 1 }
//! #     fn resolve(&self, _: u32) -> String { String::new() }
//! # }
//! # impl CaptureEngine for NullEngine {
//! #     fn install_filter(&self, _: u32, _: &CompiledFilter) {}
//! #     fn frames(&self, _: u64, _: u64) -> Vec<capquery::RawFrame> { vec![] }
//! #     fn filtered_frames(&self, _: u32, _: u64, _: u64) -> Vec<capquery::RawFrame> { vec![] }
//! #     fn open_reader(&self, _: &str, _: &str) -> u64 { 0 }
//! #     fn open_writer(&self, _: &str, _: &str) -> u64 { 0 }
//! #     fn close_reader(&self, _: u64) {}
//! #     fn close_writer(&self, _: u64) {}
//! #     fn close(&self) {}
//! # }
//! let session = SessionClient::new(Arc::new(NullEngine));
//!
//! // Compile and install a display filter
//! session.set_filter("main", "tcp.port == 443 && !@local").unwrap();
//!
//! // Fetch a window of frames; layer trees build lazily on first access
//! for frame in session.filtered_frames("main", 0, 100).unwrap() {
//!     let root = frame.root().unwrap();
//!     println!("frame {}: {}", frame.index(), session.tokens().string(root.id));
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +------------------------------------------------------------------+
//! |                           capquery                               |
//! +------------------------------------------------------------------+
//! |  token/    - Token, TokenAuthority, bidirectional TokenTable     |
//! |  filter/   - FilterExpr AST, nom parser, CompiledFilter          |
//! |  frame/    - LayerRecord, Layer, tree reconstruction, Frame      |
//! |  session/  - CaptureEngine seam, SessionClient façade,           |
//! |              event relay, scoped reader/writer handles           |
//! |  error/    - Error types                                         |
//! +------------------------------------------------------------------+
//! ```
//!
//! The capture engine itself (dissection, live I/O, filter evaluation) is
//! out of scope: the [`session::CaptureEngine`] trait is the seam.

pub mod error;
pub mod filter;
pub mod frame;
pub mod prelude;
pub mod session;
pub mod token;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, FilterError, Result};
pub use filter::{compile, parse_filter, CompiledFilter, FilterExpr, PipelineStage};
pub use frame::{build_layer_tree, Frame, Layer, LayerRecord};
pub use session::{
    CaptureEngine, EngineEvent, HandleKind, RawFrame, SessionClient, SourceHandle, NULL_HANDLE,
};
pub use token::{Token, TokenAuthority, TokenTable};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Convenient re-exports for common usage.
//!
//! # Example
//!
//! ```rust,no_run
//! use capquery::prelude::*;
//! ```

// Token types
pub use crate::token::{Token, TokenAuthority, TokenTable};

// Filter types
pub use crate::filter::{compile, parse_filter, CompiledFilter, FilterExpr, PipelineStage};

// Frame types
pub use crate::frame::{build_layer_tree, Frame, Layer, LayerRecord};

// Session types
pub use crate::session::{CaptureEngine, EngineEvent, SessionClient, SourceHandle};

// Error types
pub use crate::error::{Error, FilterError, Result};

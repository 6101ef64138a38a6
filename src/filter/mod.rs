//! Filter expression compilation.
//!
//! User-typed filter/macro expressions are compiled into an annotated AST
//! the capture engine evaluates against captured frames. The grammar layers
//! three constructs over a baseline expression grammar: `@name` macro
//! references, dotted attribute paths, and function pipelines. See
//! [`parser`] for the grammar and [`ast`] for the node types.

pub mod ast;
pub mod parser;

pub use ast::{BinaryOp, FilterExpr, Literal, PipelineStage, UnaryOp};
pub use parser::parse_filter;

use crate::error::FilterError;

/// A compiled filter predicate, ready for installation in the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledFilter {
    /// Matches every frame (an empty expression compiles to this)
    MatchAll,
    /// Evaluate the expression against each frame
    Expr(FilterExpr),
}

impl CompiledFilter {
    /// Returns true if this filter matches every frame.
    pub fn is_match_all(&self) -> bool {
        matches!(self, CompiledFilter::MatchAll)
    }
}

/// Compile a filter expression.
///
/// An empty (or whitespace-only) expression compiles to
/// [`CompiledFilter::MatchAll`]; anything else must parse.
pub fn compile(expression: &str) -> Result<CompiledFilter, FilterError> {
    if expression.trim().is_empty() {
        return Ok(CompiledFilter::MatchAll);
    }
    parse_filter(expression).map(CompiledFilter::Expr)
}

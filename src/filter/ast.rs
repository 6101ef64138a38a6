//! AST types for filter expressions.

use smallvec::SmallVec;

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT (`!`)
    Not,
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Logical OR (`||`)
    Or,
    /// Logical AND (`&&`)
    And,
    /// Equality (`==`)
    Eq,
    /// Inequality (`!=`)
    Ne,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Le,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Ge,
}

/// Literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Integer literal
    Int(i64),
    /// Double-quoted string literal
    String(String),
    /// Boolean literal
    Bool(bool),
}

/// One post-processing stage attached to an attribute reference.
///
/// `args` holds zero or more argument expressions. A stage written without
/// `:`-arguments carries an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStage {
    pub name: String,
    pub args: SmallVec<[FilterExpr; 2]>,
}

impl PipelineStage {
    /// Create a stage with no arguments.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: SmallVec::new(),
        }
    }
}

/// A node of the compiled filter AST.
///
/// The extended constructs of the query grammar are first-class variants
/// rather than tags on a generic node: `Macro` for `@name` references and
/// `Attr` for dotted attribute paths with an optional pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Literal value
    Literal(Literal),

    /// Ordinary identifier (capitalized or otherwise not matching the
    /// attribute-path pattern)
    Ident(String),

    /// Base-grammar member access on a non-attribute expression,
    /// e.g. `Frame.length`
    Member {
        object: Box<FilterExpr>,
        property: String,
    },

    /// Macro reference: `@name`
    Macro { name: String },

    /// Attribute-path reference: a dotted lowercase identifier such as
    /// `tcp.port.src`, optionally followed by a function pipeline.
    ///
    /// `pipeline` is `None` when no stage follows the path - distinct from
    /// `Some(vec![])`, which downstream consumers may treat differently.
    Attr {
        name: String,
        pipeline: Option<Vec<PipelineStage>>,
    },

    /// Unary operation
    Unary {
        op: UnaryOp,
        operand: Box<FilterExpr>,
    },

    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
}

impl FilterExpr {
    /// Create an attribute-path node with no pipeline.
    pub fn attr(name: impl Into<String>) -> Self {
        FilterExpr::Attr {
            name: name.into(),
            pipeline: None,
        }
    }

    /// Create a macro reference node.
    pub fn macro_ref(name: impl Into<String>) -> Self {
        FilterExpr::Macro { name: name.into() }
    }

    /// Create a NOT expression.
    pub fn negate(operand: FilterExpr) -> Self {
        FilterExpr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    /// Create a binary expression.
    pub fn binary(op: BinaryOp, left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create an AND expression.
    pub fn and(left: FilterExpr, right: FilterExpr) -> Self {
        Self::binary(BinaryOp::And, left, right)
    }

    /// Create an OR expression.
    pub fn or(left: FilterExpr, right: FilterExpr) -> Self {
        Self::binary(BinaryOp::Or, left, right)
    }
}

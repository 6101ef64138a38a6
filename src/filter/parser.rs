//! Filter expression parser using nom.
//!
//! Grammar (operator precedence: `!` > comparison > `&&` > `||`):
//! ```text
//! filter     = expr
//! expr       = and_expr ("||" and_expr)*
//! and_expr   = cmp_expr ("&&" cmp_expr)*
//! cmp_expr   = unary (("==" | "!=" | "<=" | ">=" | "<" | ">") unary)?
//! unary      = "!" unary | primary
//! primary    = "(" expr ")" | string | integer | macro | name
//! ```
//!
//! Three constructs extend the baseline grammar:
//!
//! - `@name` - a macro reference, scanned as a single token (the name is the
//!   run of non-whitespace characters after the marker)
//! - lowercase-leading identifiers greedily absorb `.segment` suffixes into
//!   one attribute path (`tcp.port.src` is a single node); other identifiers
//!   get ordinary member access
//! - an attribute path may be followed by a pipeline of bare words, the last
//!   of which may take `:`-prefixed argument expressions
//!
//! Pipeline argument expressions are parsed with the baseline grammar only,
//! so an argument can never swallow a following stage word.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    sequence::{delimited, pair, preceded},
    IResult,
};
use smallvec::SmallVec;

use super::ast::{BinaryOp, FilterExpr, Literal, PipelineStage};
use crate::error::FilterError;

/// Parse a complete filter expression.
pub fn parse_filter(input: &str) -> Result<FilterExpr, FilterError> {
    if input.trim().is_empty() {
        return Err(FilterError::EmptyFilter);
    }

    match all_consuming(delimited(multispace0, expr, multispace0))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = input.len() - e.input.len();
            let near: String = e.input.chars().take(20).collect();
            Err(FilterError::syntax(
                position,
                format!("unexpected input near `{near}`"),
            ))
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(FilterError::syntax(input.len(), "unexpected end of input"))
        }
    }
}

/// Parse an expression with the extended grammar (pipelines enabled).
fn expr(input: &str) -> IResult<&str, FilterExpr> {
    or_level(input, true)
}

/// Parse a pipeline-stage argument with the baseline grammar only.
fn arg_expr(input: &str) -> IResult<&str, FilterExpr> {
    or_level(input, false)
}

// =============================================================================
// Expression Parsers (handle operator precedence)
// =============================================================================

/// OR level - lowest precedence.
fn or_level(input: &str, pipelines: bool) -> IResult<&str, FilterExpr> {
    let (mut rest, mut acc) = and_level(input, pipelines)?;
    loop {
        let op: IResult<&str, &str> = delimited(multispace0, tag("||"), multispace0)(rest);
        match op {
            Ok((after_op, _)) => {
                let (after_rhs, rhs) = and_level(after_op, pipelines)?;
                acc = FilterExpr::or(acc, rhs);
                rest = after_rhs;
            }
            Err(_) => break,
        }
    }
    Ok((rest, acc))
}

/// AND level.
fn and_level(input: &str, pipelines: bool) -> IResult<&str, FilterExpr> {
    let (mut rest, mut acc) = cmp_level(input, pipelines)?;
    loop {
        let op: IResult<&str, &str> = delimited(multispace0, tag("&&"), multispace0)(rest);
        match op {
            Ok((after_op, _)) => {
                let (after_rhs, rhs) = cmp_level(after_op, pipelines)?;
                acc = FilterExpr::and(acc, rhs);
                rest = after_rhs;
            }
            Err(_) => break,
        }
    }
    Ok((rest, acc))
}

/// Comparison level (non-associative).
fn cmp_level(input: &str, pipelines: bool) -> IResult<&str, FilterExpr> {
    let (rest, left) = unary_level(input, pipelines)?;
    let op: IResult<&str, BinaryOp> = delimited(multispace0, cmp_op, multispace0)(rest);
    match op {
        Ok((after_op, op)) => {
            let (after_rhs, right) = unary_level(after_op, pipelines)?;
            Ok((after_rhs, FilterExpr::binary(op, left, right)))
        }
        Err(_) => Ok((rest, left)),
    }
}

fn cmp_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Lt, tag("<")),
        value(BinaryOp::Gt, tag(">")),
    ))(input)
}

/// Unary NOT level.
fn unary_level(input: &str, pipelines: bool) -> IResult<&str, FilterExpr> {
    let not: IResult<&str, char> = char('!')(input);
    if let Ok((rest, _)) = not {
        let (rest, _) = multispace0(rest)?;
        let (rest, operand) = unary_level(rest, pipelines)?;
        return Ok((rest, FilterExpr::negate(operand)));
    }
    primary(input, pipelines)
}

/// Primary expression.
fn primary(input: &str, pipelines: bool) -> IResult<&str, FilterExpr> {
    alt((
        |i| paren_expr(i, pipelines),
        string_literal,
        int_literal,
        macro_ref,
        |i| name_expr(i, pipelines),
    ))(input)
}

fn paren_expr(input: &str, pipelines: bool) -> IResult<&str, FilterExpr> {
    delimited(
        pair(char('('), multispace0),
        |i| or_level(i, pipelines),
        pair(multispace0, char(')')),
    )(input)
}

// =============================================================================
// Literals
// =============================================================================

fn string_literal(input: &str) -> IResult<&str, FilterExpr> {
    map(
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        |s: &str| FilterExpr::Literal(Literal::String(s.to_string())),
    )(input)
}

fn int_literal(input: &str) -> IResult<&str, FilterExpr> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i64>()
            .map(|v| FilterExpr::Literal(Literal::Int(v)))
    })(input)
}

// =============================================================================
// Extended Constructs
// =============================================================================

/// Macro reference: `@` followed by a run of non-whitespace characters,
/// consumed as a single token at the scanner level.
fn macro_ref(input: &str) -> IResult<&str, FilterExpr> {
    map(
        preceded(char('@'), take_while1(|c: char| !c.is_whitespace())),
        FilterExpr::macro_ref,
    )(input)
}

/// Identifier: `[A-Za-z_$][A-Za-z0-9_$]*`.
fn identifier(input: &str) -> IResult<&str, &str> {
    match input.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Alpha,
            )))
        }
    }
    let end = input[1..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .map(|i| i + 1)
        .unwrap_or(input.len());
    Ok((&input[end..], &input[..end]))
}

/// `.segment` suffix of a dotted name. No whitespace around the dot.
fn dotted_suffix(input: &str) -> IResult<&str, &str> {
    preceded(char('.'), identifier)(input)
}

/// Identifier-shaped primary: keyword literal, attribute path, or ordinary
/// identifier with base-grammar member access.
fn name_expr(input: &str, pipelines: bool) -> IResult<&str, FilterExpr> {
    let (rest, first) = identifier(input)?;

    // Reserved words of the baseline grammar are never attribute paths.
    if first == "true" || first == "false" {
        return Ok((rest, FilterExpr::Literal(Literal::Bool(first == "true"))));
    }

    let leading = first.as_bytes()[0];
    if leading.is_ascii_lowercase() || leading == b'_' || leading == b'$' {
        // Attribute path: greedily absorb dotted segments into one name.
        let mut name = String::from(first);
        let mut rest = rest;
        while let Ok((after, segment)) = dotted_suffix(rest) {
            name.push('.');
            name.push_str(segment);
            rest = after;
        }
        let (rest, pipeline) = if pipelines {
            pipeline_stages(rest)?
        } else {
            (rest, None)
        };
        return Ok((rest, FilterExpr::Attr { name, pipeline }));
    }

    // Anything else keeps ordinary member-access parsing.
    let mut node = FilterExpr::Ident(first.to_string());
    let mut rest = rest;
    while let Ok((after, property)) = dotted_suffix(rest) {
        node = FilterExpr::Member {
            object: Box::new(node),
            property: property.to_string(),
        };
        rest = after;
    }
    Ok((rest, node))
}

// =============================================================================
// Pipelines
// =============================================================================

/// True if the next token (after whitespace) is another bare word.
fn next_is_bare_word(input: &str) -> bool {
    preceded(multispace1::<&str, nom::error::Error<&str>>, identifier)(input).is_ok()
}

/// Parse the pipeline stages following an attribute path.
///
/// Returns `None` when no stage is found, so "no pipeline" stays distinct
/// from "empty pipeline".
fn pipeline_stages(input: &str) -> IResult<&str, Option<Vec<PipelineStage>>> {
    let mut stages = Vec::new();
    let mut rest = input;
    loop {
        let word: IResult<&str, &str> = preceded(multispace1, identifier)(rest);
        match word {
            Ok((after_word, name)) => {
                // A stage immediately followed by another bare word takes no
                // arguments; only a trailing stage may carry `:args`.
                let (after_args, args) = if next_is_bare_word(after_word) {
                    (after_word, SmallVec::new())
                } else {
                    stage_args(after_word)?
                };
                stages.push(PipelineStage {
                    name: name.to_string(),
                    args,
                });
                rest = after_args;
            }
            Err(_) => break,
        }
    }
    if stages.is_empty() {
        Ok((rest, None))
    } else {
        Ok((rest, Some(stages)))
    }
}

/// `:`-prefixed argument expressions of a pipeline stage.
fn stage_args(input: &str) -> IResult<&str, SmallVec<[FilterExpr; 2]>> {
    let mut args = SmallVec::new();
    let mut rest = input;
    loop {
        let arg: IResult<&str, FilterExpr> =
            preceded(pair(char(':'), multispace0), arg_expr)(rest);
        match arg {
            Ok((after, expr)) => {
                args.push(expr);
                rest = after;
            }
            Err(_) => break,
        }
    }
    Ok((rest, args))
}

// =============================================================================
// Tests
// =============================================================================

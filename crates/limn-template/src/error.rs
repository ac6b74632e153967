/*
 * error.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Error types for template parsing, evaluation, and rendering.

use thiserror::Error;

/// Errors that can occur during template operations.
///
/// With `Config::throw_on_error` left off (the default), the entry points
/// swallow these and degrade to empty output / a null value; the taxonomy
/// below only reaches callers who opted in to strict error propagation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// Malformed expression syntax.
    #[error("expression parse error at byte {offset}: expected {expected}")]
    ExprParse { offset: usize, expected: String },

    /// Malformed template syntax (bad delimiter, bad block header).
    #[error("template syntax error at byte {offset}: {message}")]
    TemplateSyntax { offset: usize, message: String },

    /// A block piece that is illegal where it appears, such as an `else`
    /// outside of a conditional.
    #[error("misplaced {{% {keyword} %}} block")]
    MisplacedBlock { keyword: String },

    /// A block was still open when the template ended.
    #[error("unterminated block at end of template")]
    UnterminatedBlock,

    /// Error evaluating an expression (member access on a non-container,
    /// `contains` on an unsupported operand, helper invocation failure).
    #[error("evaluation error: {message}")]
    Evaluation { message: String },

    /// Helper or filter name not present in the merged registry.
    #[error("unknown helper or filter: {name}")]
    UnknownHelper { name: String },

    /// A `for` loop collection did not evaluate to a list.
    #[error("for loop collection is not a list: {value}")]
    NotIterable { value: String },
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

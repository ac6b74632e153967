/*
 * lib.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! A Liquid-flavored template and expression engine.
//!
//! Templates mix raw text with three kinds of markup:
//!
//! - `{{ expr }}` interpolates an expression, optionally piped through
//!   filters: `{{ fuel | at_least: 0 }}`
//! - `{% if %}` / `{% unless %}` / `{% elsif %}` / `{% else %}`,
//!   `{% for item in list %}`, and `{% assign name = expr %}` blocks, each
//!   closed by `{% end %}` (or `endif`/`endunless`/`endfor`)
//! - `{{-` / `-}}` and `{%-` / `-%}` trim whitespace from the adjacent raw
//!   text
//!
//! Expressions support boolean, numeric, and string literals, identifiers
//! with `.` member access, helper calls, and the operators `not`, `and`,
//! `or`, `contains`, comparisons (loose `==` and strict `===`), and
//! arithmetic. Evaluation is lenient by default: missing names read as null,
//! failures render as nothing, and comparisons against falsy operands yield
//! null rather than a boolean. `Config::throw_on_error` makes failures
//! propagate instead.
//!
//! ```
//! use limn_template::{parse_and_render, Config, Environment};
//!
//! let mut env = Environment::new();
//! env.insert("name", "World");
//! let out = parse_and_render(
//!     "Hello, {{ name }}!{% if name == 'World' %} Again.{% end %}",
//!     &env,
//!     &Config::new(),
//! )
//! .unwrap();
//! assert_eq!(out, "Hello, World! Again.");
//! ```
//!
//! Compile once with [`Template::compile`] to render the same template
//! against many environments.

pub mod ast;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod expression;
mod helpers;
mod lexer;
pub mod parser;
pub mod render;
pub mod value;

pub use ast::{BinaryOp, ExprNode, Filter, TemplateNode, UnaryOp};
pub use config::{Config, Helper};
pub use error::{TemplateError, TemplateResult};
pub use evaluator::evaluate;
pub use expression::parse_expression;
pub use parser::Template;
pub use value::{Environment, Value};

/// Parse and render a template in one call.
///
/// Returns an empty string on any failure unless `throw_on_error` is set.
pub fn parse_and_render(
    source: &str,
    env: &Environment,
    config: &Config,
) -> TemplateResult<String> {
    let result = Template::compile(source).and_then(|template| template.render(env, config));
    match result {
        Ok(out) => Ok(out),
        Err(err) if config.throw_on_error => Err(err),
        Err(_) => Ok(String::new()),
    }
}

/// Parse and evaluate a standalone expression in one call.
///
/// Returns `Value::Null` on any failure unless `throw_on_error` is set.
pub fn parse_and_evaluate(
    source: &str,
    env: &Environment,
    config: &Config,
) -> TemplateResult<Value> {
    let result =
        parse_expression(source).and_then(|expr| evaluator::evaluate(&expr, env, config));
    match result {
        Ok(value) => Ok(value),
        Err(err) if config.throw_on_error => Err(err),
        Err(_) => Ok(Value::Null),
    }
}

/*
 * render.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Template rendering.
//!
//! The renderer walks the compiled tree and threads an [`Environment`]
//! left-to-right through sibling nodes: `assign` yields an updated
//! environment for the siblings after it, while entering a conditional or
//! loop body hands the body a scoped copy that is discarded when the block
//! ends. The caller's environment is never mutated.

use tracing::{debug, trace};

use crate::ast::TemplateNode;
use crate::config::Config;
use crate::error::{TemplateError, TemplateResult};
use crate::evaluator::{call_helper, dispatch};
use crate::parser::Template;
use crate::value::{Environment, Value};

impl Template {
    /// Render the template against an environment.
    pub fn render(&self, env: &Environment, config: &Config) -> TemplateResult<String> {
        let mut out = String::new();
        render_children(&self.nodes, env.clone(), config, &mut out)?;
        Ok(out)
    }
}

/// Render a sibling sequence, returning the environment as of its end so a
/// parent can continue with any `assign`s the sequence made.
fn render_children(
    nodes: &[TemplateNode],
    mut env: Environment,
    config: &Config,
    out: &mut String,
) -> TemplateResult<Environment> {
    for node in nodes {
        if config.verbose {
            debug!(?node, "rendering");
        } else {
            trace!(?node, "rendering");
        }
        match node {
            TemplateNode::Raw(text) => out.push_str(text),

            TemplateNode::Assign { item, expr } => {
                let value = dispatch(expr, &env, config)?;
                env = env.with(item.clone(), value);
            }

            TemplateNode::Interpolation { expr, filters } => {
                let mut value = dispatch(expr, &env, config)?;
                for filter in filters {
                    let mut args = vec![value];
                    for arg in &filter.args {
                        args.push(dispatch(arg, &env, config)?);
                    }
                    value = match call_helper(&filter.name, &args, config) {
                        Ok(value) => value,
                        Err(err) if config.throw_on_error => return Err(err),
                        Err(_) => Value::Null,
                    };
                }
                out.push_str(&interpolation_text(&value, config));
            }

            TemplateNode::Cond {
                condition,
                negate,
                children,
                else_branch,
            } => {
                let value = dispatch(condition, &env, config)?;
                if config.truthy(&value) != *negate {
                    render_children(children, env.clone(), config, out)?;
                } else if let Some(branch) = else_branch {
                    render_children(std::slice::from_ref(branch.as_ref()), env.clone(), config, out)?;
                }
            }

            TemplateNode::Else { children } => {
                render_children(children, env.clone(), config, out)?;
            }

            TemplateNode::For {
                item,
                collection,
                children,
            } => {
                let value = dispatch(collection, &env, config)?;
                match value {
                    Value::List(items) => {
                        for element in items {
                            let scope = env.with(item.clone(), element);
                            render_children(children, scope, config, out)?;
                        }
                    }
                    other if config.throw_on_error => {
                        return Err(TemplateError::NotIterable {
                            value: other.to_text(),
                        });
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(env)
}

/// What an interpolated value prints as. Booleans always print; NaN and
/// falsy values print nothing.
fn interpolation_text(value: &Value, config: &Config) -> String {
    match value {
        Value::Num(n) if n.is_nan() => String::new(),
        Value::Bool(_) => value.to_text(),
        _ if config.truthy(value) => value.to_text(),
        _ => String::new(),
    }
}

/*
 * evaluator.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Expression evaluation.
//!
//! Evaluation is total by default: [`evaluate`] degrades any failure (unknown
//! helper, bad member access, helper error) to `Null`, so a template renders
//! best-effort output from partial data. `Config::throw_on_error` switches to
//! propagating the failure instead.
//!
//! Comparisons are three-valued. When either side of an ordering operator is
//! falsy the comparison yields `Null` rather than a boolean, which in turn
//! renders as nothing and reads as falsy in a condition.

use tracing::{debug, trace};

use crate::ast::{BinaryOp, ExprNode, UnaryOp};
use crate::config::Config;
use crate::error::{TemplateError, TemplateResult};
use crate::helpers::{add_values, call_builtin};
use crate::value::{Environment, Value};

/// Evaluate an expression against an environment.
///
/// Returns `Ok(Value::Null)` on failure unless `throw_on_error` is set.
pub fn evaluate(expr: &ExprNode, env: &Environment, config: &Config) -> TemplateResult<Value> {
    match eval_expr(expr, env, config) {
        Ok(value) => {
            if config.verbose {
                debug!(?expr, ?value, "evaluated");
            } else {
                trace!(?expr, ?value, "evaluated");
            }
            Ok(value)
        }
        Err(err) if config.throw_on_error => Err(err),
        Err(err) => {
            if config.verbose {
                debug!(?expr, %err, "evaluation degraded to null");
            } else {
                trace!(?expr, %err, "evaluation degraded to null");
            }
            Ok(Value::Null)
        }
    }
}

/// Evaluate through the configured evaluator override, if any.
///
/// The renderer routes every expression through here so that a sandboxed or
/// instrumented evaluator sees all of them.
pub(crate) fn dispatch(
    expr: &ExprNode,
    env: &Environment,
    config: &Config,
) -> TemplateResult<Value> {
    match &config.evaluate {
        Some(f) => f(expr, env, config),
        None => evaluate(expr, env, config),
    }
}

/// Resolve a helper by name and invoke it. Caller-registered helpers shadow
/// built-ins.
pub(crate) fn call_helper(
    name: &str,
    args: &[Value],
    config: &Config,
) -> TemplateResult<Value> {
    if let Some(helper) = config.helpers.get(name) {
        return helper(args);
    }
    if let Some(result) = call_builtin(name, args) {
        return result;
    }
    Err(TemplateError::UnknownHelper {
        name: name.to_string(),
    })
}

fn eval_expr(expr: &ExprNode, env: &Environment, config: &Config) -> TemplateResult<Value> {
    match expr {
        ExprNode::Bool(b) => Ok(Value::Bool(*b)),
        ExprNode::Num(n) => Ok(Value::Num(*n)),
        ExprNode::Str(s) => Ok(Value::Str(s.clone())),
        ExprNode::Id(name) => Ok(env.get(name).cloned().unwrap_or(Value::Null)),
        ExprNode::Member(base, key) => {
            let base = eval_expr(base, env, config)?;
            eval_member(&base, key)
        }
        ExprNode::Helper(name, args) => {
            let args = args
                .iter()
                .map(|arg| eval_expr(arg, env, config))
                .collect::<TemplateResult<Vec<Value>>>()?;
            call_helper(name, &args, config)
        }
        ExprNode::Unary(op, operand) => {
            let operand = eval_expr(operand, env, config)?;
            Ok(match op {
                UnaryOp::Neg => Value::Num(-operand.as_number()),
                // `not` is value-propagating like `and`/`or`: a falsy operand
                // passes through unchanged instead of becoming `true`
                UnaryOp::Not => {
                    if config.truthy(&operand) {
                        Value::Bool(false)
                    } else {
                        operand
                    }
                }
            })
        }
        ExprNode::Binary(op, left, right) => eval_binary(*op, left, right, env, config),
    }
}

fn eval_member(base: &Value, key: &str) -> TemplateResult<Value> {
    match base {
        Value::Map(_) => Ok(base.get(key).cloned().unwrap_or(Value::Null)),
        Value::List(items) => Ok(if key == "length" {
            Value::Num(items.len() as f64)
        } else {
            Value::Null
        }),
        other => Err(TemplateError::Evaluation {
            message: format!("cannot read member `{key}` of {other:?}"),
        }),
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &ExprNode,
    right: &ExprNode,
    env: &Environment,
    config: &Config,
) -> TemplateResult<Value> {
    // Short-circuit forms propagate their operand values untouched.
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        let left = eval_expr(left, env, config)?;
        let take_right = match op {
            BinaryOp::And => config.truthy(&left),
            _ => !config.truthy(&left),
        };
        return if take_right {
            eval_expr(right, env, config)
        } else {
            Ok(left)
        };
    }

    let left = eval_expr(left, env, config)?;
    let right = eval_expr(right, env, config)?;

    let result = match op {
        BinaryOp::Caret => Value::Num((left.to_int32() ^ right.to_int32()) as f64),
        BinaryOp::Mul => Value::Num(left.as_number() * right.as_number()),
        BinaryOp::Div => Value::Num(left.as_number() / right.as_number()),
        BinaryOp::Add => add_values(&left, &right),
        BinaryOp::Sub => Value::Num(left.as_number() - right.as_number()),
        BinaryOp::Eq => Value::Bool(left.loose_eq(&right)),
        BinaryOp::Ne => Value::Bool(!left.loose_eq(&right)),
        BinaryOp::StrictEq => Value::Bool(left == right),
        BinaryOp::StrictNe => Value::Bool(left != right),
        BinaryOp::Le | BinaryOp::Lt | BinaryOp::Ge | BinaryOp::Gt => {
            compare(op, &left, &right, config)
        }
        BinaryOp::Contains => contains(&left, &right)?,
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    };
    Ok(result)
}

/// Ordering with the three-valued guard: a falsy operand makes the whole
/// comparison `Null` instead of a boolean.
fn compare(op: BinaryOp, left: &Value, right: &Value, config: &Config) -> Value {
    if !config.truthy(left) || !config.truthy(right) {
        return Value::Null;
    }
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return Value::Bool(match op {
            BinaryOp::Le => a <= b,
            BinaryOp::Lt => a < b,
            BinaryOp::Ge => a >= b,
            _ => a > b,
        });
    }
    let (a, b) = (left.as_number(), right.as_number());
    // NaN fails every ordering
    Value::Bool(match op {
        BinaryOp::Le => a <= b,
        BinaryOp::Lt => a < b,
        BinaryOp::Ge => a >= b,
        _ => a > b,
    })
}

/// `contains`: substring test for strings, strict membership for lists.
fn contains(left: &Value, right: &Value) -> TemplateResult<Value> {
    match left {
        // an absent needle matches nothing; the empty string still matches
        // everywhere, since Null's canonical text would also be ""
        Value::Str(_) if *right == Value::Null => Ok(Value::Bool(false)),
        Value::Str(s) => Ok(Value::Bool(s.contains(&right.to_text()))),
        Value::List(items) => Ok(Value::Bool(items.iter().any(|item| item == right))),
        other => Err(TemplateError::Evaluation {
            message: format!("`contains` needs a string or list, got {other:?}"),
        }),
    }
}

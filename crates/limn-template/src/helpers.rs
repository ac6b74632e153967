/*
 * helpers.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Built-in helpers and filters.
//!
//! Each helper takes positional [`Value`] arguments and returns a value;
//! arguments beyond those supplied read as `Null`. Caller-registered helpers
//! of the same name shadow these (see `Config::with_helper`).

use crate::error::TemplateResult;
use crate::value::Value;

const NULL: Value = Value::Null;

fn arg<'a>(args: &'a [Value], index: usize) -> &'a Value {
    args.get(index).unwrap_or(&NULL)
}

/// NaN-propagating maximum: unlike `f64::max`, a NaN operand wins.
fn numeric_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
}

fn numeric_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) }
}

/// `+` semantics shared by the binary operator and the `append` filter:
/// string concatenation when either operand is textual by nature, numeric
/// addition otherwise.
pub(crate) fn add_values(left: &Value, right: &Value) -> Value {
    let textual = |v: &Value| matches!(v, Value::Str(_) | Value::List(_) | Value::Map(_));
    if textual(left) || textual(right) {
        Value::Str(format!("{}{}", left.to_text(), right.to_text()))
    } else {
        Value::Num(left.as_number() + right.as_number())
    }
}

/// `default` replaces its input when the input would not normally render
/// anything meaningful: falsy values, the empty string, and the empty list.
fn is_defaultable(value: &Value) -> bool {
    !value.is_truthy()
        || matches!(value, Value::Str(s) if s.is_empty())
        || matches!(value, Value::List(items) if items.is_empty())
}

/// Invoke a built-in helper. `None` when no built-in has this name.
pub(crate) fn call_builtin(name: &str, args: &[Value]) -> Option<TemplateResult<Value>> {
    let result = match name {
        "if" | "cond" => {
            if arg(args, 0).is_truthy() {
                arg(args, 1).clone()
            } else {
                arg(args, 2).clone()
            }
        }
        "abs" => Value::Num(arg(args, 0).as_number().abs()),
        "ceil" => Value::Num(arg(args, 0).as_number().ceil()),
        "floor" => Value::Num(arg(args, 0).as_number().floor()),
        "append" => add_values(arg(args, 0), arg(args, 1)),
        "at_least" => Value::Num(numeric_max(
            arg(args, 0).as_number(),
            arg(args, 1).as_number(),
        )),
        "at_most" => Value::Num(numeric_min(
            arg(args, 0).as_number(),
            arg(args, 1).as_number(),
        )),
        // upper bound applies first, so the lower bound wins if they cross
        "clamp" => {
            let capped = numeric_min(arg(args, 0).as_number(), arg(args, 2).as_number());
            Value::Num(numeric_max(capped, arg(args, 1).as_number()))
        }
        "upcase" | "upper" => Value::Str(arg(args, 0).to_text().to_uppercase()),
        "downcase" | "lower" => Value::Str(arg(args, 0).to_text().to_lowercase()),
        "default" => {
            let value = arg(args, 0);
            if is_defaultable(value) {
                arg(args, 1).clone()
            } else {
                value.clone()
            }
        }
        "stringify" => {
            Value::Str(serde_json::to_string(arg(args, 0)).unwrap_or_default())
        }
        _ => return None,
    };
    Some(Ok(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: &[Value]) -> Value {
        call_builtin(name, args)
            .unwrap_or_else(|| panic!("no builtin named {name}"))
            .expect("builtin should succeed")
    }

    #[test]
    fn test_if_uses_builtin_truthiness() {
        let then = Value::from("yes");
        let otherwise = Value::from("no");
        assert_eq!(
            call("if", &[Value::Num(0.0), then.clone(), otherwise.clone()]),
            then
        );
        assert_eq!(call("if", &[Value::Null, then, otherwise.clone()]), otherwise);
        // missing branch reads as Null
        assert_eq!(call("cond", &[Value::Bool(false), Value::from("x")]), Value::Null);
    }

    #[test]
    fn test_numeric_helpers() {
        assert_eq!(call("abs", &[Value::Num(-4.0)]), Value::Num(4.0));
        assert_eq!(call("ceil", &[Value::from("2.1")]), Value::Num(3.0));
        assert_eq!(call("floor", &[Value::Num(2.9)]), Value::Num(2.0));
        assert_eq!(
            call("at_least", &[Value::Num(4.0), Value::Num(5.0)]),
            Value::Num(5.0)
        );
        assert_eq!(
            call("at_most", &[Value::Num(4.0), Value::Num(5.0)]),
            Value::Num(4.0)
        );
        assert_eq!(
            call("clamp", &[Value::Num(12.0), Value::Num(0.0), Value::Num(10.0)]),
            Value::Num(10.0)
        );
    }

    #[test]
    fn test_min_max_propagate_nan() {
        let Value::Num(n) = call("at_least", &[Value::Null, Value::Num(5.0)]) else {
            panic!("expected a number");
        };
        assert!(n.is_nan());
    }

    #[test]
    fn test_append_matches_plus() {
        assert_eq!(
            call("append", &[Value::from("fuel: "), Value::Num(85.0)]),
            Value::from("fuel: 85")
        );
        assert_eq!(
            call("append", &[Value::Num(2.0), Value::Num(3.0)]),
            Value::Num(5.0)
        );
    }

    #[test]
    fn test_case_helpers() {
        assert_eq!(call("upcase", &[Value::from("Trip")]), Value::from("TRIP"));
        assert_eq!(call("lower", &[Value::from("Trip")]), Value::from("trip"));
        assert_eq!(call("upper", &[Value::Num(1.5)]), Value::from("1.5"));
    }

    #[test]
    fn test_default() {
        let fallback = Value::from(42.0);
        assert_eq!(call("default", &[Value::Null, fallback.clone()]), fallback);
        assert_eq!(
            call("default", &[Value::from(""), fallback.clone()]),
            fallback
        );
        assert_eq!(
            call("default", &[Value::List(vec![]), fallback.clone()]),
            fallback
        );
        assert_eq!(
            call("default", &[Value::Bool(false), fallback.clone()]),
            fallback
        );
        // zero is truthy, so it is kept
        assert_eq!(call("default", &[Value::Num(0.0), fallback]), Value::Num(0.0));
    }

    #[test]
    fn test_stringify() {
        assert_eq!(call("stringify", &[Value::from("a")]), Value::from("\"a\""));
        assert_eq!(
            call("stringify", &[Value::List(vec![Value::Num(1.0), Value::Null])]),
            Value::from("[1,null]")
        );
        assert_eq!(call("stringify", &[Value::Num(f64::NAN)]), Value::from("null"));
    }

    #[test]
    fn test_unknown_name() {
        assert!(call_builtin("reverse", &[]).is_none());
    }
}

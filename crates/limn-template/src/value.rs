/*
 * value.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Dynamic values and environments.
//!
//! All runtime data flowing through the evaluator and renderer is a [`Value`]:
//! a closed tagged union with explicit per-variant coercion rules instead of
//! ambient dynamic typing. [`Environment`] is the name→value mapping supplied
//! by the caller; "assignment" always produces a new environment, the caller's
//! map is never mutated in place.

use std::collections::{BTreeMap, HashMap};

use serde::de::Deserializer;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{TemplateError, TemplateResult};

/// A dynamic value used in expression evaluation and template rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean value.
    Bool(bool),

    /// A number. Integer literals are stored as floats.
    Num(f64),

    /// A string value.
    Str(String),

    /// An ordered sequence of values.
    List(Vec<Value>),

    /// A mapping of string keys to values. Keys are kept sorted so the
    /// canonical textual encoding is stable across runs.
    Map(BTreeMap<String, Value>),

    /// A null or absent value. Missing environment keys, missing members,
    /// and silently-degraded evaluation failures all surface as `Null`.
    Null,
}

impl Value {
    /// Default truthiness predicate (overridable through `Config`).
    ///
    /// `true`, every string (the empty string included), every number except
    /// NaN (`0` included, an explicit exception to the usual convention), and
    /// every list or map are truthy. `false`, `Null`, and NaN are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Num(n) => !n.is_nan(),
            Value::Str(_) => true,
            Value::List(_) | Value::Map(_) => true,
            Value::Null => false,
        }
    }

    /// Canonical textual form, used for rendered output and string
    /// concatenation.
    ///
    /// Lists join their members' text with `,` so the empty list prints
    /// nothing; maps print their JSON encoding with keys in sorted order;
    /// `Null` prints nothing.
    pub fn to_text(&self) -> String {
        match self {
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Num(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => serde_json::to_string(self).unwrap_or_default(),
            Value::Null => String::new(),
        }
    }

    /// Numeric coercion.
    ///
    /// Strings parse as floats (blank strings read as zero), booleans read
    /// as 0/1, everything else is NaN.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Num(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::Str(s) => str_to_number(s),
            Value::List(_) | Value::Map(_) | Value::Null => f64::NAN,
        }
    }

    /// 32-bit integer representation, used by the `^` operator.
    pub fn to_int32(&self) -> i32 {
        let n = self.as_number();
        if !n.is_finite() {
            return 0;
        }
        (n.trunc() % 4_294_967_296.0) as i64 as i32
    }

    /// Loose, coercing equality (`==`): numbers compare equal to numeric
    /// strings, booleans coerce to numbers, lists coerce through their
    /// textual form. Distinct containers never compare loosely equal to
    /// each other.
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Null, _) | (_, Null) => false,
            (Bool(b), v) | (v, Bool(b)) => {
                Num(if *b { 1.0 } else { 0.0 }).loose_eq(v)
            }
            (Num(a), Num(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Num(n), Str(s)) | (Str(s), Num(n)) => *n == str_to_number(s),
            (List(_), Num(_) | Str(_)) | (Map(_), Num(_) | Str(_)) => {
                Str(self.to_text()).loose_eq(other)
            }
            (Num(_) | Str(_), List(_)) | (Num(_) | Str(_), Map(_)) => {
                self.loose_eq(&Str(other.to_text()))
            }
            _ => false,
        }
    }

    /// Map member lookup. `None` when the value is not a map or the key is
    /// absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

/// Numeric-string formatting: integral floats print without a fraction.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// String-to-number coercion: blank strings read as zero, anything that is
/// not a float literal reads as NaN.
pub(crate) fn str_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        0.0
    } else {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(map.into_iter().collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                Value::Num(n.as_f64().unwrap_or(f64::NAN))
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Num(n) => {
                if !n.is_finite() {
                    // JSON has no NaN or infinities
                    serializer.serialize_unit()
                } else if *n == n.trunc() && n.abs() < 1e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Variable bindings for evaluation and rendering.
///
/// Rendering threads environments through sibling nodes: an `assign` yields
/// a new environment visible to later siblings of the same block, and leaving
/// a nested block restores the environment the parent had before entering it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a binding.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(key.into(), value.into());
    }

    /// Look up a binding.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bindings.get(key)
    }

    /// A new environment equal to this one with `key` bound to `value`.
    /// This is the only "mutation" the renderer ever performs.
    pub fn with(&self, key: impl Into<String>, value: Value) -> Environment {
        let mut next = self.clone();
        next.bindings.insert(key.into(), value);
        next
    }

    /// Build an environment from a JSON object.
    pub fn from_json(json: serde_json::Value) -> TemplateResult<Environment> {
        match Value::from(json) {
            Value::Map(bindings) => Ok(Environment {
                bindings: bindings.into_iter().collect(),
            }),
            other => Err(TemplateError::Evaluation {
                message: format!("environment must be a JSON object, got {other:?}"),
            }),
        }
    }
}

impl From<HashMap<String, Value>> for Environment {
    fn from(bindings: HashMap<String, Value>) -> Self {
        Environment { bindings }
    }
}

impl FromIterator<(String, Value)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Environment {
            bindings: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());

        assert!(Value::Str("hello".to_string()).is_truthy());
        assert!(Value::Str(String::new()).is_truthy()); // empty string is truthy
        assert!(Value::Num(0.0).is_truthy()); // zero is truthy
        assert!(Value::Num(-3.5).is_truthy());
        assert!(!Value::Num(f64::NAN).is_truthy());

        assert!(Value::List(vec![]).is_truthy());
        assert!(Value::Map(BTreeMap::new()).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Str("x".to_string()).to_text(), "x");
        assert_eq!(Value::Bool(false).to_text(), "false");
        assert_eq!(Value::Num(5.0).to_text(), "5");
        assert_eq!(Value::Num(2.5).to_text(), "2.5");
        assert_eq!(Value::Num(-0.0).to_text(), "0");
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::List(vec![]).to_text(), "");
        assert_eq!(
            Value::List(vec![Value::from(1.0), Value::from("a")]).to_text(),
            "1,a"
        );
    }

    #[test]
    fn test_map_text_has_stable_key_order() {
        let value = Value::from(json!({ "zone": 1, "fuel": 2, "name": "x" }));
        assert_eq!(value.to_text(), r#"{"fuel":2,"name":"x","zone":1}"#);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::from("42").as_number(), 42.0);
        assert_eq!(Value::from("  3.5 ").as_number(), 3.5);
        assert_eq!(Value::from("").as_number(), 0.0);
        assert!(Value::from("nope").as_number().is_nan());
        assert!(Value::Null.as_number().is_nan());
        assert_eq!(Value::Bool(true).as_number(), 1.0);
    }

    #[test]
    fn test_int32_coercion() {
        assert_eq!(Value::Num(5.0).to_int32(), 5);
        assert_eq!(Value::Num(-1.0).to_int32(), -1);
        assert_eq!(Value::Num(2_147_483_648.0).to_int32(), -2_147_483_648);
        assert_eq!(Value::Num(f64::NAN).to_int32(), 0);
        assert_eq!(Value::Num(f64::INFINITY).to_int32(), 0);
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Num(4.0).loose_eq(&Value::Str("4".to_string())));
        assert!(Value::Bool(true).loose_eq(&Value::Num(1.0)));
        assert!(Value::Null.loose_eq(&Value::Null));
        assert!(!Value::Null.loose_eq(&Value::Num(0.0)));
        assert!(!Value::Num(f64::NAN).loose_eq(&Value::Num(f64::NAN)));
        // single-element list coerces through its text
        assert!(Value::List(vec![Value::from(4.0)]).loose_eq(&Value::Num(4.0)));
        // containers never compare loosely equal to each other
        assert!(!Value::List(vec![]).loose_eq(&Value::List(vec![])));
    }

    #[test]
    fn test_json_round_trip() {
        let value = Value::from(json!({
            "name": "trip",
            "fuel": 85,
            "tags": ["a", "b"],
            "ready": true,
            "missing": null,
        }));
        assert_eq!(
            value.get("tags"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(value.get("fuel"), Some(&Value::Num(85.0)));
        assert_eq!(value.get("missing"), Some(&Value::Null));

        let encoded = serde_json::to_value(&value).expect("serializable");
        assert_eq!(Value::from(encoded), value);
    }

    #[test]
    fn test_environment_with_does_not_mutate() {
        let mut env = Environment::new();
        env.insert("x", "outer");
        let inner = env.with("x", Value::from("inner"));

        assert_eq!(env.get("x"), Some(&Value::Str("outer".to_string())));
        assert_eq!(inner.get("x"), Some(&Value::Str("inner".to_string())));
    }

    #[test]
    fn test_environment_from_json_rejects_non_objects() {
        assert!(Environment::from_json(json!([1, 2])).is_err());
        let env = Environment::from_json(json!({"a": 1})).expect("object");
        assert_eq!(env.get("a"), Some(&Value::Num(1.0)));
    }
}

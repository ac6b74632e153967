/*
 * config.rs
 * Copyright (c) 2026 The limn-template authors
 */

//! Per-call configuration.
//!
//! A [`Config`] is a read-only value scoped to a single parse + render or
//! evaluate call. There is no process-global registry: callers construct the
//! helper table explicitly and it is merged over the built-ins at call time,
//! with the caller winning on name collisions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::ExprNode;
use crate::error::TemplateResult;
use crate::value::{Environment, Value};

/// A helper or filter function: positional arguments in, value out.
///
/// Filters receive the piped value as their first argument.
pub type Helper = Arc<dyn Fn(&[Value]) -> TemplateResult<Value> + Send + Sync>;

/// Truthiness predicate override.
pub type TruthyFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Evaluator override, for sandboxed or instrumented evaluation.
pub type EvalFn =
    Arc<dyn Fn(&ExprNode, &Environment, &Config) -> TemplateResult<Value> + Send + Sync>;

/// Options recognized by the engine.
#[derive(Clone, Default)]
pub struct Config {
    pub(crate) helpers: HashMap<String, Helper>,
    pub(crate) is_truthy: Option<TruthyFn>,
    pub(crate) evaluate: Option<EvalFn>,
    pub(crate) throw_on_error: bool,
    pub(crate) verbose: bool,
}

impl Config {
    /// Create a default configuration: built-in helpers, built-in
    /// truthiness, failures degrade to empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a helper/filter. Shadows a built-in of the same name.
    pub fn with_helper<F>(mut self, name: impl Into<String>, helper: F) -> Self
    where
        F: Fn(&[Value]) -> TemplateResult<Value> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(helper));
        self
    }

    /// Override the truthiness predicate.
    pub fn with_truthiness<F>(mut self, is_truthy: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.is_truthy = Some(Arc::new(is_truthy));
        self
    }

    /// Override the expression evaluator used by the renderer.
    pub fn with_evaluator<F>(mut self, evaluate: F) -> Self
    where
        F: Fn(&ExprNode, &Environment, &Config) -> TemplateResult<Value> + Send + Sync + 'static,
    {
        self.evaluate = Some(Arc::new(evaluate));
        self
    }

    /// Propagate errors instead of degrading to empty/absent output.
    pub fn throw_on_error(mut self, enabled: bool) -> Self {
        self.throw_on_error = enabled;
        self
    }

    /// Emit per-node diagnostics at `debug` level while evaluating and
    /// rendering.
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Apply the configured truthiness predicate.
    pub(crate) fn truthy(&self, value: &Value) -> bool {
        match &self.is_truthy {
            Some(f) => f(value),
            None => value.is_truthy(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Config")
            .field("helpers", &names)
            .field("is_truthy", &self.is_truthy.as_ref().map(|_| "<fn>"))
            .field("evaluate", &self.evaluate.as_ref().map(|_| "<fn>"))
            .field("throw_on_error", &self.throw_on_error)
            .field("verbose", &self.verbose)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = Config::new()
            .with_helper("shout", |args: &[Value]| {
                Ok(Value::from(
                    args.first().map(Value::to_text).unwrap_or_default().to_uppercase(),
                ))
            })
            .throw_on_error(true)
            .verbose(true);

        assert!(config.helpers.contains_key("shout"));
        assert!(config.throw_on_error);
        assert!(config.verbose);
    }

    #[test]
    fn test_truthiness_override() {
        let config = Config::new().with_truthiness(|v| !matches!(v, Value::Num(n) if *n == 0.0));
        assert!(!config.truthy(&Value::Num(0.0)));
        assert!(config.truthy(&Value::Num(1.0)));
        // default predicate says 0 is truthy
        assert!(Config::new().truthy(&Value::Num(0.0)));
    }
}

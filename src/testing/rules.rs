//! Rule-based expectations
//!
//! A `ruleMatch` expectation is a list of rules, each naming a check by its
//! type. Checks live in a [`RuleRegistry`]; a type with no registered check
//! is a configuration error, not a failed assertion.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::common::{Error, Result};

use super::case::Rule;

pub const LENGTH_NOT_GREATER_THAN: &str = "lengthNotGreaterThan";
pub const LENGTH_GREATER_THAN: &str = "lengthGreaterThan";
pub const STRING_EQUALS_IGNORE_CASE: &str = "stringEqualsIgnoreCase";

/// A comparison between a resolved result value and a rule operand
pub trait RuleCheck: Send + Sync {
    /// Return `Ok` when `actual` satisfies the rule for `operand`
    fn check(&self, actual: &Value, operand: &Value) -> Result<()>;
}

impl<F> RuleCheck for F
where
    F: Fn(&Value, &Value) -> Result<()> + Send + Sync,
{
    fn check(&self, actual: &Value, operand: &Value) -> Result<()> {
        self(actual, operand)
    }
}

/// Rule type name to check lookup
#[derive(Clone)]
pub struct RuleRegistry {
    checks: HashMap<String, Arc<dyn RuleCheck>>,
}

impl RuleRegistry {
    /// Registry holding the built-in rule types
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register(LENGTH_NOT_GREATER_THAN, length_not_greater_than)
            .register(LENGTH_GREATER_THAN, length_greater_than)
            .register(STRING_EQUALS_IGNORE_CASE, string_equals_ignore_case);
        registry
    }

    /// Registry with no rule types at all
    pub fn empty() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }

    /// Register (or replace) the check for a rule type
    pub fn register<C>(&mut self, name: impl Into<String>, check: C) -> &mut Self
    where
        C: RuleCheck + 'static,
    {
        self.checks.insert(name.into(), Arc::new(check));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn RuleCheck> {
        self.checks.get(name).map(|check| check.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Registered rule type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.checks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check every rule against `result`, stopping at the first failure
    pub fn evaluate(&self, result: &Value, rules: &[Rule]) -> Result<()> {
        for rule in rules {
            let check = self
                .get(&rule.kind)
                .ok_or_else(|| Error::UnknownRuleType(rule.kind.clone()))?;

            // A missing target field is checked as null, which no built-in accepts
            let actual = rule.resolve(result).unwrap_or(&Value::Null);
            trace!(rule = %rule.kind, target = ?rule.target, "evaluating rule");
            check.check(actual, &rule.value)?;
        }
        Ok(())
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}

/// Parse the value of a `ruleMatch` expectation
pub fn parse_rules(value: &Value) -> Result<Vec<Rule>> {
    if !value.is_array() {
        return Err(Error::Config(format!(
            "ruleMatch must be a list of rules, got {}",
            value
        )));
    }
    serde_json::from_value(value.clone())
        .map_err(|e| Error::Config(format!("Invalid ruleMatch rule: {}", e)))
}

/// Character count of a string or element count of a sequence
///
/// Strings are measured in Unicode scalar values, so an astral character
/// such as an emoji counts once rather than as two UTF-16 code units.
fn length_of(actual: &Value) -> Result<usize> {
    match actual {
        Value::String(s) => Ok(s.chars().count()),
        Value::Array(items) => Ok(items.len()),
        other => Err(Error::TestAssertion(format!(
            "Expected a string or list to measure, but got {}",
            other
        ))),
    }
}

fn length_bound(operand: &Value) -> Result<f64> {
    operand.as_f64().ok_or_else(|| {
        Error::Config(format!("Length rules need a numeric value, got {}", operand))
    })
}

fn length_not_greater_than(actual: &Value, operand: &Value) -> Result<()> {
    let bound = length_bound(operand)?;
    let len = length_of(actual)?;
    if len as f64 > bound {
        return Err(Error::TestAssertion(format!(
            "Expected length to be at most {}, but got {}",
            operand, len
        )));
    }
    Ok(())
}

fn length_greater_than(actual: &Value, operand: &Value) -> Result<()> {
    let bound = length_bound(operand)?;
    let len = length_of(actual)?;
    if len as f64 <= bound {
        return Err(Error::TestAssertion(format!(
            "Expected length to be greater than {}, but got {}",
            operand, len
        )));
    }
    Ok(())
}

fn string_equals_ignore_case(actual: &Value, operand: &Value) -> Result<()> {
    let expected = operand.as_str().ok_or_else(|| {
        Error::Config(format!(
            "{} needs a string value, got {}",
            STRING_EQUALS_IGNORE_CASE, operand
        ))
    })?;
    let matches = actual
        .as_str()
        .map(|s| s.to_lowercase() == expected.to_lowercase())
        .unwrap_or(false);

    if !matches {
        let shown = match actual {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(Error::TestAssertion(format!(
            "Expected to equal '{}' ignoring case, but got '{}'",
            expected, shown
        )));
    }
    Ok(())
}

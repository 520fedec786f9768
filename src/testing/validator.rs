//! Result validation
//!
//! The default validator compares every `then` field of a test case with the
//! same field of the result and hands the `ruleMatch` list to the rule
//! registry. Callers can replace it wholesale with their own [`Validator`].

use serde_json::Value;
use tracing::trace;

use crate::common::{Error, Result};

use super::case::{TestCase, RULE_MATCH_KEY};
use super::rules::{parse_rules, RuleCheck, RuleRegistry};

/// Decides whether a result satisfies a test case
pub trait Validator: Send + Sync {
    fn validate(&self, result: &Value, case: &TestCase) -> Result<()>;
}

impl<F> Validator for F
where
    F: Fn(&Value, &TestCase) -> Result<()> + Send + Sync,
{
    fn validate(&self, result: &Value, case: &TestCase) -> Result<()> {
        self(result, case)
    }
}

/// Field-by-field equality plus `ruleMatch` rules
#[derive(Debug, Clone, Default)]
pub struct DefaultValidator {
    rules: RuleRegistry,
}

impl DefaultValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator using a specific rule registry
    pub fn with_rules(rules: RuleRegistry) -> Self {
        Self { rules }
    }

    /// Add a rule type to this validator's registry
    pub fn register_rule<C>(&mut self, name: impl Into<String>, check: C) -> &mut Self
    where
        C: RuleCheck + 'static,
    {
        self.rules.register(name, check);
        self
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }
}

impl Validator for DefaultValidator {
    fn validate(&self, result: &Value, case: &TestCase) -> Result<()> {
        let then = case.then.as_ref().ok_or_else(|| {
            Error::Config(format!(
                "Test case '{}' has no 'then' expectations",
                case.label()
            ))
        })?;

        for (key, expected) in then {
            if key == RULE_MATCH_KEY {
                let rules = parse_rules(expected)?;
                self.rules.evaluate(result, &rules)?;
                continue;
            }

            trace!(%key, "comparing field");
            let actual = result.get(key);
            match actual {
                Some(actual) if values_equal(actual, expected) => {}
                _ => return Err(Error::field_mismatch(key, expected, actual)),
            }
        }

        Ok(())
    }
}

/// Validate with the built-in rule types
pub fn validate(result: &Value, case: &TestCase) -> Result<()> {
    DefaultValidator::new().validate(result, case)
}

/// Structural equality where numbers compare by value (`1 == 1.0`)
pub fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a == b || a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => actual == expected,
    }
}

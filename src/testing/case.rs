//! Test case descriptor types
//!
//! Defines the data structures for deserializing YAML test case descriptors.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Expectation key that holds a rule list instead of an expected value
pub const RULE_MATCH_KEY: &str = "ruleMatch";

/// A single test case loaded from a descriptor file
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Human-readable name of the case
    #[serde(default)]
    pub desc: Option<String>,
    /// Input handed verbatim to the test function (`null` when absent)
    #[serde(default)]
    pub given: Value,
    /// Expected fields of the result, in descriptor order
    #[serde(default)]
    pub then: Option<Map<String, Value>>,
    /// Descriptor file this case was loaded from
    #[serde(skip)]
    pub path: PathBuf,
}

impl TestCase {
    /// Label used when reporting this case
    ///
    /// Falls back to the descriptor path when `desc` is missing.
    pub fn label(&self) -> String {
        match &self.desc {
            Some(desc) if !desc.is_empty() => desc.clone(),
            _ => self.path.display().to_string(),
        }
    }
}

/// One entry of a `ruleMatch` expectation
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Rule {
    /// Rule type name (e.g., "lengthNotGreaterThan")
    #[serde(rename = "type")]
    pub kind: String,
    /// Result field to check; the whole result when absent or empty
    #[serde(default)]
    pub target: Option<String>,
    /// Comparison operand, interpreted by the rule type
    #[serde(default)]
    pub value: Value,
}

impl Rule {
    /// Resolve the value this rule checks
    ///
    /// A missing target field resolves to `None`.
    pub fn resolve<'a>(&self, result: &'a Value) -> Option<&'a Value> {
        match self.target.as_deref() {
            Some(target) if !target.is_empty() => result.get(target),
            _ => Some(result),
        }
    }
}

//! Data-driven test runner
//!
//! Discovers `test.yaml` descriptors, feeds each case's `given` input to a
//! caller-supplied async test function and checks the returned value
//! against the case's `then` expectations.

mod case;
pub mod loader;
pub mod rules;
mod runner;
pub mod validator;

pub use case::{Rule, TestCase, RULE_MATCH_KEY};
pub use loader::{discover, discover_named, load, load_suite, Registration, DESCRIPTOR_FILE_NAME};
pub use rules::{RuleCheck, RuleRegistry};
pub use runner::{run_tests, CaseOutcome, CaseReport, RunReport, RunnerConfig, TestFunction};
pub use validator::{validate, DefaultValidator, Validator};

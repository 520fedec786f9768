//! Case Runner - data-driven tests from YAML descriptors
//!
//! Point the runner at a directory of `test.yaml` files and an async
//! function for the system under test; each descriptor becomes one test
//! case whose result is checked field by field or with `ruleMatch` rules.

pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, FailureKind, Result, RunnerOptions};
pub use testing::{run_tests, RunReport, RunnerConfig, TestCase};

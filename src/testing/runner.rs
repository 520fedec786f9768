//! Test runner implementation
//!
//! Loads every descriptor up front, then runs the cases one at a time:
//! the test function is awaited under a timeout and its result is checked
//! by the custom validator when one is configured, the default one otherwise.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use colored::Colorize;
use serde_json::Value;
use tracing::{debug, info};

use crate::common::{Error, FailureKind, Result, RunnerOptions};

use super::case::TestCase;
use super::loader::{load_suite, Registration};
use super::validator::{DefaultValidator, Validator};

/// The system under test's entry point
///
/// Receives a case's `given` value and the path of its descriptor file.
#[async_trait]
pub trait TestFunction: Send + Sync {
    async fn call(&self, given: Value, path: &Path) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> TestFunction for F
where
    F: Fn(Value, PathBuf) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn call(&self, given: Value, path: &Path) -> Result<Value> {
        self(given, path.to_path_buf()).await
    }
}

/// Everything needed to run a suite
pub struct RunnerConfig {
    options: RunnerOptions,
    timeout: Duration,
    test_function: Arc<dyn TestFunction>,
    custom_validator: Option<Arc<dyn Validator>>,
    default_validator: DefaultValidator,
}

impl RunnerConfig {
    /// Configuration for a cases directory and an async test function
    pub fn new<F, Fut>(cases_directory: impl Into<PathBuf>, test_function: F) -> Self
    where
        F: Fn(Value, PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::from_options(RunnerOptions::new(cases_directory), test_function)
    }

    /// Configuration from deserialized options and an async test function
    pub fn from_options<F, Fut>(options: RunnerOptions, test_function: F) -> Self
    where
        F: Fn(Value, PathBuf) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::with_test_function(options, Arc::new(test_function))
    }

    /// Configuration using any [`TestFunction`] implementation
    pub fn with_test_function(
        options: RunnerOptions,
        test_function: Arc<dyn TestFunction>,
    ) -> Self {
        Self {
            timeout: options.timeout(),
            options,
            test_function,
            custom_validator: None,
            default_validator: DefaultValidator::new(),
        }
    }

    /// Only run cases under the `debug` subdirectory
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.options.debug_mode = enabled;
        self
    }

    /// Replace default validation with a closure
    pub fn custom_validator<F>(self, validator: F) -> Self
    where
        F: Fn(&Value, &TestCase) -> Result<()> + Send + Sync + 'static,
    {
        self.validator(Arc::new(validator))
    }

    /// Replace default validation with any [`Validator`]
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.custom_validator = Some(validator);
        self
    }

    /// Add a rule type to the default validator
    pub fn rule<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<()> + Send + Sync + 'static,
    {
        self.default_validator.register_rule(name, check);
        self
    }

    /// How long each test function call may take
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn descriptor_name(mut self, name: impl Into<String>) -> Self {
        self.options.descriptor_file = name.into();
        self
    }

    pub fn suite_name(mut self, name: impl Into<String>) -> Self {
        self.options.suite_name = name.into();
        self
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Run one loaded case: call the test function, then validate
    async fn run_case(&self, case: &TestCase) -> Result<()> {
        let call = self.test_function.call(case.given.clone(), &case.path);
        let result = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;

        match &self.custom_validator {
            Some(validator) => validator.validate(&result, case),
            None => self.default_validator.validate(&result, case),
        }
    }
}

/// Outcome of a single case
#[derive(Debug)]
pub enum CaseOutcome {
    Passed,
    Failed(Error),
}

/// Result of running one case
#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub path: PathBuf,
    pub outcome: CaseOutcome,
    pub elapsed: Duration,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, CaseOutcome::Passed)
    }

    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            CaseOutcome::Passed => None,
            CaseOutcome::Failed(e) => Some(e),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error().map(Error::kind)
    }
}

/// Result of a suite run
#[derive(Debug)]
pub struct RunReport {
    pub suite: String,
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Look up a case report by its label
    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// Turn a failing run into an error, for use with `?` in a test
    pub fn into_result(self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(Error::SuiteFailed {
                failed: self.failed(),
                total: self.total(),
            })
        }
    }
}

/// Discover, load and run every case the configuration selects
///
/// Fails only when the cases directory cannot be scanned; every other
/// problem is reported as the failure of the case it belongs to.
pub async fn run_tests(config: RunnerConfig) -> Result<RunReport> {
    let registrations = load_suite(&config.options)?;
    let suite = config.options.suite_name.clone();

    println!("\n{}", suite.blue().bold());

    let mut cases = Vec::with_capacity(registrations.len());
    for registration in registrations {
        let name = registration.label();
        let path = registration.path().to_path_buf();
        let started = Instant::now();

        let outcome = match registration {
            Registration::Loaded(case) => {
                debug!(case = %name, path = %path.display(), "running test case");
                match config.run_case(&case).await {
                    Ok(()) => CaseOutcome::Passed,
                    Err(e) => CaseOutcome::Failed(e),
                }
            }
            Registration::Broken { error, .. } => CaseOutcome::Failed(error),
        };

        let report = CaseReport {
            name,
            path,
            outcome,
            elapsed: started.elapsed(),
        };
        print_case(&report);
        cases.push(report);
    }

    let report = RunReport { suite, cases };
    print_summary(&report);
    info!(
        passed = report.passed(),
        failed = report.failed(),
        "test run finished"
    );

    Ok(report)
}

fn print_case(report: &CaseReport) {
    match &report.outcome {
        CaseOutcome::Passed => {
            println!(
                "  {} {} {}",
                "✓".green(),
                report.name,
                format!("({}ms)", report.elapsed.as_millis()).dimmed()
            );
        }
        CaseOutcome::Failed(e) => {
            println!("  {} {}", "✗".red(), report.name.red());
            println!("      {} {}", format!("[{}]", e.kind()).yellow(), e);
            println!("      {}", report.path.display().to_string().dimmed());
        }
    }
}

fn print_summary(report: &RunReport) {
    let passing = format!("{} passing", report.passed());
    print!("\n  {}", passing.green().bold());
    if report.failed() > 0 {
        let failing = format!("{} failing", report.failed());
        print!("  {}", failing.red().bold());
    }
    println!("\n");
}

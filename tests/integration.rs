//! End-to-end tests for the case runner
//!
//! These tests build descriptor trees in a temporary directory, run them
//! against a small in-process "system under test" and check the reports.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use case_runner::common::logging;
use case_runner::testing::{CaseOutcome, TestCase};
use case_runner::{run_tests, Error, FailureKind, RunReport, RunnerConfig, RunnerOptions};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Temporary cases directory
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        logging::init();
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a `test.yaml` into `relative` (created if missing)
    fn case(&self, relative: &str, content: &str) -> PathBuf {
        let dir = self.root().join(relative);
        std::fs::create_dir_all(&dir).expect("Failed to create case dir");
        let path = dir.join("test.yaml");
        std::fs::write(&path, content).expect("Failed to write descriptor");
        path
    }
}

/// The system under test: greets a user and echoes their tags
async fn greet(given: Value, _path: PathBuf) -> case_runner::Result<Value> {
    let name = given
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::test_function("given.name is required"))?;
    let tags = given.get("tags").cloned().unwrap_or_else(|| json!([]));
    let count = tags.as_array().map(Vec::len).unwrap_or(0);

    Ok(json!({
        "greeting": format!("Hello, {}!", name),
        "name": name.to_uppercase(),
        "tags": tags,
        "count": count,
    }))
}

async fn run(config: RunnerConfig) -> RunReport {
    run_tests(config).await.expect("Run should not abort")
}

#[tokio::test]
async fn test_passing_suite() {
    let fixture = Fixture::new();
    fixture.case(
        "greeting",
        r#"
desc: greets by name
given:
  name: ann
  tags: [admin, ops]
then:
  greeting: "Hello, ann!"
  count: 2
  tags: [admin, ops]
"#,
    );
    fixture.case(
        "rules/name",
        r#"
desc: upper-cased name matches ignoring case
given:
  name: Foo
then:
  ruleMatch:
    - type: stringEqualsIgnoreCase
      target: name
      value: foo
    - type: lengthNotGreaterThan
      target: tags
      value: 3
    - type: lengthGreaterThan
      target: greeting
      value: 5
"#,
    );

    let report = run(RunnerConfig::new(fixture.root(), greet)).await;
    assert_eq!(report.total(), 2);
    assert!(report.is_success(), "{:?}", report);
    report.into_result().unwrap();
}

#[tokio::test]
async fn test_failures_are_reported_per_case() {
    let fixture = Fixture::new();
    fixture.case(
        "a_wrong_count",
        "desc: wrong count\ngiven:\n  name: ann\n  tags: [x]\nthen:\n  count: 2\n",
    );
    fixture.case(
        "b_too_many_tags",
        "desc: too many tags\ngiven:\n  name: ann\n  tags: [a, b, c, d]\nthen:\n  ruleMatch:\n    - type: lengthNotGreaterThan\n      target: tags\n      value: 3\n",
    );
    fixture.case(
        "c_unknown_rule",
        "desc: unknown rule\ngiven:\n  name: ann\nthen:\n  ruleMatch:\n    - type: unknownType\n      target: name\n      value: 1\n",
    );
    fixture.case(
        "d_system_error",
        "desc: missing name\ngiven: {}\nthen:\n  count: 0\n",
    );
    fixture.case("e_ok", "desc: still runs\ngiven:\n  name: bob\nthen:\n  count: 0\n");

    let report = run(RunnerConfig::new(fixture.root(), greet)).await;
    assert_eq!(report.total(), 5);
    assert_eq!(report.passed(), 1);

    let wrong = report.case("wrong count").unwrap();
    match wrong.error() {
        Some(Error::FieldMismatch {
            key,
            expected,
            actual,
        }) => {
            assert_eq!(key, "count");
            assert_eq!(expected, &json!(2));
            assert_eq!(actual, &Some(json!(1)));
        }
        other => panic!("Expected FieldMismatch, got {:?}", other),
    }

    let message = report
        .case("too many tags")
        .and_then(|c| c.error())
        .unwrap()
        .to_string();
    assert!(message.contains("at most 3"), "{}", message);
    assert!(message.contains("got 4"), "{}", message);

    let unknown = report.case("unknown rule").unwrap();
    assert_eq!(unknown.failure_kind(), Some(FailureKind::Configuration));
    assert!(unknown.error().unwrap().to_string().contains("unknownType"));

    let system = report.case("missing name").unwrap();
    assert_eq!(system.failure_kind(), Some(FailureKind::Execution));

    assert!(report.case("still runs").unwrap().passed());
    assert!(matches!(
        report.into_result(),
        Err(Error::SuiteFailed { failed: 4, total: 5 })
    ));
}

#[tokio::test]
async fn test_debug_mode_only_runs_debug_cases() {
    let fixture = Fixture::new();
    fixture.case("stable", "desc: stable\ngiven:\n  name: a\nthen:\n  count: 0\n");
    fixture.case("debug", "desc: debug root\ngiven:\n  name: b\nthen:\n  count: 0\n");
    fixture.case(
        "debug/nested",
        "desc: debug nested\ngiven:\n  name: c\nthen:\n  count: 0\n",
    );

    let report = run(RunnerConfig::new(fixture.root(), greet).debug_mode(true)).await;
    let mut names: Vec<&str> = report.cases.iter().map(|c| c.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["debug nested", "debug root"]);

    let report = run(RunnerConfig::new(fixture.root(), greet)).await;
    assert_eq!(report.total(), 3);
}

#[tokio::test]
async fn test_custom_validator_replaces_default_validation() {
    let fixture = Fixture::new();
    // Expectations the default validator would fail
    fixture.case(
        "custom",
        "desc: custom\ngiven:\n  name: ann\nthen:\n  count: 99\n  ruleMatch:\n    - type: unknownType\n",
    );

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let config = RunnerConfig::new(fixture.root(), greet).custom_validator(
        move |result: &Value, case: &TestCase| {
            seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(case.desc.as_deref(), Some("custom"));
            if result["greeting"] == json!("Hello, ann!") {
                Ok(())
            } else {
                Err(Error::TestAssertion("unexpected greeting".to_string()))
            }
        },
    );

    let report = run(config).await;
    assert!(report.is_success(), "{:?}", report);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_descriptor_fails_only_its_case() {
    let fixture = Fixture::new();
    let broken = fixture.case("broken", "desc: [unclosed\nthen: {");
    fixture.case("fine", "desc: fine\ngiven:\n  name: a\nthen:\n  count: 0\n");

    let report = run(RunnerConfig::new(fixture.root(), greet)).await;
    assert_eq!(report.total(), 2);
    assert_eq!(report.passed(), 1);

    let broken_report = report
        .cases
        .iter()
        .find(|c| c.path == broken)
        .expect("Broken descriptor should be reported");
    assert_eq!(broken_report.failure_kind(), Some(FailureKind::Parse));
}

#[tokio::test]
async fn test_missing_cases_directory_aborts_run() {
    let fixture = Fixture::new();
    let config = RunnerConfig::new(fixture.root().join("nope"), greet);
    let err = run_tests(config).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Discovery);

    // Debug mode without a debug directory is a discovery failure too
    let config = RunnerConfig::new(fixture.root(), greet).debug_mode(true);
    assert!(matches!(
        run_tests(config).await,
        Err(Error::Discovery { .. })
    ));
}

#[tokio::test]
async fn test_slow_case_times_out_and_next_case_runs() {
    let fixture = Fixture::new();
    fixture.case("a_slow", "desc: slow\ngiven:\n  delay_ms: 5000\nthen: {}\n");
    fixture.case("b_fast", "desc: fast\ngiven:\n  delay_ms: 0\nthen:\n  done: true\n");

    let config = RunnerConfig::new(fixture.root(), |given: Value, _path: PathBuf| async move {
        let delay = given["delay_ms"].as_u64().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok::<_, Error>(json!({ "done": true }))
    })
    .timeout(Duration::from_millis(100));

    let report = run(config).await;
    assert_eq!(
        report.case("slow").and_then(|c| c.failure_kind()),
        Some(FailureKind::Timeout)
    );
    assert!(report.case("fast").unwrap().passed());
}

#[tokio::test]
async fn test_function_receives_given_and_descriptor_path() {
    let fixture = Fixture::new();
    let path = fixture.case(
        "echo",
        "desc: echo\ngiven:\n  nested:\n    list: [1, 2.5, true, null]\nthen:\n  matched: true\n",
    );

    let expected_path = path.clone();
    let config = RunnerConfig::new(fixture.root(), move |given: Value, path: PathBuf| {
        let matched = path == expected_path
            && given == json!({"nested": {"list": [1, 2.5, true, null]}});
        async move { Ok::<_, Error>(json!({ "matched": matched })) }
    });

    let report = run(config).await;
    assert!(report.is_success(), "{:?}", report);
}

#[tokio::test]
async fn test_options_from_yaml_and_custom_rules() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.root().join("suite/one")).unwrap();
    std::fs::write(
        fixture.root().join("suite/one/case.yml"),
        "desc: prefixed\ngiven:\n  name: ann\nthen:\n  ruleMatch:\n    - type: startsWith\n      target: greeting\n      value: Hello\n",
    )
    .unwrap();
    // Not matched by the configured descriptor name
    fixture.case("suite/two", "desc: ignored\nthen: {}\n");

    let options = RunnerOptions::from_yaml(&format!(
        "casesDirectory: {}\ndescriptorFile: case.yml\nsuiteName: Greeter\ntimeoutSecs: 2\n",
        fixture.root().join("suite").display()
    ))
    .unwrap();

    let config = RunnerConfig::from_options(options, greet).rule(
        "startsWith",
        |actual: &Value, operand: &Value| match (actual.as_str(), operand.as_str()) {
            (Some(s), Some(prefix)) if s.starts_with(prefix) => Ok(()),
            _ => Err(Error::TestAssertion(format!(
                "Expected {} to start with {}",
                actual, operand
            ))),
        },
    );
    assert_eq!(config.options().suite_name, "Greeter");

    let report = run(config).await;
    assert_eq!(report.suite, "Greeter");
    assert_eq!(report.total(), 1);
    assert!(matches!(report.cases[0].outcome, CaseOutcome::Passed));
}

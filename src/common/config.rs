//! Runner options
//!
//! The declarative half of a runner configuration. The test function and
//! custom validator are code and are attached through
//! [`RunnerConfig`](crate::testing::RunnerConfig).

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::{Error, Result};

/// Subdirectory scanned instead of the cases root in debug mode
pub const DEBUG_SUBDIRECTORY: &str = "debug";

/// Options controlling discovery and execution
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunnerOptions {
    /// Root directory scanned for descriptor files
    pub cases_directory: PathBuf,

    /// Only run cases under the `debug` subdirectory
    #[serde(default, rename = "isDebugMode")]
    pub debug_mode: bool,

    /// Per-case timeout for the test function
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the descriptor files to discover
    #[serde(default = "default_descriptor_file")]
    pub descriptor_file: String,

    /// Label printed above the case results
    #[serde(default = "default_suite_name")]
    pub suite_name: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_descriptor_file() -> String {
    "test.yaml".to_string()
}

fn default_suite_name() -> String {
    "Data Driven Tests".to_string()
}

impl RunnerOptions {
    /// Options for a cases directory with every other setting defaulted
    pub fn new(cases_directory: impl Into<PathBuf>) -> Self {
        Self {
            cases_directory: cases_directory.into(),
            debug_mode: false,
            timeout_secs: default_timeout_secs(),
            descriptor_file: default_descriptor_file(),
            suite_name: default_suite_name(),
        }
    }

    /// Parse options from a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Directory actually scanned, honouring debug mode
    pub fn case_root(&self) -> PathBuf {
        if self.debug_mode {
            self.cases_directory.join(DEBUG_SUBDIRECTORY)
        } else {
            self.cases_directory.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

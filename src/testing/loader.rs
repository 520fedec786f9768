//! Test case discovery and loading
//!
//! All descriptor files are read before any case runs, so directory
//! traversal never interleaves with test execution.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::common::{Error, Result, RunnerOptions};

use super::case::TestCase;

/// Default descriptor file name
pub const DESCRIPTOR_FILE_NAME: &str = "test.yaml";

/// A discovered descriptor, loaded or not
#[derive(Debug)]
pub enum Registration {
    /// The descriptor parsed into a test case
    Loaded(TestCase),
    /// The descriptor could not be read or parsed; reported as a failed case
    Broken { path: PathBuf, error: Error },
}

impl Registration {
    pub fn path(&self) -> &Path {
        match self {
            Registration::Loaded(case) => &case.path,
            Registration::Broken { path, .. } => path,
        }
    }

    /// Label used when reporting this registration
    pub fn label(&self) -> String {
        match self {
            Registration::Loaded(case) => case.label(),
            Registration::Broken { path, .. } => path.display().to_string(),
        }
    }
}

/// Find every `test.yaml` under `root`
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    discover_named(root, DESCRIPTOR_FILE_NAME)
}

/// Find every regular file named `file_name` under `root`, at any depth
///
/// Entries are visited sorted by file name so the order is reproducible
/// across file systems.
pub fn discover_named(root: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(root).map_err(|e| Error::Discovery {
        path: root.display().to_string(),
        reason: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(Error::Discovery {
            path: root.display().to_string(),
            reason: "not a directory".to_string(),
        });
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Discovery {
            path: e
                .path()
                .unwrap_or(root)
                .display()
                .to_string(),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_file() && entry.file_name() == file_name {
            found.push(entry.into_path());
        }
    }

    debug!(root = %root.display(), count = found.len(), "discovered descriptors");
    Ok(found)
}

/// Load a test case from a descriptor file
pub fn load(path: &Path) -> Result<TestCase> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    parse(&content, path)
}

/// Parse a descriptor document, recording `path` as its origin
///
/// `<<` merge keys are expanded before the case is read.
pub fn parse(content: &str, path: &Path) -> Result<TestCase> {
    let mut document: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| Error::parse(path, e))?;
    document.apply_merge().map_err(|e| Error::parse(path, e))?;

    let mut case: TestCase =
        serde_yaml::from_value(document).map_err(|e| Error::parse(path, e))?;
    case.path = path.to_path_buf();
    Ok(case)
}

/// Discover and load every case the options select
///
/// A discovery failure aborts; a descriptor that fails to load becomes a
/// [`Registration::Broken`] entry so the remaining cases still run.
pub fn load_suite(options: &RunnerOptions) -> Result<Vec<Registration>> {
    let root = options.case_root();
    let paths = discover_named(&root, &options.descriptor_file)?;

    let registrations = paths
        .into_iter()
        .map(|path| match load(&path) {
            Ok(case) => Registration::Loaded(case),
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to load test case");
                Registration::Broken { path, error }
            }
        })
        .collect();

    Ok(registrations)
}

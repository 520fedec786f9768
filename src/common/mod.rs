//! Common utilities shared by the loader, validator and runner

pub mod config;
pub mod error;
pub mod logging;

pub use config::RunnerOptions;
pub use error::{Error, FailureKind, Result};

//! Error types for loading, generating and writing compile databases.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while producing or persisting a database.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Database JSON is malformed or not an array of records.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration YAML failed to parse.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A configuration value is out of range or unrecognized.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The compile database file does not exist.
    #[error("compile database not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    /// The generator executable could not be started.
    #[error("failed to run '{}': {source}", .program.display())]
    GeneratorSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The generator exited unsuccessfully.
    #[error("generator exited with {}: {stderr}", describe_exit(.code))]
    GeneratorFailed { code: Option<i32>, stderr: String },

    /// The generator did not finish within the configured timeout.
    #[error("generator timed out after {0}s")]
    GeneratorTimeout(u64),

    /// Every source in a [`SourceChain`](crate::SourceChain) failed.
    #[error("no compile database source succeeded: {}", .0.join("; "))]
    NoSourcesAvailable(Vec<String>),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Convenience alias for results with [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;

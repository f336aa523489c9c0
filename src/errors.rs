use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::FormName;

/// Error type for configuration loading, report dumps, and CLI arguments.
///
/// The ledger and consumption computations themselves never fail; only the
/// layer that feeds them can.
#[derive(Debug, Error)]
pub enum StockError {
    /// Reading a file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A file was not valid JSON or did not match the expected shape.
    #[error("failed to parse '{path}': {source}")]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The configuration is structurally unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A form identifier is mapped to several workflows.
    #[error("form '{form}' is configured for more than one workflow: {workflows}")]
    FormCollision {
        /// Shared form identifier.
        form: FormName,
        /// Comma-separated workflow names using it.
        workflows: String,
    },
    /// A command-line or parsed argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

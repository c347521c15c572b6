//! Errors raised while reading `hotload.toml`.

use std::path::PathBuf;

/// A `hotload.toml` that could not be read or does not describe a usable project.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for the configuration schema.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// An entry of `paths.search` is blank.
    #[error("paths.search[{index}] is empty")]
    EmptySearchRoot {
        /// Position of the blank entry.
        index: usize,
    },

    /// A file extension is empty or contains a dot or path separator.
    #[error("{field} must be a bare extension, got '{value}'")]
    InvalidExtension {
        /// The offending field.
        field: &'static str,
        /// Its configured value.
        value: String,
    },
}

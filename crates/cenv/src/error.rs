// Copyright (c) Contributors to the cenv project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for cenv operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with cenv Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable error kind, one per failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingValue,
    InvalidValue,
    NotFound,
    File,
    Filesystem,
    Serialization,
    Parse,
    Execution,
    Buffer,
}

/// Errors that can occur during cenv operations.
///
/// Each variant carries a stable diagnostic code (`cenv::<kind>`), an
/// HTTP-status-like severity via [`Error::status`], and where applicable a
/// JSON-pointer-like `path` locating the offender in the config or env file.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// A required value was absent
    #[error("{detail}")]
    #[diagnostic(code(cenv::missing_value))]
    MissingValue {
        /// Location in the config or file, e.g. `.env.overwrites[0].dir`
        path: String,
        detail: String,
    },

    /// A value was present but unusable
    #[error("{detail}")]
    #[diagnostic(code(cenv::invalid_value))]
    InvalidValue { path: String, detail: String },

    /// A referenced file does not exist
    #[error("File not found: {filepath:?}")]
    #[diagnostic(code(cenv::not_found))]
    NotFound {
        path: String,
        filepath: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file exists but could not be read
    #[error("Failed to read file: {filepath:?}")]
    #[diagnostic(code(cenv::file_error))]
    File {
        path: String,
        filepath: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A filesystem operation (chdir, cwd resolution) failed
    #[error("{detail}")]
    #[diagnostic(code(cenv::filesystem_error))]
    Filesystem {
        detail: String,
        #[source]
        source: std::io::Error,
    },

    /// Encoding or decoding of a structured document failed
    #[error("{detail}")]
    #[diagnostic(code(cenv::serialization_error))]
    Serialization {
        path: String,
        detail: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A template failed to parse
    #[error("Failed to parse template: {detail}")]
    #[diagnostic(code(cenv::parse_error))]
    Parse { detail: String },

    /// A template parsed but failed to evaluate
    #[error("Failed to execute template: {detail}")]
    #[diagnostic(code(cenv::execution_error))]
    Execution { detail: String },

    /// Writing the diff stream failed
    #[error("Failed to write diff")]
    #[diagnostic(code(cenv::buffer_error))]
    Buffer {
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingValue { .. } => ErrorKind::MissingValue,
            Error::InvalidValue { .. } => ErrorKind::InvalidValue,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::File { .. } => ErrorKind::File,
            Error::Filesystem { .. } => ErrorKind::Filesystem,
            Error::Serialization { .. } => ErrorKind::Serialization,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Execution { .. } => ErrorKind::Execution,
            Error::Buffer { .. } => ErrorKind::Buffer,
        }
    }

    /// HTTP-status-like severity: 4xx for bad input, 5xx for system failures.
    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::MissingValue
            | ErrorKind::InvalidValue
            | ErrorKind::Serialization
            | ErrorKind::Parse => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::File
            | ErrorKind::Filesystem
            | ErrorKind::Execution
            | ErrorKind::Buffer => 500,
        }
    }

    /// The JSON-pointer-like location of this error, if it has one.
    pub fn path(&self) -> &str {
        match self {
            Error::MissingValue { path, .. }
            | Error::InvalidValue { path, .. }
            | Error::NotFound { path, .. }
            | Error::File { path, .. }
            | Error::Serialization { path, .. } => path,
            _ => "",
        }
    }
}

//! Error types shared across fontpick-core (made by FontLab https://www.fontlab.com/)

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that reach callers of the matching API.
#[derive(Debug, Error)]
pub enum FontError {
    /// A style axis was given a value outside its allowed set or range.
    #[error("invalid {axis} {value:?}: expected {allowed}")]
    Validation {
        axis: &'static str,
        value: String,
        allowed: String,
    },

    /// A pattern string could not be tokenized.
    #[error("invalid font pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },

    /// The resolved font file is gone and no rebuild is allowed to repair it.
    #[error("no valid font could be found for {request}")]
    NotFound { request: String },
}

impl FontError {
    pub(crate) fn validation(
        axis: &'static str,
        value: impl Into<String>,
        allowed: impl Into<String>,
    ) -> Self {
        FontError::Validation {
            axis,
            value: value.into(),
            allowed: allowed.into(),
        }
    }

    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        FontError::Pattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Why a single candidate file was left out of the catalog.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported font data: {0}")]
    Unsupported(String),

    #[error("non-scalable fonts are not supported")]
    NotScalable,
}

/// Failures of the persistent catalog snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no snapshot at {0}")]
    Missing(PathBuf),

    #[error("snapshot version {found} does not match {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("snapshot i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("timed out waiting for lock {0}")]
    LockTimeout(PathBuf),
}

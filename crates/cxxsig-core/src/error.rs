//! Error types and error code constants for cxxsig.
//!
//! `CxxsigError` is the single error type rendered by the CLI. Domain errors
//! from the language crate bridge into it through `From` impls there.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, no reference at location)
//! - `4`: Apply errors (failed precondition checks, conflicting or stale edits)
//! - `10`: Internal errors (bugs, unexpected state, IO)

use std::fmt;
use std::io;

use thiserror::Error;

pub use crate::types::{Location, Problem};

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file not found, nothing at location).
    ResolutionError = 3,
    /// Apply errors (precondition failures, conflicts).
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum CxxsigError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Invalid identifier (getter, setter, parameter or function name).
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// No identifier token at the requested location.
    #[error("no reference found at {location}")]
    ReferenceNotFound { location: Location },

    /// Refactoring preconditions failed.
    #[error("precondition failed: {}", problems.iter().map(|p| p.message.as_str()).collect::<Vec<_>>().join("; "))]
    PreconditionFailed { problems: Vec<Problem> },

    /// Failed to apply changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Configuration file could not be read or parsed.
    #[error("config error: {message}")]
    Config { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&CxxsigError> for OutputErrorCode {
    fn from(err: &CxxsigError) -> Self {
        match err {
            CxxsigError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            CxxsigError::InvalidIdentifier { .. } => OutputErrorCode::InvalidArguments,
            CxxsigError::Config { .. } => OutputErrorCode::InvalidArguments,
            CxxsigError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            CxxsigError::ReferenceNotFound { .. } => OutputErrorCode::ResolutionError,
            CxxsigError::PreconditionFailed { .. } => OutputErrorCode::ApplyError,
            CxxsigError::ApplyError { .. } => OutputErrorCode::ApplyError,
            CxxsigError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<CxxsigError> for OutputErrorCode {
    fn from(err: CxxsigError) -> Self {
        OutputErrorCode::from(&err)
    }
}

impl From<io::Error> for CxxsigError {
    fn from(err: io::Error) -> Self {
        CxxsigError::InternalError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for CxxsigError {
    fn from(err: serde_json::Error) -> Self {
        CxxsigError::InternalError {
            message: format!("JSON error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl CxxsigError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        CxxsigError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        CxxsigError::FileNotFound { path: path.into() }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

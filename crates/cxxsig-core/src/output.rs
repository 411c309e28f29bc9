//! JSON output types and serialization for CLI responses.
//!
//! These types form the contract with callers that drive cxxsig from scripts
//! or editors:
//!
//! 1. **Structured JSON:** every CLI response is one JSON document on stdout
//! 2. **Status first:** every response has `status` as its first field
//! 3. **Deterministic:** same input produces identical bytes
//! 4. **Versioned:** `schema_version` enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{CxxsigError, OutputErrorCode};

pub use crate::patch::{MaterializedPatch as Patch, OutputEdit as Edit, Span};
pub use crate::types::{Location, Problem};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Warnings and Summary
// ============================================================================

/// Warning information for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Where the warning applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Warning {
    /// Create a simple warning without location.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Create a warning with location.
    pub fn with_location(
        code: impl Into<String>,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            location: Some(location),
        }
    }
}

impl From<&Problem> for Warning {
    fn from(problem: &Problem) -> Self {
        Warning::new("precondition", problem.message.clone())
    }
}

/// Edit summary for refactoring responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Files modified.
    pub files_changed: u32,
    /// Total edits.
    pub edits_count: u32,
    /// Net bytes added.
    pub bytes_added: i64,
    /// Net bytes removed.
    pub bytes_removed: i64,
}

impl Summary {
    /// Create from a materialized patch.
    pub fn from_patch(patch: &Patch) -> Self {
        let mut files = std::collections::HashSet::new();
        let mut bytes_added: i64 = 0;
        let mut bytes_removed: i64 = 0;

        for edit in &patch.edits {
            files.insert(&edit.file);
            bytes_added += edit.new_text.len() as i64;
            bytes_removed += edit.old_text.len() as i64;
        }

        Summary {
            files_changed: files.len() as u32,
            edits_count: patch.edits.len() as u32,
            bytes_added: bytes_added - bytes_removed.min(bytes_added),
            bytes_removed: bytes_removed - bytes_added.min(bytes_removed),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Response for a refactoring run (change-params, encapsulate-field).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefactorResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Refactoring operation name.
    pub operation: String,
    /// The patch (edits and unified diff).
    pub patch: Patch,
    /// Edit summary.
    pub summary: Summary,
    /// Non-fatal findings.
    pub warnings: Vec<Warning>,
    /// Whether changes were written to disk (present when --apply used).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<bool>,
}

impl RefactorResponse {
    /// Create a dry-run response.
    pub fn new(operation: impl Into<String>, patch: Patch, warnings: Vec<Warning>) -> Self {
        let summary = Summary::from_patch(&patch);
        RefactorResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            operation: operation.into(),
            patch,
            summary,
            warnings,
            applied: None,
        }
    }

    /// Mark whether the patch was written.
    pub fn with_applied(mut self, applied: bool) -> Self {
        self.applied = Some(applied);
        self
    }
}

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Where the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ErrorInfo {
    /// Create from a CxxsigError.
    pub fn from_error(err: &CxxsigError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let (details, location) = match err {
            CxxsigError::FileNotFound { path } => {
                (Some(serde_json::json!({ "path": path })), None)
            }
            CxxsigError::ReferenceNotFound { location } => (None, Some(location.clone())),
            CxxsigError::PreconditionFailed { problems } => {
                (Some(serde_json::json!({ "problems": problems })), None)
            }
            CxxsigError::ApplyError { file, .. } => {
                (file.as_ref().map(|f| serde_json::json!({ "file": f })), None)
            }
            _ => (None, None),
        };

        ErrorInfo {
            code,
            message,
            details,
            location,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a CxxsigError.
    pub fn from_error(err: &CxxsigError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for the CLI.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

/// Emit a response as compact JSON (single line) to a writer.
pub fn emit_response_compact<T: Serialize>(
    response: &T,
    writer: &mut impl Write,
) -> io::Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

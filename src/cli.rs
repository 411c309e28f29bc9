//! CLI front door.
//!
//! Provides the command helpers behind the `cxxsig` binary:
//! - `scan` - Report the argument list of the call at a location
//! - `change-params` - Reorder, add, remove or rename parameters of a function
//! - `encapsulate-field` - Route field accesses through a getter and setter
//!
//! Each helper reads one source file, runs the operation from `cxxsig-cpp`
//! and returns a serializable response. Refactorings are dry runs unless
//! `apply` is set, in which case the patch is applied in memory and the file
//! rewritten only if every edit applied cleanly.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, CxxsigError>`; operation errors convert
//! through the `From` bridges in `cxxsig-cpp`.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use cxxsig_core::error::CxxsigError;
use cxxsig_core::output::{
    emit_response, emit_response_compact, Location, RefactorResponse, SCHEMA_VERSION,
};
use cxxsig_core::patch::ApplyResult;
use cxxsig_core::text::{
    byte_offset_to_position_str, extract_span_str, line_bounds, line_start_offset,
    position_to_byte_offset_str,
};
use cxxsig_cpp::lexer::{identifier_at, lex};
use cxxsig_cpp::ops::change_params::{change_parameters, ChangeParametersRequest};
use cxxsig_cpp::ops::encapsulate_field::{encapsulate_field, EncapsulateFieldRequest};
use cxxsig_cpp::ops::{RefactorOutcome, SitePosition, SOURCE_FILE};
use cxxsig_cpp::{scan_tokens, CallSiteInfo};

use crate::config::Config;

// ============================================================================
// Scan
// ============================================================================

/// Response for the `scan` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// The reference token the scan started from.
    pub location: Location,
    /// Whether an argument list was found.
    pub valid: bool,
    /// Scanner result.
    pub call_site: CallSiteInfo,
    /// Source line containing the reference.
    pub line_text: String,
}

/// Scan the call site at `at` (`path:line:col`).
///
/// The location may point anywhere inside the function name token.
pub fn run_scan(at: &str) -> Result<ScanResponse, CxxsigError> {
    let location = Location::parse(at).ok_or_else(|| {
        CxxsigError::invalid_args(format!(
            "invalid location format '{}', expected path:line:col",
            at
        ))
    })?;
    let source = read_source(Path::new(&location.file))?;

    let offset = line_start_offset(&source, location.line)
        .map(|_| position_to_byte_offset_str(&source, location.line, location.col))
        .filter(|offset| *offset < source.len())
        .ok_or_else(|| CxxsigError::ReferenceNotFound {
            location: location.clone(),
        })?;

    let tokens = lex(&source);
    let reference = identifier_at(&tokens, &source, offset).ok_or_else(|| {
        CxxsigError::ReferenceNotFound {
            location: location.clone(),
        }
    })?;

    let call_site = scan_tokens(&tokens, &source, reference.start());
    debug!(
        reference = reference.start(),
        valid = call_site.is_valid(),
        arguments = call_site.argument_count(),
        "scan finished"
    );

    let (line, col) = byte_offset_to_position_str(&source, reference.start());
    let line_text = extract_span_str(&source, &line_bounds(&source, reference.start()))
        .unwrap_or_default()
        .to_string();

    Ok(ScanResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        location: Location::with_span(
            location.file,
            line,
            col,
            reference.start(),
            reference.end(),
        ),
        valid: call_site.is_valid(),
        call_site,
        line_text,
    })
}

// ============================================================================
// Refactorings
// ============================================================================

/// Run change-parameters on `file` with the JSON request at `request_path`.
pub fn run_change_params(
    file: &Path,
    request_path: &Path,
    apply: bool,
    config: &Config,
) -> Result<RefactorResponse, CxxsigError> {
    let source = read_source(file)?;
    let request_json = fs::read_to_string(request_path).map_err(|e| {
        CxxsigError::invalid_args(format!(
            "failed to read request {}: {}",
            request_path.display(),
            e
        ))
    })?;
    let request: ChangeParametersRequest = serde_json::from_str(&request_json)
        .map_err(|e| CxxsigError::invalid_args(format!("malformed request: {}", e)))?;

    let display = file.display().to_string();
    let outcome = change_parameters(&display, &source, &request, config.format)?;
    finish("change-params", file, &source, outcome, apply)
}

/// Run encapsulate-field on `file` for the field references at `positions`.
///
/// Each position is a byte offset or `line:col`.
pub fn run_encapsulate_field(
    file: &Path,
    getter: Option<String>,
    setter: Option<String>,
    positions: &[String],
    apply: bool,
) -> Result<RefactorResponse, CxxsigError> {
    let source = read_source(file)?;
    let request = EncapsulateFieldRequest {
        getter,
        setter,
        references: positions.iter().map(|p| parse_position(p)).collect(),
    };

    let display = file.display().to_string();
    let outcome = encapsulate_field(&display, &source, &request)?;
    finish("encapsulate-field", file, &source, outcome, apply)
}

/// Parse a `--at` value: a byte offset or `line:col`.
pub fn parse_position(text: &str) -> SitePosition {
    match text.trim().parse::<usize>() {
        Ok(offset) => SitePosition::Offset(offset),
        Err(_) => SitePosition::LineCol(text.trim().to_string()),
    }
}

/// Materialize the outcome and optionally write it back.
fn finish(
    operation: &str,
    file: &Path,
    source: &str,
    outcome: RefactorOutcome,
    apply: bool,
) -> Result<RefactorResponse, CxxsigError> {
    let files: HashMap<_, _> = [(SOURCE_FILE, source.to_string())].into();
    let patch = outcome.patch.materialize(&files);
    let response = RefactorResponse::new(operation, patch, outcome.warnings);
    if !apply {
        return Ok(response);
    }

    match outcome.patch.apply(&files) {
        ApplyResult::Success { modified_files } => {
            if let Some(content) = modified_files.get(&SOURCE_FILE) {
                fs::write(file, content)?;
            }
            info!(
                file = %file.display(),
                edits = response.summary.edits_count,
                "changes written"
            );
            Ok(response.with_applied(true))
        }
        ApplyResult::Failed { conflicts } => Err(CxxsigError::ApplyError {
            message: conflicts
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            file: Some(file.display().to_string()),
        }),
    }
}

fn read_source(path: &Path) -> Result<String, CxxsigError> {
    match fs::read_to_string(path) {
        Ok(source) => Ok(source),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(CxxsigError::file_not_found(path.display().to_string()))
        }
        Err(e) => Err(CxxsigError::from(e)),
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Write a response to stdout, pretty or compact per configuration.
pub fn emit<T: Serialize>(response: &T, config: &Config) -> Result<(), CxxsigError> {
    let mut stdout = io::stdout();
    if config.output.pretty {
        emit_response(response, &mut stdout)?;
    } else {
        emit_response_compact(response, &mut stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    mod scan {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn reports_arguments() {
            let dir = TempDir::new().unwrap();
            let path = write(&dir, "a.cpp", "void g() {\n  f(1, x + 2);\n}\n");
            let at = format!("{}:2:3", path.display());
            let response = run_scan(&at).unwrap();
            assert!(response.valid);
            assert_eq!(response.location.line, 2);
            assert_eq!(response.location.col, 3);
            assert_eq!(response.call_site.original_text, "(1, x + 2)");
            assert_eq!(response.line_text, "  f(1, x + 2);");
        }

        #[test]
        fn not_a_call_is_invalid_but_ok() {
            let dir = TempDir::new().unwrap();
            let path = write(&dir, "a.cpp", "int f;\n");
            let response = run_scan(&format!("{}:1:5", path.display())).unwrap();
            assert!(!response.valid);
            assert_eq!(response.call_site.argument_count(), 0);
        }

        #[test]
        fn location_off_identifier_is_resolution_error() {
            let dir = TempDir::new().unwrap();
            let path = write(&dir, "a.cpp", "f(1);\n");
            let err = run_scan(&format!("{}:1:2", path.display())).unwrap_err();
            assert!(matches!(err, CxxsigError::ReferenceNotFound { .. }));
            let err = run_scan(&format!("{}:9:1", path.display())).unwrap_err();
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn call_inside_macro_body() {
            let dir = TempDir::new().unwrap();
            let path = write(&dir, "a.cpp", "#define CALL f(1, 2)\nint y;\n");
            let response = run_scan(&format!("{}:1:14", path.display())).unwrap();
            assert!(response.valid);
            assert_eq!(response.location.byte_start, Some(13));
            assert_eq!(response.call_site.original_text, "(1, 2)");
            assert_eq!(response.line_text, "#define CALL f(1, 2)");
        }

        #[test]
        fn bad_location_and_missing_file() {
            assert!(matches!(
                run_scan("nocolons").unwrap_err(),
                CxxsigError::InvalidArguments { .. }
            ));
            assert!(matches!(
                run_scan("/definitely/not/here.cpp:1:1").unwrap_err(),
                CxxsigError::FileNotFound { .. }
            ));
        }
    }

    mod change_params {
        use super::*;
        use pretty_assertions::assert_eq;

        const SOURCE: &str = "int add(int a, int b);\nint x = add(1, 2);\n";
        const REQUEST: &str = r#"{
            "parameters": [
                {"original_index": 1, "name": "b", "type": "int"},
                {"original_index": 0, "name": "a", "type": "int"}
            ],
            "declarations": ["1:5"],
            "references": ["2:9"]
        }"#;

        #[test]
        fn dry_run_leaves_file() {
            let dir = TempDir::new().unwrap();
            let file = write(&dir, "a.cpp", SOURCE);
            let request = write(&dir, "req.json", REQUEST);
            let response =
                run_change_params(&file, &request, false, &Config::default()).unwrap();
            assert_eq!(response.operation, "change-params");
            assert_eq!(response.summary.edits_count, 2);
            assert_eq!(response.applied, None);
            assert_eq!(fs::read_to_string(&file).unwrap(), SOURCE);
        }

        #[test]
        fn apply_rewrites_file() {
            let dir = TempDir::new().unwrap();
            let file = write(&dir, "a.cpp", SOURCE);
            let request = write(&dir, "req.json", REQUEST);
            let response = run_change_params(&file, &request, true, &Config::default()).unwrap();
            assert_eq!(response.applied, Some(true));
            assert_eq!(
                fs::read_to_string(&file).unwrap(),
                "int add(int b, int a);\nint x = add(2, 1);\n"
            );
        }

        #[test]
        fn malformed_request_is_invalid_arguments() {
            let dir = TempDir::new().unwrap();
            let file = write(&dir, "a.cpp", SOURCE);
            let request = write(&dir, "req.json", "{\"parameters\": 3}");
            let err = run_change_params(&file, &request, false, &Config::default()).unwrap_err();
            assert_eq!(err.error_code().code(), 2);
        }
    }

    mod encapsulate {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn apply_routes_through_accessors() {
            let dir = TempDir::new().unwrap();
            let file = write(&dir, "a.cpp", "p.x = q.x;\n");
            let response = run_encapsulate_field(
                &file,
                Some("getX".into()),
                Some("setX".into()),
                &["2".to_string(), "1:9".to_string()],
                true,
            )
            .unwrap();
            assert_eq!(response.applied, Some(true));
            assert_eq!(fs::read_to_string(&file).unwrap(), "p.setX(q.getX());\n");
        }

        #[test]
        fn positions_parse_both_forms() {
            assert_eq!(parse_position("42"), SitePosition::Offset(42));
            assert_eq!(parse_position("3:7"), SitePosition::LineCol("3:7".into()));
        }
    }
}

//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.
//!
//! Run with: cargo test -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Core Infrastructure Types
// ============================================================================

// patch module - foundation types for edit/diff operations
use cxxsig::patch::{
    Anchor, AnchorResolution, ApplyResult, Conflict, ContentHash, Edit, EditKind, EditLabels,
    FileId, MaterializedPatch, OutputEdit, PatchSet, Span,
};

// error module - error types and codes
use cxxsig::error::{CxxsigError, OutputErrorCode};

// output module - JSON output types
use cxxsig::output::{
    emit_response, emit_response_compact, Edit as OutputEditAlias, ErrorInfo, ErrorResponse,
    Location, Patch, Problem, RefactorResponse, Summary, Warning, SCHEMA_VERSION,
};

// text module - text position utilities
use cxxsig::text;

// diff module - unified diff generation
use cxxsig::diff;

// ============================================================================
// Language Adapter
// ============================================================================

use cxxsig::cpp::field_access::{scan_field_access, AccessKind, FieldAccess, FieldAccessScanner};
use cxxsig::cpp::lexer::{last_command_separator, lex, lex_embedded, token_at};
use cxxsig::cpp::ops::change_params::{
    build_argument_list, build_parameter_list, change_parameters, check_parameters,
    ChangeParametersRequest, ChangeParamsError, OriginalSignature, ParameterInfo,
};
use cxxsig::cpp::ops::encapsulate_field::{
    encapsulate_field, EncapsulateError, EncapsulateFieldRequest,
};
use cxxsig::cpp::ops::{FormatOptions, RefactorOutcome, SitePosition, SOURCE_FILE};
use cxxsig::cpp::processor::{process_tokens, TokenProcessor};
use cxxsig::cpp::scanner::{
    scan_call_site, scan_source, scan_tokens, ArgumentSpan, CallSiteInfo, ParamScanner,
};
use cxxsig::cpp::token::{SourceText, Token, TokenKind};
use cxxsig::cpp::validation::{validate_cpp_identifier, ValidationError, CPP_KEYWORDS};

// ============================================================================
// Front Door
// ============================================================================

use cxxsig::cli::{run_change_params, run_encapsulate_field, run_scan, ScanResponse};
use cxxsig::config::{Config, OutputConfig, CONFIG_FILE};

// ============================================================================
// Test
// ============================================================================

#[test]
fn api_surface_compiles() {
    // This test exists only to verify imports compile.
    // If you're here because this test broke, you may have
    // accidentally removed a public re-export.

    let _ = std::any::type_name::<Span>();
    let _ = std::any::type_name::<FileId>();
    let _ = std::any::type_name::<CxxsigError>();
    let _ = std::any::type_name::<Location>();
    let _ = std::any::type_name::<CallSiteInfo>();
    let _ = std::any::type_name::<ParamScanner<'_, str>>();
    let _ = std::any::type_name::<Config>();
}

#[test]
fn schema_version_is_stable() {
    // The schema version is part of the public API contract
    assert_eq!(SCHEMA_VERSION, "1");
}

#[test]
fn scanner_through_reexports() {
    let source = "log(level, \"%d\", n);";
    let info = scan_source(source, 0);
    assert!(info.is_valid());
    assert_eq!(info.argument_count(), 3);
    assert_eq!(info.arguments[0].text, "level");
    assert_eq!(info.arguments[2].text, " n");
}

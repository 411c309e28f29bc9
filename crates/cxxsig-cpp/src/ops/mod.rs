//! C/C++ refactoring operations.
//!
//! Each operation works on one in-memory source buffer and produces a
//! [`RefactorOutcome`]: a [`PatchSet`] against that buffer plus warnings for
//! the sites it had to leave alone. Writing the result is up to the caller.

pub mod change_params;
pub mod encapsulate_field;

use serde::{Deserialize, Serialize};

use cxxsig_core::patch::{FileId, PatchSet, Span};
use cxxsig_core::text::{byte_offset_to_position_str, line_start_offset, position_to_byte_offset_str};

use crate::lexer::identifier_at;
use crate::token::Token;

pub use cxxsig_core::output::{Location, Warning};

/// File id used for the single buffer an operation edits.
pub const SOURCE_FILE: FileId = FileId(0);

// ============================================================================
// Options and Positions
// ============================================================================

/// Formatting applied to generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Insert a space after each comma in rewritten lists.
    pub space_after_comma: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            space_after_comma: true,
        }
    }
}

/// A site in the source: a byte offset or a `"line:col"` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SitePosition {
    Offset(usize),
    LineCol(String),
}

impl SitePosition {
    /// Byte offset in `source`, or `None` when the position is malformed or
    /// past the end of the buffer.
    pub fn resolve(&self, source: &str) -> Option<usize> {
        match self {
            SitePosition::Offset(offset) => (*offset < source.len()).then_some(*offset),
            SitePosition::LineCol(text) => {
                let (line, col) = text.split_once(':')?;
                let line: u32 = line.trim().parse().ok()?;
                let col: u32 = col.trim().parse().ok()?;
                line_start_offset(source, line)?;
                let offset = position_to_byte_offset_str(source, line, col);
                (offset < source.len()).then_some(offset)
            }
        }
    }
}

impl From<usize> for SitePosition {
    fn from(offset: usize) -> Self {
        SitePosition::Offset(offset)
    }
}

impl std::fmt::Display for SitePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SitePosition::Offset(offset) => write!(f, "offset {}", offset),
            SitePosition::LineCol(text) => write!(f, "{}", text),
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of running an operation over one buffer.
#[derive(Debug, Clone)]
pub struct RefactorOutcome {
    /// Edits against [`SOURCE_FILE`].
    pub patch: PatchSet,
    /// Sites left unchanged and other non-fatal findings.
    pub warnings: Vec<Warning>,
    /// Number of sites examined.
    pub sites_scanned: usize,
    /// Number of sites that received at least one edit.
    pub sites_changed: usize,
}

impl RefactorOutcome {
    fn new(file: &str) -> Self {
        RefactorOutcome {
            patch: PatchSet::new().with_file_path(SOURCE_FILE, file),
            warnings: Vec::new(),
            sites_scanned: 0,
            sites_changed: 0,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Location of `span` in `source` for warnings.
pub(crate) fn location_of(file: &str, source: &str, span: Span) -> Location {
    let (line, col) = byte_offset_to_position_str(source, span.start);
    Location::with_span(file, line, col, span.start, span.end)
}

/// Resolve, dedupe and sort site positions, reporting the ones that do not
/// land on an identifier.
pub(crate) fn resolve_sites(
    file: &str,
    source: &str,
    tokens: &[Token],
    positions: &[SitePosition],
    warnings: &mut Vec<Warning>,
) -> Vec<Token> {
    let mut sites: Vec<Token> = Vec::with_capacity(positions.len());
    for position in positions {
        let token = position
            .resolve(source)
            .and_then(|offset| identifier_at(tokens, source, offset));
        match token {
            Some(token) => sites.push(token),
            None => warnings.push(Warning::new(
                "no_identifier",
                format!("no identifier at {} in {}", position, file),
            )),
        }
    }
    sites.sort_by_key(|t| t.start());
    sites.dedup();
    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn position_resolution() {
        let source = "int a;\nfoo(a);\n";
        assert_eq!(SitePosition::Offset(7).resolve(source), Some(7));
        assert_eq!(SitePosition::LineCol("2:1".into()).resolve(source), Some(7));
        assert_eq!(SitePosition::LineCol("2:5".into()).resolve(source), Some(11));
        assert_eq!(SitePosition::LineCol("9:1".into()).resolve(source), None);
        assert_eq!(SitePosition::LineCol("two:1".into()).resolve(source), None);
        assert_eq!(SitePosition::Offset(100).resolve(source), None);
    }

    #[test]
    fn positions_deserialize_untagged() {
        let positions: Vec<SitePosition> = serde_json::from_str(r#"[12, "3:4"]"#).unwrap();
        assert_eq!(
            positions,
            vec![SitePosition::Offset(12), SitePosition::LineCol("3:4".into())]
        );
    }

    #[test]
    fn sites_are_sorted_and_deduplicated() {
        let source = "f(1); g(); f(2);";
        let tokens = lex(source);
        let mut warnings = Vec::new();
        let positions = vec![
            SitePosition::Offset(11),
            SitePosition::Offset(0),
            SitePosition::Offset(11),
            SitePosition::Offset(1),
        ];
        let sites = resolve_sites("a.cpp", source, &tokens, &positions, &mut warnings);
        let starts: Vec<usize> = sites.iter().map(|t| t.start()).collect();
        assert_eq!(starts, vec![0, 11]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "no_identifier");
    }

    #[test]
    fn sites_inside_macro_bodies_resolve() {
        let source = "void f(int a);\n#define CALL f(1)\n";
        let tokens = lex(source);
        let mut warnings = Vec::new();
        let call = source.rfind("f(").unwrap();
        let sites = resolve_sites(
            "a.cpp",
            source,
            &tokens,
            &[SitePosition::Offset(call)],
            &mut warnings,
        );
        assert!(warnings.is_empty());
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].span, Span::new(call, call + 1));
    }

    #[test]
    fn default_format_spaces_after_comma() {
        assert!(FormatOptions::default().space_after_comma);
        let parsed: FormatOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, FormatOptions::default());
    }
}

//! Replace direct field accesses with accessor calls.
//!
//! Reads become `getter()` and simple assignments `field = value` become
//! `setter(value)`. Compound updates and calls through the field are left
//! unchanged and reported, since they have no single-accessor equivalent.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use cxxsig_core::output::Warning;
use cxxsig_core::patch::{Anchor, Edit, EditLabels, Span};

use crate::field_access::{scan_field_access, AccessKind};
use crate::lexer::lex;
use crate::ops::{location_of, resolve_sites, RefactorOutcome, SitePosition, SOURCE_FILE};
use crate::validation::{validate_cpp_identifier, ValidationError};

const OPERATION: &str = "encapsulate-field";

/// Errors that stop an encapsulate-field run.
#[derive(Debug, Error)]
pub enum EncapsulateError {
    /// Neither accessor name was given.
    #[error("at least one of getter or setter is required")]
    NoAccessors,

    #[error("invalid accessor name: {0}")]
    InvalidName(#[from] ValidationError),

    /// None of the given positions is on an identifier.
    #[error("no field reference found")]
    NoSites,
}

/// Result type for encapsulate-field operations.
pub type EncapsulateResult<T> = Result<T, EncapsulateError>;

/// Input of an encapsulate-field run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncapsulateFieldRequest {
    #[serde(default)]
    pub getter: Option<String>,
    #[serde(default)]
    pub setter: Option<String>,
    /// Name tokens of the field references to rewrite.
    #[serde(default)]
    pub references: Vec<SitePosition>,
}

/// Validate accessor names before any scanning.
pub fn check_accessors(request: &EncapsulateFieldRequest) -> EncapsulateResult<()> {
    if request.getter.is_none() && request.setter.is_none() {
        return Err(EncapsulateError::NoAccessors);
    }
    for name in request.getter.iter().chain(request.setter.iter()) {
        validate_cpp_identifier(name)?;
    }
    Ok(())
}

/// Compute the edits for an encapsulate-field run over one buffer.
pub fn encapsulate_field(
    file: &str,
    source: &str,
    request: &EncapsulateFieldRequest,
) -> EncapsulateResult<RefactorOutcome> {
    check_accessors(request)?;

    let tokens = lex(source);
    let mut outcome = RefactorOutcome::new(file);
    let sites = resolve_sites(file, source, &tokens, &request.references, &mut outcome.warnings);
    if sites.is_empty() {
        return Err(EncapsulateError::NoSites);
    }

    let mut next_id = 0u32;
    let mut edit = |span: Span, text: String, reason: &str| {
        let before = source.get(span.start..span.end).unwrap_or_default();
        let anchor = Anchor::span_exact(span, before);
        let labels = EditLabels {
            refactor_op: Some(OPERATION.to_string()),
            reason: Some(reason.to_string()),
        };
        let edit = if span.is_empty() {
            Edit::insert(next_id, SOURCE_FILE, anchor, text)
        } else {
            Edit::replace(next_id, SOURCE_FILE, anchor, text)
        };
        next_id += 1;
        edit.with_labels(labels)
    };

    for site in &sites {
        outcome.sites_scanned += 1;
        let location = || location_of(file, source, site.span);

        let Some(access) = scan_field_access(&tokens, source, site.start()) else {
            continue;
        };
        debug!(offset = site.start(), kind = ?access.kind, "field access classified");

        match (&access.kind, &request.getter, &request.setter) {
            (AccessKind::Read, Some(getter), _) => {
                outcome
                    .patch
                    .push(edit(access.reference, format!("{}()", getter), "read through getter"));
                outcome.sites_changed += 1;
            }
            (AccessKind::Write { value }, _, Some(setter)) => {
                // `field = value` → `setter(value)`; the value keeps its own
                // edits, so only the text around it is replaced.
                let head = Span::new(access.reference.start, value.start);
                outcome
                    .patch
                    .push(edit(head, format!("{}(", setter), "write through setter"));
                outcome
                    .patch
                    .push(edit(Span::point(value.end), ")".to_string(), "write through setter"));
                outcome.sites_changed += 1;
            }
            (AccessKind::Read, None, _) => outcome.warnings.push(Warning::with_location(
                "no_getter",
                "field is read but no getter was given; left unchanged",
                location(),
            )),
            (AccessKind::Write { .. }, _, None) => outcome.warnings.push(Warning::with_location(
                "no_setter",
                "field is assigned but no setter was given; left unchanged",
                location(),
            )),
            (AccessKind::Update, _, _) => outcome.warnings.push(Warning::with_location(
                "compound_update",
                "compound assignment or increment of the field; left unchanged",
                location(),
            )),
            (AccessKind::Call, _, _) => outcome.warnings.push(Warning::with_location(
                "field_call",
                "field is called; left unchanged",
                location(),
            )),
        }
    }

    info!(
        file,
        references = sites.len(),
        edits = outcome.patch.edit_count(),
        warnings = outcome.warnings.len(),
        "encapsulate-field computed"
    );

    Ok(outcome)
}

//! Change the parameter list of a C/C++ function.
//!
//! The caller supplies the new parameter list and the positions of the
//! function's declarations and call sites. For each site the argument list is
//! located with the call-site scanner and rewritten:
//!
//! - declarations get the new parameter list, keeping the original text of
//!   parameters that were only moved
//! - call sites get their arguments reordered, dropped or extended with the
//!   default values of new parameters
//! - the name token is replaced when a new function name is given
//!
//! Sites whose argument list cannot be found (a function name used as a
//! value, for example) are left alone apart from the rename, and reported
//! as warnings.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use cxxsig_core::output::Warning;
use cxxsig_core::patch::{Anchor, Edit, EditLabels, Span};
use cxxsig_core::types::Problem;

use crate::lexer::lex;
use crate::ops::{location_of, resolve_sites, FormatOptions, RefactorOutcome, SitePosition, SOURCE_FILE};
use crate::scanner::{scan_tokens, CallSiteInfo};
use crate::token::Token;
use crate::validation::{is_cpp_keyword, validate_cpp_identifier, ValidationError};

const OPERATION: &str = "change-params";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that stop a change-parameters run.
#[derive(Debug, Error)]
pub enum ChangeParamsError {
    /// The new function name is not an identifier.
    #[error("invalid name: {0}")]
    InvalidName(#[from] ValidationError),

    /// One or more fatal precondition problems.
    #[error("precondition failed: {}", problems.iter().map(|p| p.message.as_str()).collect::<Vec<_>>().join("; "))]
    Precondition { problems: Vec<Problem> },

    /// None of the given positions is on an identifier.
    #[error("no declaration or call site found")]
    NoSites,
}

/// Result type for change-parameters operations.
pub type ChangeParamsResult<T> = Result<T, ChangeParamsError>;

// ============================================================================
// Request Types
// ============================================================================

/// One entry of the new parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Index in the original list; `None` for a new parameter.
    #[serde(default)]
    pub original_index: Option<usize>,
    /// Parameter name. Empty on a moved parameter keeps the declared name.
    #[serde(default)]
    pub name: String,
    /// Parameter type. Empty on a moved parameter keeps the declared type.
    #[serde(default, alias = "type")]
    pub type_name: String,
    /// Value passed at existing call sites for a new parameter.
    #[serde(default)]
    pub default_value: Option<String>,
}

impl ParameterInfo {
    /// A parameter moved from `index` in the original list.
    pub fn moved(index: usize) -> Self {
        ParameterInfo {
            original_index: Some(index),
            name: String::new(),
            type_name: String::new(),
            default_value: None,
        }
    }

    /// A new parameter.
    pub fn added(
        name: impl Into<String>,
        type_name: impl Into<String>,
        default_value: Option<String>,
    ) -> Self {
        ParameterInfo {
            original_index: None,
            name: name.into(),
            type_name: type_name.into(),
            default_value,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn is_new(&self) -> bool {
        self.original_index.is_none()
    }

    /// `...` as the name or a type ending in `...`.
    pub fn is_variadic(&self) -> bool {
        self.name.trim() == "..." || self.type_name.trim_end().ends_with("...")
    }
}

/// Input of a change-parameters run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeParametersRequest {
    /// New function name, if the function is renamed too.
    #[serde(default)]
    pub function_name: Option<String>,
    /// The complete new parameter list, in order.
    pub parameters: Vec<ParameterInfo>,
    /// Name tokens of declarations and definitions.
    #[serde(default)]
    pub declarations: Vec<SitePosition>,
    /// Name tokens of call sites and other references.
    #[serde(default)]
    pub references: Vec<SitePosition>,
}

// ============================================================================
// Precondition Checks
// ============================================================================

/// Check the new parameter list against the original one.
///
/// `original_arity` is the number of parameters the function had, when
/// known. `has_call_sites` makes a default value mandatory for new
/// parameters. Fatal problems stop the run; the rest become warnings.
pub fn check_parameters(
    request: &ChangeParametersRequest,
    original_arity: Option<usize>,
    has_call_sites: bool,
) -> Vec<Problem> {
    let mut problems = Vec::new();

    if let Some(name) = &request.function_name {
        if let Err(err) = validate_cpp_identifier(name) {
            problems.push(Problem::fatal(err.to_string()));
        }
    }

    let last = request.parameters.len().saturating_sub(1);
    let mut seen_indices = Vec::new();
    let mut seen_names: Vec<&str> = Vec::new();

    for (position, param) in request.parameters.iter().enumerate() {
        if param.is_variadic() {
            if position != last {
                problems.push(Problem::fatal(format!(
                    "variadic parameter must be last (found at position {})",
                    position
                )));
            }
        } else if !param.name.is_empty() || param.is_new() {
            match validate_cpp_identifier(&param.name) {
                Err(err) => problems.push(Problem::fatal(err.to_string())),
                Ok(()) if seen_names.contains(&param.name.as_str()) => problems.push(
                    Problem::fatal(format!("duplicate parameter name '{}'", param.name)),
                ),
                Ok(()) => seen_names.push(&param.name),
            }
        }

        match param.original_index {
            Some(index) => {
                if let Some(arity) = original_arity {
                    if index >= arity {
                        problems.push(Problem::fatal(format!(
                            "parameter index {} out of range (function has {} parameters)",
                            index, arity
                        )));
                    }
                }
                if seen_indices.contains(&index) {
                    problems.push(Problem::fatal(format!(
                        "original parameter {} used more than once",
                        index
                    )));
                }
                seen_indices.push(index);
            }
            None => {
                if param.type_name.trim().is_empty() {
                    problems.push(Problem::fatal(format!(
                        "new parameter '{}' needs a type",
                        param.name
                    )));
                }
                let has_default = param
                    .default_value
                    .as_deref()
                    .is_some_and(|v| !v.trim().is_empty());
                if has_call_sites && !has_default {
                    problems.push(Problem::fatal(format!(
                        "new parameter '{}' needs a default value for existing call sites",
                        param.name
                    )));
                }
            }
        }
    }

    if let Some(arity) = original_arity {
        for index in (0..arity).filter(|i| !seen_indices.contains(i)) {
            if has_call_sites {
                problems.push(Problem::warning(format!(
                    "parameter {} is removed; its arguments are dropped from call sites",
                    index
                )));
            }
        }
    }

    problems
}

// ============================================================================
// Declared Parameters
// ============================================================================

/// A declaration parameter split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeclaredParam<'a> {
    /// Everything before the name; the whole text for unnamed parameters.
    type_text: &'a str,
    /// Empty when the parameter is unnamed or could not be split.
    name: &'a str,
    /// Array extents after the name.
    suffix: &'a str,
    default: Option<&'a str>,
}

/// Type words that are never followed by the parameter name alone.
const TYPE_PREFIXES: &[&str] = &[
    "struct", "class", "enum", "union", "const", "volatile", "typename", "signed", "unsigned",
];

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Byte index of a top-level `=` that is an assignment, not a comparison.
fn top_level_assign(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let next = bytes.get(i + 1).copied();
                let comparison = matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) || next == Some(b'=');
                if !comparison {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_declared(text: &str) -> DeclaredParam<'_> {
    let text = text.trim();
    let (head, default) = match top_level_assign(text) {
        Some(i) => (text[..i].trim_end(), Some(text[i + 1..].trim())),
        None => (text, None),
    };
    let (core, suffix) = match head.find('[') {
        Some(i) if head.ends_with(']') => (head[..i].trim_end(), &head[i..]),
        _ => (head, ""),
    };

    let name_start = core
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(core.len());
    let name = &core[name_start..];
    let type_text = core[..name_start].trim_end();

    let named = !name.is_empty()
        && !type_text.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !is_cpp_keyword(name)
        && !type_text.ends_with("::")
        && !TYPE_PREFIXES.contains(&type_text);

    if named {
        DeclaredParam {
            type_text,
            name,
            suffix,
            default,
        }
    } else {
        DeclaredParam {
            type_text: head,
            name: "",
            suffix: "",
            default,
        }
    }
}

/// Split every parameter of a declaration; `(void)` has none.
fn declared_params(info: &CallSiteInfo) -> Vec<DeclaredParam<'_>> {
    if let [only] = info.arguments.as_slice() {
        if only.text.trim() == "void" {
            return Vec::new();
        }
    }
    info.arguments
        .iter()
        .map(|a| split_declared(&a.text))
        .collect()
}

fn same_type(a: &str, b: &str) -> bool {
    a.split_whitespace().eq(b.split_whitespace())
}

fn join_type_name(type_text: &str, name: &str) -> String {
    if name.is_empty() {
        type_text.to_string()
    } else if type_text.ends_with(['*', '&']) {
        format!("{}{}", type_text, name)
    } else {
        format!("{} {}", type_text, name)
    }
}

fn render_declared(raw: &str, declared: &DeclaredParam<'_>, param: &ParameterInfo) -> String {
    if param.is_variadic() && declared.type_text.trim() == "..." {
        return raw.to_string();
    }

    let wanted_type = param.type_name.trim();
    let keep_name = param.name.is_empty() || param.name == declared.name;
    let keep_type = wanted_type.is_empty() || same_type(wanted_type, declared.type_text);
    if keep_name && keep_type {
        return raw.to_string();
    }

    let type_text = if keep_type {
        declared.type_text
    } else {
        wanted_type
    };
    let name = if param.name.is_empty() {
        declared.name
    } else {
        param.name.as_str()
    };

    let mut text = join_type_name(type_text, name);
    text.push_str(declared.suffix);
    if let Some(default) = declared.default {
        text.push_str(" = ");
        text.push_str(default);
    }
    text
}

// ============================================================================
// List Rendering
// ============================================================================

/// Join list items into `( ... )`.
///
/// The first item is left-trimmed. A space follows each comma when
/// `space_after_comma` is set and the item does not start with whitespace.
fn join_list<S: AsRef<str>>(items: &[S], format: FormatOptions) -> String {
    let mut out = String::from("(");
    for (i, item) in items.iter().enumerate() {
        let item = item.as_ref();
        if i == 0 {
            out.push_str(item.trim_start());
            continue;
        }
        out.push(',');
        if format.space_after_comma && !item.is_empty() && !item.starts_with(char::is_whitespace) {
            out.push(' ');
        }
        out.push_str(item);
    }
    out.push(')');
    out
}

/// New parameter list text for a declaration.
pub fn build_parameter_list(
    info: &CallSiteInfo,
    params: &[ParameterInfo],
    format: FormatOptions,
) -> Result<String, String> {
    let declared = declared_params(info);
    let mut items = Vec::with_capacity(params.len());

    for param in params {
        let text = match param.original_index {
            Some(index) => {
                let (Some(argument), Some(parts)) = (info.argument(index), declared.get(index)) else {
                    return Err(format!(
                        "declaration has {} parameters; parameter {} does not exist",
                        declared.len(),
                        index
                    ));
                };
                render_declared(&argument.text, parts, param)
            }
            None if param.is_variadic() => "...".to_string(),
            None => join_type_name(param.type_name.trim(), &param.name),
        };
        items.push(text);
    }

    Ok(join_list(&items, format))
}

/// One argument of a rewritten call.
enum ArgumentItem<'a> {
    Written(&'a str),
    /// Filled from a declared default; dropped again when trailing.
    Implicit(&'a str),
}

/// What the original declaration says about its parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalSignature {
    /// Default argument text of each parameter.
    pub defaults: Vec<Option<String>>,
    /// Index of a trailing `...` parameter.
    pub variadic: Option<usize>,
}

impl OriginalSignature {
    fn from_declared(declared: &[DeclaredParam<'_>]) -> Self {
        OriginalSignature {
            defaults: declared
                .iter()
                .map(|d| d.default.map(str::to_string))
                .collect(),
            variadic: declared
                .iter()
                .position(|d| d.name.is_empty() && d.type_text.trim() == "..."),
        }
    }
}

/// New argument list text for a call site.
///
/// Arguments the call omits are filled from the declared defaults in
/// `original` when their parameter moves; trailing ones stay omitted.
pub fn build_argument_list(
    info: &CallSiteInfo,
    params: &[ParameterInfo],
    original: &OriginalSignature,
    format: FormatOptions,
) -> Result<String, String> {
    let mut items: Vec<ArgumentItem<'_>> = Vec::with_capacity(params.len());

    for param in params {
        match param.original_index {
            Some(index) if param.is_variadic() || original.variadic == Some(index) => {
                items.extend(
                    info.arguments
                        .iter()
                        .skip(index)
                        .map(|a| ArgumentItem::Written(a.text.as_str())),
                );
            }
            Some(index) => match info.argument(index) {
                Some(argument) => items.push(ArgumentItem::Written(&argument.text)),
                None => {
                    let fallback = original.defaults.get(index).and_then(|d| d.as_deref());
                    match fallback.or(param.default_value.as_deref()) {
                        Some(value) => items.push(ArgumentItem::Implicit(value)),
                        None => {
                            return Err(format!(
                                "call passes {} arguments; no value for parameter {}",
                                info.argument_count(),
                                index
                            ))
                        }
                    }
                }
            },
            None => match param.default_value.as_deref() {
                Some(value) => items.push(ArgumentItem::Written(value)),
                None => return Err(format!("no default value for new parameter '{}'", param.name)),
            },
        }
    }

    while matches!(items.last(), Some(ArgumentItem::Implicit(_))) {
        items.pop();
    }

    let texts: Vec<&str> = items
        .iter()
        .map(|item| match item {
            ArgumentItem::Written(text) | ArgumentItem::Implicit(text) => *text,
        })
        .collect();
    Ok(join_list(&texts, format))
}

// ============================================================================
// Operation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiteKind {
    Declaration,
    Reference,
}

struct Site {
    kind: SiteKind,
    name: Token,
    info: CallSiteInfo,
}

/// Compute the edits for a change-parameters run over one buffer.
pub fn change_parameters(
    file: &str,
    source: &str,
    request: &ChangeParametersRequest,
    format: FormatOptions,
) -> ChangeParamsResult<RefactorOutcome> {
    if let Some(name) = &request.function_name {
        validate_cpp_identifier(name)?;
    }

    let tokens = lex(source);
    let mut outcome = RefactorOutcome::new(file);

    let declarations = resolve_sites(file, source, &tokens, &request.declarations, &mut outcome.warnings);
    let mut references = resolve_sites(file, source, &tokens, &request.references, &mut outcome.warnings);
    references.retain(|r| !declarations.contains(r));
    if declarations.is_empty() && references.is_empty() {
        return Err(ChangeParamsError::NoSites);
    }

    let sites: Vec<Site> = declarations
        .iter()
        .map(|t| (SiteKind::Declaration, t))
        .chain(references.iter().map(|t| (SiteKind::Reference, t)))
        .map(|(kind, name)| Site {
            kind,
            name: *name,
            info: scan_tokens(&tokens, source, name.start()),
        })
        .collect();

    let declared: Option<Vec<DeclaredParam<'_>>> = sites
        .iter()
        .find(|s| s.kind == SiteKind::Declaration && s.info.is_valid())
        .map(|s| declared_params(&s.info));
    let original_arity = declared.as_ref().map(Vec::len).or_else(|| {
        sites
            .iter()
            .find(|s| s.info.is_valid())
            .map(|s| s.info.argument_count())
    });
    let original = declared
        .as_deref()
        .map(OriginalSignature::from_declared)
        .unwrap_or_default();

    let mut problems = check_parameters(request, original_arity, !references.is_empty());
    if let Some(variadic) = original.variadic {
        let position = request
            .parameters
            .iter()
            .position(|p| p.original_index == Some(variadic));
        if position.is_some_and(|p| p + 1 != request.parameters.len()) {
            problems.push(Problem::fatal(format!(
                "variadic parameter {} must stay last",
                variadic
            )));
        }
    }
    if problems.iter().any(|p| p.fatal) {
        return Err(ChangeParamsError::Precondition { problems });
    }
    outcome.warnings.extend(problems.iter().map(Warning::from));

    let mut next_id = 0u32;
    let mut push_edit = |outcome: &mut RefactorOutcome, span: Span, new_text: &str, reason: &str| {
        let old_text = source.get(span.start..span.end).unwrap_or_default();
        let edit = Edit::replace(next_id, SOURCE_FILE, Anchor::span_exact(span, old_text), new_text)
            .with_labels(EditLabels {
                refactor_op: Some(OPERATION.to_string()),
                reason: Some(reason.to_string()),
            });
        next_id += 1;
        outcome.patch.push(edit);
    };

    for site in &sites {
        outcome.sites_scanned += 1;
        let mut changed = false;
        let location = || location_of(file, source, site.name.span);

        if let Some(new_name) = &request.function_name {
            let old_name = source.get(site.name.start()..site.name.end()).unwrap_or_default();
            if old_name != new_name {
                push_edit(&mut outcome, site.name.span, new_name, "rename function");
                changed = true;
            }
        }

        if !site.info.is_valid() {
            warn!(
                file,
                offset = site.name.start(),
                "no argument list after reference; left as is"
            );
            outcome.warnings.push(Warning::with_location(
                "not_a_call",
                "reference is not followed by an argument list; arguments left unchanged",
                location(),
            ));
        } else {
            let rebuilt = match site.kind {
                SiteKind::Declaration => {
                    build_parameter_list(&site.info, &request.parameters, format)
                }
                SiteKind::Reference => build_argument_list(
                    &site.info,
                    &request.parameters,
                    &original,
                    format,
                ),
            };
            match rebuilt {
                Ok(text) if text != site.info.original_text => {
                    let reason = match site.kind {
                        SiteKind::Declaration => "rewrite parameter list",
                        SiteKind::Reference => "rewrite argument list",
                    };
                    push_edit(&mut outcome, site.info.argument_list_span(), &text, reason);
                    changed = true;
                }
                Ok(_) => {}
                Err(reason) => {
                    warn!(file, offset = site.name.start(), %reason, "site skipped");
                    outcome
                        .warnings
                        .push(Warning::with_location("site_skipped", reason, location()));
                }
            }
        }

        if changed {
            outcome.sites_changed += 1;
        }
    }

    info!(
        file,
        declarations = declarations.len(),
        references = references.len(),
        edits = outcome.patch.edit_count(),
        warnings = outcome.warnings.len(),
        "change-params computed"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxsig_core::patch::ApplyResult;
    use std::collections::HashMap;

    fn offsets(source: &str, needle: &str) -> Vec<SitePosition> {
        source
            .match_indices(needle)
            .map(|(i, _)| SitePosition::Offset(i))
            .collect()
    }

    fn request(
        source: &str,
        decl_needle: &str,
        ref_needle: &str,
        parameters: Vec<ParameterInfo>,
    ) -> ChangeParametersRequest {
        ChangeParametersRequest {
            function_name: None,
            parameters,
            declarations: offsets(source, decl_needle),
            references: offsets(source, ref_needle),
        }
    }

    fn apply(source: &str, outcome: &RefactorOutcome) -> String {
        let files: HashMap<_, _> = [(SOURCE_FILE, source.to_string())].into();
        match outcome.patch.apply(&files) {
            ApplyResult::Success { mut modified_files } => modified_files
                .remove(&SOURCE_FILE)
                .unwrap_or_else(|| source.to_string()),
            ApplyResult::Failed { conflicts } => panic!("apply failed: {:?}", conflicts),
        }
    }

    fn run(source: &str, request: &ChangeParametersRequest) -> (String, RefactorOutcome) {
        let outcome = change_parameters("t.cpp", source, request, FormatOptions::default()).unwrap();
        (apply(source, &outcome), outcome)
    }

    const SOURCE: &str = "void f(int a, int b);\nvoid g() { f(1, 2); }\n";

    mod rewrites {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn reorder() {
            let req = request(SOURCE, "f(int", "f(1", vec![ParameterInfo::moved(1), ParameterInfo::moved(0)]);
            let (result, outcome) = run(SOURCE, &req);
            assert_eq!(result, "void f(int b, int a);\nvoid g() { f(2, 1); }\n");
            assert_eq!(outcome.sites_changed, 2);
            assert!(outcome.warnings.is_empty());
        }

        #[test]
        fn add_parameter_with_default() {
            let req = request(
                SOURCE,
                "f(int",
                "f(1",
                vec![
                    ParameterInfo::moved(0),
                    ParameterInfo::moved(1),
                    ParameterInfo::added("c", "bool", Some("false".into())),
                ],
            );
            let (result, _) = run(SOURCE, &req);
            assert_eq!(result, "void f(int a, int b, bool c);\nvoid g() { f(1, 2, false); }\n");
        }

        #[test]
        fn remove_parameter_warns() {
            let req = request(SOURCE, "f(int", "f(1", vec![ParameterInfo::moved(0)]);
            let (result, outcome) = run(SOURCE, &req);
            assert_eq!(result, "void f(int a);\nvoid g() { f(1); }\n");
            assert_eq!(outcome.warnings.len(), 1);
            assert!(outcome.warnings[0].message.contains("parameter 1 is removed"));
        }

        #[test]
        fn rename_and_retype() {
            let req = request(
                SOURCE,
                "f(int",
                "f(1",
                vec![
                    ParameterInfo::moved(0).with_type("long"),
                    ParameterInfo::moved(1).with_name("count"),
                ],
            );
            let (result, _) = run(SOURCE, &req);
            assert_eq!(result, "void f(long a, int count);\nvoid g() { f(1, 2); }\n");
        }

        #[test]
        fn unchanged_list_produces_no_edit() {
            let req = request(SOURCE, "f(int", "f(1", vec![ParameterInfo::moved(0), ParameterInfo::moved(1)]);
            let (_, outcome) = run(SOURCE, &req);
            assert!(!outcome.patch.has_edits());
            assert_eq!(outcome.sites_scanned, 2);
            assert_eq!(outcome.sites_changed, 0);
        }

        #[test]
        fn function_rename() {
            let mut req = request(SOURCE, "f(int", "f(1", vec![ParameterInfo::moved(0), ParameterInfo::moved(1)]);
            req.function_name = Some("h".into());
            let (result, _) = run(SOURCE, &req);
            assert_eq!(result, "void h(int a, int b);\nvoid g() { h(1, 2); }\n");
        }

        #[test]
        fn without_space_after_comma() {
            let req = request(
                SOURCE,
                "f(int",
                "f(1",
                vec![
                    ParameterInfo::moved(0),
                    ParameterInfo::moved(1),
                    ParameterInfo::added("c", "int", Some("0".into())),
                ],
            );
            let format = FormatOptions {
                space_after_comma: false,
            };
            let outcome = change_parameters("t.cpp", SOURCE, &req, format).unwrap();
            assert_eq!(
                apply(SOURCE, &outcome),
                "void f(int a, int b,int c);\nvoid g() { f(1, 2,0); }\n"
            );
        }

        #[test]
        fn nested_and_template_arguments() {
            let source = "void f(int a, int b);\nf<T>(g(1, 2), {3, 4});\n";
            let req = request(source, "f(int", "f<T>", vec![ParameterInfo::moved(1), ParameterInfo::moved(0)]);
            let (result, _) = run(source, &req);
            assert_eq!(result, "void f(int b, int a);\nf<T>({3, 4}, g(1, 2));\n");
        }

        #[test]
        fn multiline_arguments_keep_layout() {
            let source = "void f(int a, int b);\nf(first,\n  second);\n";
            let req = request(source, "f(int", "f(first", vec![ParameterInfo::moved(1), ParameterInfo::moved(0)]);
            let (result, _) = run(source, &req);
            assert_eq!(result, "void f(int b, int a);\nf(second, first);\n");
        }

        #[test]
        fn operator_declaration_and_call() {
            let source = "V operator+(const V& a, int b);\nV c = operator+(x, 2);\n";
            let req = request(
                source,
                "operator+(const",
                "operator+(x",
                vec![ParameterInfo::moved(1), ParameterInfo::moved(0)],
            );
            let (result, outcome) = run(source, &req);
            assert_eq!(result, "V operator+(int b, const V& a);\nV c = operator+(2, x);\n");
            assert!(outcome.warnings.is_empty());
        }

        #[test]
        fn member_operator_call() {
            let source = "struct V { V operator+(const V& o) const; };\nV c = a.operator+(b);\n";
            let req = request(
                source,
                "operator+(const",
                "operator+(b",
                vec![
                    ParameterInfo::moved(0),
                    ParameterInfo::added("scale", "int", Some("1".into())),
                ],
            );
            let (result, outcome) = run(source, &req);
            assert_eq!(
                result,
                "struct V { V operator+(const V& o, int scale) const; };\nV c = a.operator+(b, 1);\n"
            );
            assert_eq!(outcome.sites_changed, 2);
        }

        #[test]
        fn call_inside_macro_body() {
            let source = "void f(int a, int b);\n#define CALL f(1, 2)\nint y = 0;\n";
            let req = request(source, "f(int", "f(1", vec![ParameterInfo::moved(1), ParameterInfo::moved(0)]);
            let (result, outcome) = run(source, &req);
            assert_eq!(result, "void f(int b, int a);\n#define CALL f(2, 1)\nint y = 0;\n");
            assert_eq!(outcome.patch.edit_count(), 2);
            assert!(outcome.warnings.is_empty());
        }
    }

    mod defaults_and_variadics {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn omitted_default_argument_stays_omitted() {
            let source = "void f(int a, int b = 2);\nf(1);\n";
            let req = request(
                source,
                "f(int",
                "f(1",
                vec![ParameterInfo::moved(0), ParameterInfo::moved(1).with_name("bb")],
            );
            let (result, _) = run(source, &req);
            assert_eq!(result, "void f(int a, int bb = 2);\nf(1);\n");
        }

        #[test]
        fn omitted_default_argument_moves_forward() {
            let source = "void f(int a, int b = 2);\nf(1);\n";
            let req = request(source, "f(int", "f(1", vec![ParameterInfo::moved(1), ParameterInfo::moved(0)]);
            let (result, _) = run(source, &req);
            assert_eq!(result, "void f(int b = 2, int a);\nf(2, 1);\n");
        }

        #[test]
        fn variadic_arguments_follow_the_variadic_parameter() {
            let source = "int log(const char *fmt, ...);\nlog(\"%d %d\", 1, 2);\n";
            let req = request(
                source,
                "log(const",
                "log(\"",
                vec![
                    ParameterInfo::added("level", "int", Some("0".into())),
                    ParameterInfo::moved(0),
                    ParameterInfo::moved(1),
                ],
            );
            let (result, _) = run(source, &req);
            assert_eq!(
                result,
                "int log(int level, const char *fmt, ...);\nlog(0, \"%d %d\", 1, 2);\n"
            );
        }

        #[test]
        fn moved_variadic_must_stay_last() {
            let source = "int log(const char *fmt, ...);\n";
            let req = request(
                source,
                "log(",
                "nothing",
                vec![ParameterInfo::moved(1), ParameterInfo::moved(0)],
            );
            let err = change_parameters("t.cpp", source, &req, FormatOptions::default()).unwrap_err();
            assert!(err.to_string().contains("variadic parameter 1 must stay last"));
        }

        #[test]
        fn void_parameter_list() {
            let source = "int now(void);\nint t = now();\n";
            let req = request(
                source,
                "now(void",
                "now()",
                vec![ParameterInfo::added("utc", "bool", Some("true".into()))],
            );
            let (result, _) = run(source, &req);
            assert_eq!(result, "int now(bool utc);\nint t = now(true);\n");
        }
    }

    mod fallbacks {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn function_pointer_reference_is_left_alone() {
            let source = "void f(int a);\nauto p = f;\nf(1);\n";
            let req = request(
                source,
                "f(int",
                "f;",
                vec![ParameterInfo::moved(0), ParameterInfo::added("b", "int", Some("0".into()))],
            );
            let (result, outcome) = run(source, &req);
            assert_eq!(result, "void f(int a, int b);\nauto p = f;\nf(1);\n");
            assert_eq!(outcome.warnings.len(), 1);
            assert_eq!(outcome.warnings[0].code, "not_a_call");
            assert_eq!(outcome.warnings[0].location.as_ref().unwrap().line, 2);
        }

        #[test]
        fn function_pointer_reference_still_renamed() {
            let source = "void f(int a);\nauto p = f;\n";
            let mut req = request(source, "f(int", "f;", vec![ParameterInfo::moved(0)]);
            req.function_name = Some("run".into());
            let (result, _) = run(source, &req);
            assert_eq!(result, "void run(int a);\nauto p = run;\n");
        }

        #[test]
        fn positions_off_identifiers_warn() {
            let mut req = request(SOURCE, "f(int", "f(1", vec![ParameterInfo::moved(0), ParameterInfo::moved(1)]);
            req.references.push(SitePosition::LineCol("1:5".into()));
            let outcome = change_parameters("t.cpp", SOURCE, &req, FormatOptions::default()).unwrap();
            assert_eq!(outcome.warnings.len(), 1);
            assert_eq!(outcome.warnings[0].code, "no_identifier");
        }

        #[test]
        fn no_sites_is_an_error() {
            let req = ChangeParametersRequest {
                parameters: vec![],
                references: vec![SitePosition::Offset(4)],
                ..Default::default()
            };
            let err = change_parameters("t.cpp", "  ;  ;", &req, FormatOptions::default()).unwrap_err();
            assert!(matches!(err, ChangeParamsError::NoSites));
        }
    }

    mod preconditions {
        use super::*;
        use pretty_assertions::assert_eq;

        fn fatal_messages(req: &ChangeParametersRequest) -> Vec<String> {
            match change_parameters("t.cpp", SOURCE, req, FormatOptions::default()) {
                Err(ChangeParamsError::Precondition { problems }) => problems
                    .into_iter()
                    .filter(|p| p.fatal)
                    .map(|p| p.message)
                    .collect(),
                other => panic!("expected precondition failure, got {:?}", other.map(|o| o.patch)),
            }
        }

        #[test]
        fn new_parameter_needs_default_when_called() {
            let req = request(
                SOURCE,
                "f(int",
                "f(1",
                vec![ParameterInfo::moved(0), ParameterInfo::moved(1), ParameterInfo::added("c", "int", None)],
            );
            let messages = fatal_messages(&req);
            assert_eq!(messages, vec!["new parameter 'c' needs a default value for existing call sites"]);
        }

        #[test]
        fn new_parameter_without_call_sites_needs_no_default() {
            let req = request(
                SOURCE,
                "f(int",
                "nothing",
                vec![ParameterInfo::moved(0), ParameterInfo::moved(1), ParameterInfo::added("c", "int", None)],
            );
            let (result, _) = run(SOURCE, &req);
            assert!(result.starts_with("void f(int a, int b, int c);"));
        }

        #[test]
        fn index_out_of_range() {
            let req = request(SOURCE, "f(int", "f(1", vec![ParameterInfo::moved(5)]);
            let messages = fatal_messages(&req);
            assert!(messages[0].contains("index 5 out of range"));
        }

        #[test]
        fn repeated_index_and_duplicate_names() {
            let req = request(
                SOURCE,
                "f(int",
                "f(1",
                vec![
                    ParameterInfo::moved(0).with_name("x"),
                    ParameterInfo::moved(0).with_name("x"),
                ],
            );
            let messages = fatal_messages(&req);
            assert!(messages.iter().any(|m| m.contains("duplicate parameter name 'x'")));
            assert!(messages.iter().any(|m| m.contains("used more than once")));
        }

        #[test]
        fn variadic_must_be_last() {
            let problems = check_parameters(
                &ChangeParametersRequest {
                    parameters: vec![
                        ParameterInfo::moved(1).with_type("..."),
                        ParameterInfo::moved(0),
                    ],
                    ..Default::default()
                },
                Some(2),
                false,
            );
            assert!(problems.iter().any(|p| p.fatal && p.message.contains("variadic")));
        }

        #[test]
        fn new_parameter_needs_type_and_valid_name() {
            let problems = check_parameters(
                &ChangeParametersRequest {
                    parameters: vec![ParameterInfo::added("class", "", Some("1".into()))],
                    ..Default::default()
                },
                Some(0),
                true,
            );
            let fatal: Vec<_> = problems.iter().filter(|p| p.fatal).collect();
            assert_eq!(fatal.len(), 2);
        }

        #[test]
        fn invalid_function_name() {
            let mut req = request(SOURCE, "f(int", "f(1", vec![ParameterInfo::moved(0)]);
            req.function_name = Some("new".into());
            let err = change_parameters("t.cpp", SOURCE, &req, FormatOptions::default()).unwrap_err();
            assert!(matches!(err, ChangeParamsError::InvalidName(_)));
        }
    }

    mod declared_parts {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn split_simple_and_pointer() {
            let p = split_declared("int x");
            assert_eq!((p.type_text, p.name), ("int", "x"));
            let p = split_declared(" const char *fmt");
            assert_eq!((p.type_text, p.name), ("const char *", "fmt"));
        }

        #[test]
        fn split_default_and_array() {
            let p = split_declared("int n[4] = {}");
            assert_eq!((p.type_text, p.name, p.suffix, p.default), ("int", "n", "[4]", Some("{}")));
            let p = split_declared("bool eq = a == b");
            assert_eq!(p.default, Some("a == b"));
        }

        #[test]
        fn unnamed_parameters() {
            assert_eq!(split_declared("int").name, "");
            assert_eq!(split_declared("unsigned long").name, "");
            assert_eq!(split_declared("std::string").name, "");
            assert_eq!(split_declared("const Foo").name, "");
            assert_eq!(split_declared("void (*cb)(int)").name, "");
            assert_eq!(split_declared("...").type_text, "...");
        }

        #[test]
        fn request_parses_from_json() {
            let json = r#"{
                "function_name": "resize",
                "parameters": [
                    {"original_index": 1},
                    {"name": "fill", "type": "char", "default_value": "' '"}
                ],
                "declarations": ["1:6"],
                "references": [40, 77]
            }"#;
            let req: ChangeParametersRequest = serde_json::from_str(json).unwrap();
            assert_eq!(req.parameters[0], ParameterInfo::moved(1));
            assert_eq!(req.parameters[1].type_name, "char");
            assert_eq!(req.references.len(), 2);
        }
    }
}

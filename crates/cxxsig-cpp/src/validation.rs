//! C/C++ identifier validation.
//!
//! Names supplied by callers (new function names, parameter names, accessor
//! names) are checked before any edit is produced.

use thiserror::Error;

/// Error for validation failures.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Invalid C/C++ identifier.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// C++ keywords and alternative operator tokens that cannot be identifiers.
pub const CPP_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class", "co_await", "co_return",
    "co_yield", "compl", "concept", "const", "const_cast", "consteval", "constexpr", "constinit",
    "continue", "decltype", "default", "delete", "do", "double", "dynamic_cast", "else", "enum",
    "explicit", "export", "extern", "false", "float", "for", "friend", "goto", "if", "inline",
    "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq", "nullptr",
    "operator", "or", "or_eq", "private", "protected", "public", "register", "reinterpret_cast",
    "requires", "return", "short", "signed", "sizeof", "static", "static_assert", "static_cast",
    "struct", "switch", "template", "this", "thread_local", "throw", "true", "try", "typedef",
    "typeid", "typename", "union", "unsigned", "using", "virtual", "void", "volatile", "wchar_t",
    "while", "xor", "xor_eq",
];

/// Check if a name is a C++ keyword.
pub fn is_cpp_keyword(name: &str) -> bool {
    CPP_KEYWORDS.contains(&name)
}

/// Validate that a string is a valid C/C++ identifier.
///
/// Checks:
/// - Non-empty
/// - Starts with an ASCII letter or underscore
/// - Contains only ASCII alphanumerics and underscores
/// - Not a C++ keyword
///
/// # Examples
///
/// ```
/// use cxxsig_cpp::validation::validate_cpp_identifier;
///
/// assert!(validate_cpp_identifier("getCount").is_ok());
/// assert!(validate_cpp_identifier("_impl").is_ok());
/// assert!(validate_cpp_identifier("").is_err());
/// assert!(validate_cpp_identifier("2nd").is_err());
/// assert!(validate_cpp_identifier("class").is_err());
/// ```
pub fn validate_cpp_identifier(name: &str) -> ValidationResult<()> {
    let invalid = |reason: String| ValidationError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("name cannot be empty".to_string()));
    };

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(invalid("must start with letter or underscore".to_string()));
    }

    if let Some(ch) = chars.find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_') {
        return Err(invalid(format!("invalid character: '{}'", ch)));
    }

    if is_cpp_keyword(name) {
        return Err(invalid("cannot use C++ keyword as identifier".to_string()));
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

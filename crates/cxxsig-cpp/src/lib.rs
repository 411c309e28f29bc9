//! C/C++ language support for cxxsig.
//!
//! This crate provides C/C++-specific refactoring support:
//! - Token model and a logos-based lexer
//! - A token-processor driver with preprocessor-directive handling
//! - The call-site parameter scanner used to rewrite argument lists
//! - A field-access scanner used to route field accesses through accessors
//! - Change-parameters and encapsulate-field operations producing patch sets

pub mod field_access;
pub mod lexer;
pub mod ops;
pub mod processor;
pub mod scanner;
pub mod token;
pub mod validation;

// Converts the errors above into CxxsigError
mod error_bridges;

pub use field_access::{scan_field_access, AccessKind, FieldAccess};
pub use scanner::{scan_call_site, scan_source, scan_tokens, ArgumentSpan, CallSiteInfo};
pub use token::{SourceText, Token, TokenKind};

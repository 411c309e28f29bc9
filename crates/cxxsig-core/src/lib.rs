//! Core infrastructure for cxxsig.
//!
//! This crate provides the language-agnostic pieces every refactoring shares:
//! - Patch IR for representing text edits (spans, anchors, patch sets)
//! - Text utilities for byte offset and line:column conversions
//! - Unified diff generation
//! - Error types and error codes
//! - JSON output types for CLI responses

pub mod diff;
pub mod error;
pub mod output;
pub mod patch;
pub mod text;
pub mod types;

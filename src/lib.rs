//! cxxsig: call-site aware C/C++ signature refactoring
//!
//! Rewrites function signatures together with every call site that passes
//! arguments to them, and routes direct field accesses through accessors.
//! All results are patch sets with a unified diff; nothing is written unless
//! asked.

// Core infrastructure - re-exported from cxxsig-core
pub use cxxsig_core::diff;
pub use cxxsig_core::error;
pub use cxxsig_core::output;
pub use cxxsig_core::patch;
pub use cxxsig_core::text;
pub use cxxsig_core::types;

// Language adapter
pub use cxxsig_cpp as cpp;

// Front door
pub mod cli;
pub mod config;

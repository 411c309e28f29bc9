//! Error bridge implementations for C/C++ operation errors.
//!
//! This module provides `impl From<X> for CxxsigError` conversions from the
//! error types of this crate to the unified `CxxsigError` type rendered by the
//! CLI. They live here rather than in `cxxsig-core` because the source types
//! are C/C++-specific.

use cxxsig_core::error::CxxsigError;

use crate::ops::change_params::ChangeParamsError;
use crate::ops::encapsulate_field::EncapsulateError;
use crate::validation::ValidationError;

// ============================================================================
// Bridge: ValidationError -> CxxsigError
// ============================================================================

impl From<ValidationError> for CxxsigError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidName { name, reason } => {
                CxxsigError::InvalidIdentifier { name, reason }
            }
        }
    }
}

// ============================================================================
// Bridge: ChangeParamsError -> CxxsigError
// ============================================================================

impl From<ChangeParamsError> for CxxsigError {
    fn from(err: ChangeParamsError) -> Self {
        match err {
            ChangeParamsError::InvalidName(validation_err) => CxxsigError::from(validation_err),
            ChangeParamsError::Precondition { problems } => {
                CxxsigError::PreconditionFailed { problems }
            }
            err @ ChangeParamsError::NoSites => CxxsigError::invalid_args(err.to_string()),
        }
    }
}

// ============================================================================
// Bridge: EncapsulateError -> CxxsigError
// ============================================================================

impl From<EncapsulateError> for CxxsigError {
    fn from(err: EncapsulateError) -> Self {
        match err {
            EncapsulateError::InvalidName(validation_err) => CxxsigError::from(validation_err),
            err @ (EncapsulateError::NoAccessors | EncapsulateError::NoSites) => {
                CxxsigError::invalid_args(err.to_string())
            }
        }
    }
}

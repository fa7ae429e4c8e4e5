//! Error types and error code constants for csfix.
//!
//! This module provides a unified error type (`CsfixError`) that bridges
//! domain-specific errors from the parser, the refactoring operations and the
//! patch engine into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, nothing to refactor at the caret)
//! - `4`: Apply errors (failed to apply changes)
//! - `5`: Verification failed (result no longer parses)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

pub use crate::types::Location;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file not found, refactoring not applicable).
    ResolutionError = 3,
    /// Apply errors (failed to write changes, stale anchors).
    ApplyError = 4,
    /// Verification failed (edited file does not reparse).
    VerificationFailed = 5,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum CsfixError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The refactoring does not apply at the requested location.
    #[error("nothing to refactor at {file}:{line}:{col}: {reason}")]
    NothingToRefactor {
        file: String,
        line: u32,
        col: u32,
        reason: String,
        /// Stable machine-readable reason, when the operation has one.
        reason_code: Option<String>,
    },

    /// Failed to apply changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Verification failed after applying changes.
    #[error("verification failed ({mode}): {output}")]
    VerificationFailed { mode: String, output: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&CsfixError> for OutputErrorCode {
    fn from(err: &CsfixError) -> Self {
        match err {
            CsfixError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            CsfixError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            CsfixError::NothingToRefactor { .. } => OutputErrorCode::ResolutionError,
            CsfixError::ApplyError { .. } => OutputErrorCode::ApplyError,
            CsfixError::VerificationFailed { .. } => OutputErrorCode::VerificationFailed,
            CsfixError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<CsfixError> for OutputErrorCode {
    fn from(err: CsfixError) -> Self {
        OutputErrorCode::from(&err)
    }
}

impl From<std::io::Error> for CsfixError {
    fn from(err: std::io::Error) -> Self {
        CsfixError::InternalError {
            message: format!("IO error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl CsfixError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        CsfixError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        CsfixError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a not-applicable error for a caret location.
    pub fn nothing_to_refactor(location: &Location, reason: impl Into<String>) -> Self {
        CsfixError::NothingToRefactor {
            file: location.file.clone(),
            line: location.line,
            col: location.col,
            reason: reason.into(),
            reason_code: None,
        }
    }

    /// Attach a machine-readable reason code to a `NothingToRefactor` error.
    /// Other variants are returned unchanged.
    pub fn with_reason_code(mut self, code: impl Into<String>) -> Self {
        if let CsfixError::NothingToRefactor { reason_code, .. } = &mut self {
            *reason_code = Some(code.into());
        }
        self
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        CsfixError::FileNotFound { path: path.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CsfixError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn nothing_to_refactor_maps_to_resolution_error() {
            let loc = Location::new("Widget.cs", 4, 18);
            let err = CsfixError::nothing_to_refactor(&loc, "type already exists");
            assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn invalid_arguments_maps_to_invalid_arguments() {
            let err = CsfixError::invalid_args("bad location");
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn apply_and_verification_codes() {
            let apply = CsfixError::ApplyError {
                message: "stale anchor".to_string(),
                file: Some("a.cs".to_string()),
            };
            assert_eq!(apply.error_code().code(), 4);

            let verify = CsfixError::VerificationFailed {
                mode: "syntax".to_string(),
                output: "unexpected token".to_string(),
            };
            assert_eq!(verify.error_code().code(), 5);
        }

        #[test]
        fn io_errors_are_internal() {
            let err: CsfixError = std::io::Error::other("disk on fire").into();
            assert_eq!(err.error_code(), OutputErrorCode::InternalError);
        }

        #[test]
        fn file_not_found_maps_to_resolution_error() {
            let err = CsfixError::file_not_found("missing.cs");
            assert_eq!(OutputErrorCode::from(err), OutputErrorCode::ResolutionError);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn nothing_to_refactor_display() {
            let loc = Location::new("Widget.cs", 4, 18);
            let err = CsfixError::nothing_to_refactor(&loc, "caret is not in an event field");
            assert_eq!(
                err.to_string(),
                "nothing to refactor at Widget.cs:4:18: caret is not in an event field"
            );
        }

        #[test]
        fn verification_failed_display() {
            let err = CsfixError::VerificationFailed {
                mode: "syntax".to_string(),
                output: "expected '}'".to_string(),
            };
            assert_eq!(err.to_string(), "verification failed (syntax): expected '}'");
        }
    }

    #[test]
    fn code_values_are_stable() {
        assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
        assert_eq!(OutputErrorCode::ResolutionError.code(), 3);
        assert_eq!(OutputErrorCode::ApplyError.code(), 4);
        assert_eq!(OutputErrorCode::VerificationFailed.code(), 5);
        assert_eq!(OutputErrorCode::InternalError.code(), 10);
        assert_eq!(format!("{}", OutputErrorCode::InternalError), "10");
    }
}

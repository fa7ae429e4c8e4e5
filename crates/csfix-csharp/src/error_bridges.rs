// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error bridge implementations for C# errors.
//!
//! `impl From<X> for CsfixError` conversions from this crate's error types
//! to the unified `CsfixError`. They live here rather than in the front door
//! because the orphan rule needs the source type to be local.

use csfix_core::error::CsfixError;

use crate::analyzer::NotApplicableInfo;
use crate::files::FileError;
use crate::ops::create_delegate::CreateDelegateError;
use crate::verification::VerificationError;

// ============================================================================
// Bridge: FileError -> CsfixError
// ============================================================================

impl From<FileError> for CsfixError {
    fn from(err: FileError) -> Self {
        let err_text = err.to_string();
        match err {
            FileError::NotFound { path } => CsfixError::FileNotFound { path },
            FileError::InvalidUtf8 { .. } => CsfixError::invalid_args(err_text),
            FileError::Io(e) => CsfixError::internal(format!("IO error: {}", e)),
        }
    }
}

// ============================================================================
// Bridge: VerificationError -> CsfixError
// ============================================================================

impl From<VerificationError> for CsfixError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Failed { output, .. } => CsfixError::VerificationFailed {
                mode: "syntax".to_string(),
                output,
            },
            VerificationError::Io(e) => CsfixError::internal(format!("IO error: {}", e)),
        }
    }
}

// ============================================================================
// Bridge: CreateDelegateError -> CsfixError
// ============================================================================

impl From<CreateDelegateError> for CsfixError {
    fn from(err: CreateDelegateError) -> Self {
        match err {
            CreateDelegateError::NotApplicable { location, reason } => {
                let info = NotApplicableInfo::from(&reason);
                CsfixError::nothing_to_refactor(&location, info.message)
                    .with_reason_code(info.reason)
            }
            CreateDelegateError::FileNotFound { path } => CsfixError::FileNotFound { path },
            CreateDelegateError::Conflict { file, .. } => {
                let message = err_message_for_conflict(&file);
                CsfixError::ApplyError {
                    message,
                    file: Some(file),
                }
            }
            CreateDelegateError::VerificationFailed { output, .. } => {
                CsfixError::VerificationFailed {
                    mode: "syntax".to_string(),
                    output,
                }
            }
            // Reads happen before any edit; an IO error here is the write.
            CreateDelegateError::Io(e) => CsfixError::ApplyError {
                message: format!("failed to write changes: {}", e),
                file: None,
            },
            CreateDelegateError::File(e) => CsfixError::from(e),
        }
    }
}

fn err_message_for_conflict(file: &str) -> String {
    format!("{} changed since the edit was computed", file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::NotApplicable;
    use csfix_core::output::ErrorInfo;
    use crate::verification::VerificationStatus;
    use csfix_core::error::OutputErrorCode;
    use csfix_core::types::Location;
    use std::io;

    #[test]
    fn not_applicable_is_a_resolution_error() {
        let err = CreateDelegateError::NotApplicable {
            location: Location::new("A.cs", 3, 9),
            reason: NotApplicable::AccessorStyleEvent,
        };
        let csfix = CsfixError::from(err);
        assert_eq!(csfix.error_code(), OutputErrorCode::ResolutionError);
        assert_eq!(
            csfix.to_string(),
            "nothing to refactor at A.cs:3:9: event declares add/remove accessors"
        );
        let info = ErrorInfo::from_error(&csfix);
        assert_eq!(
            info.details.unwrap()["reason_code"],
            "accessor_style_event"
        );
    }

    #[test]
    fn exit_codes_per_variant() {
        let cases = [
            (
                CreateDelegateError::FileNotFound {
                    path: "A.cs".to_string(),
                },
                OutputErrorCode::ResolutionError,
            ),
            (
                CreateDelegateError::Conflict {
                    file: "A.cs".to_string(),
                    conflicts: Vec::new(),
                },
                OutputErrorCode::ApplyError,
            ),
            (
                CreateDelegateError::VerificationFailed {
                    status: VerificationStatus::Failed,
                    output: "A.cs:1:1: bad".to_string(),
                },
                OutputErrorCode::VerificationFailed,
            ),
            (
                CreateDelegateError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "ro")),
                OutputErrorCode::ApplyError,
            ),
            (
                CreateDelegateError::File(FileError::NotFound {
                    path: "B.cs".to_string(),
                }),
                OutputErrorCode::ResolutionError,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(CsfixError::from(err).error_code(), code);
        }
    }

    #[test]
    fn non_utf8_target_is_invalid_arguments() {
        let csfix = CsfixError::from(FileError::InvalidUtf8 {
            path: "Latin1.cs".to_string(),
        });
        assert_eq!(csfix.error_code(), OutputErrorCode::InvalidArguments);
        assert!(csfix.to_string().contains("Latin1.cs is not valid UTF-8"));
    }
}

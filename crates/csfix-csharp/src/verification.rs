// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C# code verification.
//!
//! Verification re-parses edited sources before anything is written. A
//! failed check blocks the write.

use std::io;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use csfix_core::text::byte_offset_to_position_str;
use csfix_cst::parse_file;

// ============================================================================
// Types
// ============================================================================

/// Verification mode for C# operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// No verification.
    None,
    /// Re-parse every edited file.
    #[default]
    Syntax,
}

/// Status of verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// All checks passed.
    Passed,
    /// One or more checks failed.
    Failed,
    /// Verification was skipped.
    Skipped,
}

/// Result of a single verification check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCheck {
    /// Check name.
    pub name: String,
    /// Check status.
    pub status: VerificationStatus,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Diagnostic output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Result of verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Overall status.
    pub status: VerificationStatus,
    /// Verification mode used.
    pub mode: VerificationMode,
    /// Individual checks.
    pub checks: Vec<VerificationCheck>,
}

impl VerificationResult {
    /// Create a passed result.
    pub fn passed(mode: VerificationMode, checks: Vec<VerificationCheck>) -> Self {
        VerificationResult {
            status: VerificationStatus::Passed,
            mode,
            checks,
        }
    }

    /// Create a failed result.
    pub fn failed(mode: VerificationMode, checks: Vec<VerificationCheck>) -> Self {
        VerificationResult {
            status: VerificationStatus::Failed,
            mode,
            checks,
        }
    }

    /// Create a skipped result.
    pub fn skipped() -> Self {
        VerificationResult {
            status: VerificationStatus::Skipped,
            mode: VerificationMode::None,
            checks: vec![],
        }
    }

    /// Combined output of the failed checks.
    pub fn failure_output(&self) -> String {
        self.checks
            .iter()
            .filter(|c| c.status == VerificationStatus::Failed)
            .filter_map(|c| c.output.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error from verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Verification failed.
    #[error("verification failed ({status:?}): {output}")]
    Failed {
        status: VerificationStatus,
        output: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for verification operations.
pub type VerificationResultType<T> = Result<T, VerificationError>;

// ============================================================================
// Verification Functions
// ============================================================================

/// Verify edited sources, given as `(path, content)` pairs.
///
/// Returns a failed [`VerificationResult`] when any file does not parse;
/// callers decide whether that is an error.
pub fn run_verification(
    files: &[(String, String)],
    mode: VerificationMode,
) -> VerificationResultType<VerificationResult> {
    if mode == VerificationMode::None {
        return Ok(VerificationResult::skipped());
    }

    let start = Instant::now();
    let mut failures = Vec::new();
    for (path, content) in files {
        if let Err(err) = parse_file(content) {
            let location = match err.offset() {
                Some(offset) => {
                    let (line, col) = byte_offset_to_position_str(content, offset);
                    format!("{}:{}:{}", path, line, col)
                }
                None => path.clone(),
            };
            failures.push(format!("{}: {}", location, err));
        }
    }
    let duration_ms = start.elapsed().as_millis() as u64;

    tracing::debug!(
        files = files.len(),
        failures = failures.len(),
        duration_ms,
        "syntax verification"
    );

    let failed = !failures.is_empty();
    let check = VerificationCheck {
        name: "reparse".to_string(),
        status: if failed {
            VerificationStatus::Failed
        } else {
            VerificationStatus::Passed
        },
        duration_ms,
        output: failed.then(|| failures.join("\n")),
    };

    if failed {
        Ok(VerificationResult::failed(mode, vec![check]))
    } else {
        Ok(VerificationResult::passed(mode, vec![check]))
    }
}

/// Like [`run_verification`], but a failed result is an error.
pub fn require_verified(
    files: &[(String, String)],
    mode: VerificationMode,
) -> VerificationResultType<VerificationResult> {
    let result = run_verification(files, mode)?;
    if result.status == VerificationStatus::Failed {
        return Err(VerificationError::Failed {
            status: result.status,
            output: result.failure_output(),
        });
    }
    Ok(result)
}

//! JSON output types and serialization for CLI responses.
//!
//! Every structured response carries `status` first and a `schema_version`,
//! and serializes deterministically: the same input produces identical bytes.
//! Operation-specific response bodies live with their operations; this module
//! holds the shared envelope pieces.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{CsfixError, OutputErrorCode};

pub use crate::patch::{MaterializedPatch as Patch, OutputEdit as Edit, Span};
pub use crate::types::Location;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Error Types
// ============================================================================

/// Error information for error responses.
///
/// - `code`: Numeric error code (required)
/// - `message`: Human-readable message (required)
/// - `details`: Error-specific structured data (optional)
/// - `location`: Where the error occurred (optional)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Where the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ErrorInfo {
    /// Create from a CsfixError.
    pub fn from_error(err: &CsfixError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let (details, location) = match err {
            CsfixError::NothingToRefactor {
                file,
                line,
                col,
                reason,
                reason_code,
            } => {
                let details = match reason_code {
                    Some(code) => serde_json::json!({ "reason": reason, "reason_code": code }),
                    None => serde_json::json!({ "reason": reason }),
                };
                (Some(details), Some(Location::new(file.clone(), *line, *col)))
            }
            CsfixError::InvalidArguments { details, .. } => (details.clone(), None),
            CsfixError::FileNotFound { path } => {
                (Some(serde_json::json!({ "path": path })), None)
            }
            CsfixError::ApplyError { file, .. } => {
                let details = file.as_ref().map(|f| serde_json::json!({ "file": f }));
                (details, None)
            }
            CsfixError::VerificationFailed { mode, output } => (
                Some(serde_json::json!({ "mode": mode, "output": output })),
                None,
            ),
            CsfixError::InternalError { .. } => (None, None),
        };

        ErrorInfo {
            code,
            message,
            details,
            location,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Snapshot ID (may be absent on some errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a CsfixError.
    pub fn from_error(err: &CsfixError, snapshot_id: Option<String>) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            snapshot_id,
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// A non-fatal note attached to a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Where the warning applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Warning {
    /// Create a warning without a location.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Attach a location.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for CLI, ensuring consistency.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_has_status_first() {
        let err = CsfixError::file_not_found("Missing.cs");
        let response = ErrorResponse::from_error(&err, None);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.starts_with("{\"status\":\"error\""));
        assert!(json.contains("\"schema_version\":\"1\""));
        assert!(json.contains("\"code\":3"));
        assert!(json.contains("\"path\":\"Missing.cs\""));
        assert!(!json.contains("snapshot_id"));
    }

    #[test]
    fn nothing_to_refactor_carries_location_and_reason() {
        let loc = Location::new("Widget.cs", 3, 20);
        let err = CsfixError::nothing_to_refactor(&loc, "type already exists");
        let info = ErrorInfo::from_error(&err);
        assert_eq!(info.code, 3);
        assert_eq!(info.location, Some(loc.clone()));
        assert_eq!(
            info.details,
            Some(serde_json::json!({ "reason": "type already exists" }))
        );

        let coded = CsfixError::nothing_to_refactor(&loc, "type already exists")
            .with_reason_code("type_already_exists");
        assert_eq!(
            ErrorInfo::from_error(&coded).details,
            Some(serde_json::json!({
                "reason": "type already exists",
                "reason_code": "type_already_exists"
            }))
        );
    }

    #[test]
    fn internal_error_has_no_details() {
        let info = ErrorInfo::from_error(&CsfixError::internal("boom"));
        assert_eq!(info.code, 10);
        assert!(info.details.is_none());
        assert!(info.location.is_none());
    }

    #[test]
    fn emit_response_is_deterministic() {
        let response =
            ErrorResponse::from_error(&CsfixError::invalid_args("bad input"), Some("snap_1".to_string()));
        let mut first = Vec::new();
        let mut second = Vec::new();
        emit_response(&response, &mut first).unwrap();
        emit_response(&response, &mut second).unwrap();
        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().ends_with("}\n"));
    }

    #[test]
    fn warning_location_is_optional() {
        let bare = serde_json::to_string(&Warning::new("unreadable_file", "skipped")).unwrap();
        assert!(!bare.contains("location"));

        let located = Warning::new("unparsable_file", "bad").at(Location::new("a.cs", 1, 1));
        let json = serde_json::to_value(&located).unwrap();
        assert_eq!(json["location"]["file"], "a.cs");
    }
}

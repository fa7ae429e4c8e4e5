// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C# refactoring operations.
//!
//! Provides common types and context for C# operations.

pub mod create_delegate;

use std::path::PathBuf;

use crate::files::{collect_csharp_files, read_file, CollectedFiles, FileError};

// Re-export common types for operations
pub use crate::verification::{VerificationMode, VerificationResult};
pub use csfix_core::types::Location;

// ============================================================================
// Operation Context
// ============================================================================

/// Common context for C# operations.
///
/// When `scan_workspace` is set, every `.cs` file under the workspace root
/// contributes declared types; otherwise only the target file does.
#[derive(Debug, Clone)]
pub struct CSharpOpContext {
    /// Workspace root directory.
    pub workspace_root: PathBuf,
    pub scan_workspace: bool,
}

impl CSharpOpContext {
    pub fn new(workspace_root: impl Into<PathBuf>, scan_workspace: bool) -> Self {
        CSharpOpContext {
            workspace_root: workspace_root.into(),
            scan_workspace,
        }
    }

    /// Files an operation on `target` needs.
    ///
    /// The target is always included, even when it lives in a skipped
    /// directory, and must itself be readable. Other unreadable files end up
    /// in [`CollectedFiles::skipped`].
    pub fn collect_files(&self, target: &str) -> Result<CollectedFiles, FileError> {
        let content = read_file(&self.workspace_root, target)?;
        let mut collected = if self.scan_workspace {
            collect_csharp_files(&self.workspace_root)?
        } else {
            CollectedFiles::default()
        };
        match collected.files.iter_mut().find(|(path, _)| path == target) {
            Some(entry) => entry.1 = content,
            None => collected.files.push((target.to_string(), content)),
        }
        Ok(collected)
    }
}

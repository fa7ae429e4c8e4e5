// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C# file collection utilities.

use std::fs;
use std::io;
use std::path::Path;

use csfix_core::output::Warning;
use thiserror::Error;
use walkdir::WalkDir;

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &["bin", "obj", ".git", ".vs", "node_modules"];

// ============================================================================
// Error Types
// ============================================================================

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// File not found.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// File content is not UTF-8 text.
    #[error("{path} is not valid UTF-8")]
    InvalidUtf8 { path: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

// ============================================================================
// File Collection
// ============================================================================

/// `.cs` files gathered from a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedFiles {
    /// `(relative_path, content)` pairs sorted by path.
    pub files: Vec<(String, String)>,
    /// Files that were found but could not be read as text.
    pub skipped: Vec<SkippedFile>,
}

impl CollectedFiles {
    /// One `unreadable_file` warning per skipped file.
    pub fn warnings(&self) -> Vec<Warning> {
        self.skipped
            .iter()
            .map(|skipped| {
                Warning::new(
                    "unreadable_file",
                    format!("skipped {}: {}", skipped.path, skipped.reason),
                )
            })
            .collect()
    }
}

/// A workspace file left out of collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Collect `.cs` files under `workspace_root`.
///
/// Paths are relative, with `/` as the separator. Build output and tool
/// directories are skipped. A file that is not UTF-8 is recorded in
/// [`CollectedFiles::skipped`] instead of failing the walk.
pub fn collect_csharp_files(workspace_root: &Path) -> FileResult<CollectedFiles> {
    let mut collected = CollectedFiles::default();

    let walker = WalkDir::new(workspace_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !EXCLUDED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref())
        });

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "cs") {
            continue;
        }
        let Ok(rel_path) = path.strip_prefix(workspace_root) else {
            continue;
        };
        let rel_path = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        match read_text(path, &rel_path) {
            Ok(content) => collected.files.push((rel_path, content)),
            Err(FileError::InvalidUtf8 { .. }) => {
                tracing::warn!(file = %rel_path, "skipping file that is not valid UTF-8");
                collected.skipped.push(SkippedFile {
                    path: rel_path,
                    reason: "not valid UTF-8".to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    collected.files.sort_by(|(a, _), (b, _)| a.cmp(b));
    collected.skipped.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(
        count = collected.files.len(),
        skipped = collected.skipped.len(),
        root = %workspace_root.display(),
        "collected C# files"
    );
    Ok(collected)
}

/// Read one workspace file.
pub fn read_file(workspace_root: &Path, rel_path: &str) -> FileResult<String> {
    let path = workspace_root.join(rel_path);
    if !path.is_file() {
        return Err(FileError::NotFound {
            path: rel_path.to_string(),
        });
    }
    read_text(&path, rel_path)
}

fn read_text(path: &Path, rel_path: &str) -> FileResult<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::InvalidData => FileError::InvalidUtf8 {
            path: rel_path.to_string(),
        },
        _ => FileError::Io(e),
    })
}

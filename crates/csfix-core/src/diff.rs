//! Unified diff generation utilities.
//!
//! Provides functions to generate standard unified diff format from edit information.

use std::collections::BTreeMap;

use crate::patch::OutputEdit;

/// Generate a unified diff from edit information.
///
/// Groups edits by file (sorted by path) and produces zero-context hunks.
/// Each edit's old and new text are split into lines; a pure insertion uses
/// the `-N,0` convention for its old range.
pub fn generate_unified_diff(edits: &[OutputEdit]) -> String {
    let mut by_file: BTreeMap<&str, Vec<&OutputEdit>> = BTreeMap::new();
    for edit in edits {
        by_file.entry(&edit.file).or_default().push(edit);
    }

    let mut diff = String::new();
    for (file, mut file_edits) in by_file {
        file_edits.sort_by_key(|e| e.span.start);
        diff.push_str(&format!("--- a/{}\n", file));
        diff.push_str(&format!("+++ b/{}\n", file));

        // Lines added by earlier hunks shift the new-file line numbers.
        let mut shift: i64 = 0;
        for edit in file_edits {
            let old_lines = hunk_lines(&edit.old_text);
            let new_lines = hunk_lines(&edit.new_text);
            let line = i64::from(edit.line);

            let old_start = if old_lines.is_empty() { line - 1 } else { line };
            let new_start = if new_lines.is_empty() {
                line - 1 + shift
            } else {
                line + shift
            };

            diff.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                old_start,
                old_lines.len(),
                new_start,
                new_lines.len()
            ));
            for l in &old_lines {
                diff.push_str(&format!("-{}\n", l));
            }
            for l in &new_lines {
                diff.push_str(&format!("+{}\n", l));
            }
            shift += new_lines.len() as i64 - old_lines.len() as i64;
        }
    }

    diff
}

fn hunk_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().collect()
}

// ============================================================================
// Tests
// ============================================================================

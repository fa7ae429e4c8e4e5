//! Patch IR: Edit, Anchor, PatchSet for atomic refactoring transactions.
//!
//! This module implements the core patch infrastructure for csfix:
//! - Anchored insertions that verify the scope they were computed against
//! - Conflict detection (stale anchors, missing files)
//! - Atomic apply semantics (all-or-nothing)
//! - Patch materialization (unified diff, JSON)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use crate::diff::generate_unified_diff;
use crate::text::byte_offset_to_position_str;

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Core Types
// ============================================================================

/// Identifies the exact source snapshot a patch was computed from.
///
/// Derived from the content hash of the file(s) involved, so identical inputs
/// always produce identical snapshot IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub String);

impl SnapshotId {
    /// Snapshot ID for a single source text.
    pub fn of(content: &str) -> Self {
        let hash = ContentHash::compute(content.as_bytes());
        SnapshotId(format!("snap_{}", &hash.0[..16]))
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable file identifier within a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new file ID.
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// Byte offsets into source text (snapshot-scoped).
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Zero-width span at `offset`.
    pub fn empty(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if a caret at `offset` touches this span.
    ///
    /// A caret sits between characters, so both edges count.
    pub fn touches(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Anchor Model
// ============================================================================

/// How an edit finds and validates its target location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    /// Zero-width insertion point validated by the scope that owns it.
    ///
    /// The edit only applies if `position` lies within `scope` and the bytes
    /// of `scope` still hash to `expected_scope_hash`.
    ScopeInsert {
        /// Insertion offset.
        position: usize,
        /// Span of the enclosing scope (namespace body or whole file).
        scope: Span,
        /// SHA-256 hash of the bytes in `scope` before the edit.
        expected_scope_hash: ContentHash,
    },
}

impl Anchor {
    /// Create a ScopeInsert anchor from the current content.
    ///
    /// # Panics
    /// Panics if `scope` lies outside `content` or `position` outside `scope`.
    pub fn scope_insert(position: usize, scope: Span, content: &[u8]) -> Self {
        assert!(
            scope.touches(position),
            "insertion point {} must lie within scope {}",
            position,
            scope
        );
        Anchor::ScopeInsert {
            position,
            scope,
            expected_scope_hash: ContentHash::compute(&content[scope.start..scope.end]),
        }
    }

    /// Get the span this anchor edits (always empty).
    pub fn span(&self) -> Span {
        match self {
            Anchor::ScopeInsert { position, .. } => Span::empty(*position),
        }
    }

    /// Resolve this anchor against the given content.
    pub fn resolve(&self, content: &[u8]) -> AnchorResolution {
        let (checked, expected) = match self {
            Anchor::ScopeInsert {
                scope,
                expected_scope_hash,
                ..
            } => (*scope, expected_scope_hash),
        };

        if checked.end > content.len() {
            return AnchorResolution::OutOfBounds {
                span: checked,
                file_len: content.len(),
            };
        }

        let actual = ContentHash::compute(&content[checked.start..checked.end]);
        if &actual != expected {
            return AnchorResolution::HashMismatch {
                span: checked,
                expected: expected.clone(),
                actual,
            };
        }

        AnchorResolution::Resolved(self.span())
    }
}

/// Result of attempting to resolve an anchor against file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorResolution {
    /// Anchor resolved successfully to a specific span.
    Resolved(Span),
    /// Content at the anchored span doesn't match the expected hash.
    HashMismatch {
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },
    /// Span is out of bounds for the content.
    OutOfBounds { span: Span, file_len: usize },
}

// ============================================================================
// Conflict Detection
// ============================================================================

/// A detected invalidation that prevents apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Conflict {
    /// The anchored bytes changed since the edit was computed.
    #[error("content at {span} in {file_id} changed since the edit was computed")]
    AnchorHashMismatch {
        file_id: FileId,
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },

    /// Span is out of bounds for the file.
    #[error("span {span} is out of bounds for {file_id} ({file_len} bytes)")]
    SpanOutOfBounds {
        file_id: FileId,
        span: Span,
        file_len: usize,
    },

    /// File not found in the apply context.
    #[error("no content provided for {file_id}")]
    FileMissing { file_id: FileId },

    /// The edited bytes are no longer valid UTF-8.
    #[error("edit would produce invalid UTF-8 in {file_id}")]
    InvalidUtf8 { file_id: FileId },
}

// ============================================================================
// Edit Operations
// ============================================================================

/// Optional labels for provenance tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditLabels {
    /// The refactor operation that generated this edit.
    pub refactor_op_id: Option<String>,
    /// The symbol this edit relates to.
    pub symbol: Option<String>,
    /// Human-readable reason for the edit.
    pub reason: Option<String>,
}

/// A single text insertion anchored in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Stable identifier for ordering.
    pub id: u32,
    /// The file this edit applies to.
    pub file_id: FileId,
    /// How to find/verify the insertion point.
    pub anchor: Anchor,
    /// The inserted text.
    pub text: String,
    /// Optional provenance labels.
    pub labels: EditLabels,
}

impl Edit {
    /// Create an Insert edit.
    ///
    /// # Panics
    /// Panics if the anchor's span is not empty.
    pub fn insert(id: u32, file_id: FileId, anchor: Anchor, text: impl Into<String>) -> Self {
        let span = anchor.span();
        assert!(
            span.is_empty(),
            "Insert anchor span must be empty (start == end), got {:?}",
            span
        );
        Edit {
            id,
            file_id,
            anchor,
            text: text.into(),
            labels: EditLabels::default(),
        }
    }

    /// Add labels to this edit.
    pub fn with_labels(mut self, labels: EditLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Get the anchor's span.
    pub fn span(&self) -> Span {
        self.anchor.span()
    }
}

/// Apply edits for a single file to its content.
///
/// All anchors are resolved against the original `content` first; if any
/// fails, nothing is applied. Edits are spliced from the end of the file
/// backwards so earlier offsets stay valid.
pub fn apply_edits(file_id: FileId, content: &str, edits: &[&Edit]) -> Result<String, Vec<Conflict>> {
    let bytes = content.as_bytes();
    let mut conflicts = Vec::new();
    let mut resolved: Vec<(Span, &Edit)> = Vec::with_capacity(edits.len());

    for edit in edits {
        match edit.anchor.resolve(bytes) {
            AnchorResolution::Resolved(span) => resolved.push((span, edit)),
            AnchorResolution::HashMismatch {
                span,
                expected,
                actual,
            } => conflicts.push(Conflict::AnchorHashMismatch {
                file_id,
                span,
                expected,
                actual,
            }),
            AnchorResolution::OutOfBounds { span, file_len } => {
                conflicts.push(Conflict::SpanOutOfBounds {
                    file_id,
                    span,
                    file_len,
                })
            }
        }
    }

    if !conflicts.is_empty() {
        return Err(conflicts);
    }

    // Descending by start; for equal starts, higher ids first so that lower
    // ids end up first in the output.
    resolved.sort_by(|a, b| b.0.start.cmp(&a.0.start).then(b.1.id.cmp(&a.1.id)));

    let mut out = bytes.to_vec();
    for (span, edit) in resolved {
        out.splice(span.start..span.start, edit.text.bytes());
    }

    String::from_utf8(out).map_err(|_| vec![Conflict::InvalidUtf8 { file_id }])
}

// ============================================================================
// PatchSet
// ============================================================================

/// An ordered set of edits with metadata, applied atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchSet {
    /// The snapshot this patch is based on.
    pub snapshot_id: SnapshotId,
    /// The edits to apply.
    pub edits: Vec<Edit>,
    /// Mapping from FileId to file path (for materialization).
    pub file_paths: HashMap<FileId, String>,
}

impl PatchSet {
    /// Create a new empty PatchSet for the given snapshot.
    pub fn new(snapshot_id: SnapshotId) -> Self {
        PatchSet {
            snapshot_id,
            edits: Vec::new(),
            file_paths: HashMap::new(),
        }
    }

    /// Add an edit.
    pub fn with_edit(mut self, edit: Edit) -> Self {
        self.edits.push(edit);
        self
    }

    /// Register a file path mapping.
    pub fn with_file_path(mut self, file_id: FileId, path: impl Into<String>) -> Self {
        self.file_paths.insert(file_id, path.into());
        self
    }

    /// Get the number of edits in this PatchSet.
    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    fn path_of(&self, file_id: FileId) -> String {
        self.file_paths
            .get(&file_id)
            .cloned()
            .unwrap_or_else(|| file_id.to_string())
    }

    /// Edits grouped by file, in deterministic (file id, span start, id) order.
    fn edits_by_file(&self) -> BTreeMap<FileId, Vec<&Edit>> {
        let mut by_file: BTreeMap<FileId, Vec<&Edit>> = BTreeMap::new();
        for edit in &self.edits {
            by_file.entry(edit.file_id).or_default().push(edit);
        }
        for edits in by_file.values_mut() {
            edits.sort_by_key(|e| (e.span().start, e.id));
        }
        by_file
    }
}

// ============================================================================
// Atomic Apply
// ============================================================================

/// Result of attempting to apply a PatchSet.
#[derive(Debug, Clone)]
pub enum ApplyResult {
    /// All edits applied successfully.
    Success {
        /// The new content for each modified file.
        modified_files: HashMap<FileId, String>,
    },

    /// Apply failed due to conflicts.
    Failed {
        /// The conflicts that prevented apply.
        conflicts: Vec<Conflict>,
    },
}

impl PatchSet {
    /// Apply this PatchSet atomically.
    ///
    /// Either all edits apply successfully, or none do (no partial application).
    /// `file_contents` is never modified.
    #[must_use]
    pub fn apply(&self, file_contents: &HashMap<FileId, String>) -> ApplyResult {
        let mut conflicts = Vec::new();
        let mut modified_files = HashMap::new();

        for (file_id, edits) in self.edits_by_file() {
            let Some(content) = file_contents.get(&file_id) else {
                conflicts.push(Conflict::FileMissing { file_id });
                continue;
            };
            match apply_edits(file_id, content, &edits) {
                Ok(new_content) => {
                    modified_files.insert(file_id, new_content);
                }
                Err(file_conflicts) => conflicts.extend(file_conflicts),
            }
        }

        if conflicts.is_empty() {
            tracing::debug!(
                files = modified_files.len(),
                edits = self.edits.len(),
                "patch applied"
            );
            ApplyResult::Success { modified_files }
        } else {
            tracing::debug!(conflicts = conflicts.len(), "patch rejected");
            ApplyResult::Failed { conflicts }
        }
    }
}

// ============================================================================
// Patch Materialization
// ============================================================================

/// A single edit as it appears in output (for JSON serialization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEdit {
    /// Workspace-relative file path.
    pub file: String,
    /// Byte range the edit covers (empty for an insertion).
    pub span: Span,
    /// Original text in `span`.
    pub old_text: String,
    /// Inserted text.
    pub new_text: String,
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column.
    pub col: u32,
}

/// Materialized patch output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedPatch {
    /// Individual edits (ordered by file, then span.start).
    pub edits: Vec<OutputEdit>,
    /// Unified diff.
    pub unified_diff: String,
}

impl PatchSet {
    /// Materialize this PatchSet to output format.
    ///
    /// Requires file contents to compute old_text and line/col positions.
    pub fn materialize(&self, file_contents: &HashMap<FileId, String>) -> MaterializedPatch {
        let mut edits = Vec::new();

        for (file_id, file_edits) in self.edits_by_file() {
            let path = self.path_of(file_id);
            let content = file_contents.get(&file_id).map(String::as_str).unwrap_or("");

            for edit in file_edits {
                let span = edit.span();
                let old_text = content.get(span.start..span.end).unwrap_or("").to_string();
                let (line, col) = byte_offset_to_position_str(content, span.start);
                edits.push(OutputEdit {
                    file: path.clone(),
                    span,
                    old_text,
                    new_text: edit.text.clone(),
                    line,
                    col,
                });
            }
        }

        let unified_diff = generate_unified_diff(&edits);
        MaterializedPatch {
            edits,
            unified_diff,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(file_id: FileId, text: &str) -> HashMap<FileId, String> {
        let mut map = HashMap::new();
        map.insert(file_id, text.to_string());
        map
    }

    mod span_tests {
        use super::*;

        #[test]
        fn touches_includes_both_edges() {
            let s = Span::new(3, 6);
            assert!(s.touches(3));
            assert!(s.touches(6));
            assert!(!s.touches(7));
            assert!(!s.touches(2));
        }

        #[test]
        #[should_panic]
        fn inverted_span_panics() {
            let _ = Span::new(5, 1);
        }
    }

    mod anchor_tests {
        use super::*;

        #[test]
        fn scope_insert_resolves_to_empty_span() {
            let content = b"namespace a { class B { } }";
            let anchor = Anchor::scope_insert(14, Span::new(12, 27), content);
            assert_eq!(anchor.resolve(content), AnchorResolution::Resolved(Span::empty(14)));
        }

        #[test]
        fn scope_insert_detects_changed_scope() {
            let before = b"namespace a { class B { } }";
            let after = b"namespace a { class C { } }";
            let anchor = Anchor::scope_insert(14, Span::new(12, 27), before);
            assert!(matches!(
                anchor.resolve(after),
                AnchorResolution::HashMismatch { .. }
            ));
        }

        #[test]
        fn scope_insert_out_of_bounds() {
            let anchor = Anchor::scope_insert(0, Span::new(0, 3), b"abc");
            assert!(matches!(
                anchor.resolve(b"ab"),
                AnchorResolution::OutOfBounds { file_len: 2, .. }
            ));
        }
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn insert_leaves_original_untouched() {
            let file = FileId::new(0);
            let source = "class A { }\n";
            let anchor = Anchor::scope_insert(0, Span::new(0, source.len()), source.as_bytes());
            let patch = PatchSet::new(SnapshotId::of(source))
                .with_edit(Edit::insert(1, file, anchor, "delegate void D();\n\n"));
            let input = contents(file, source);

            match patch.apply(&input) {
                ApplyResult::Success { modified_files } => {
                    assert_eq!(modified_files[&file], "delegate void D();\n\nclass A { }\n");
                }
                ApplyResult::Failed { conflicts } => panic!("unexpected conflicts: {:?}", conflicts),
            }
            assert_eq!(input[&file], source);
        }

        #[test]
        fn inserts_apply_back_to_front_in_id_order() {
            let file = FileId::new(0);
            let source = "event A a; event B b;";
            let scope = Span::new(0, source.len());
            let bytes = source.as_bytes();
            let patch = PatchSet::new(SnapshotId::of(source))
                .with_edit(Edit::insert(3, file, Anchor::scope_insert(11, scope, bytes), "/*y*/"))
                .with_edit(Edit::insert(1, file, Anchor::scope_insert(0, scope, bytes), "/*a*/"))
                .with_edit(Edit::insert(2, file, Anchor::scope_insert(11, scope, bytes), "/*x*/"));

            match patch.apply(&contents(file, source)) {
                ApplyResult::Success { modified_files } => {
                    assert_eq!(
                        modified_files[&file],
                        "/*a*/event A a; /*x*//*y*/event B b;"
                    );
                }
                ApplyResult::Failed { conflicts } => panic!("unexpected conflicts: {:?}", conflicts),
            }
        }

        #[test]
        fn stale_anchor_fails_atomically() {
            let file = FileId::new(0);
            let source = "class A { }";
            let anchor = Anchor::scope_insert(0, Span::new(0, source.len()), source.as_bytes());
            let patch = PatchSet::new(SnapshotId::of(source))
                .with_edit(Edit::insert(1, file, anchor, "x"));

            match patch.apply(&contents(file, "class B { }")) {
                ApplyResult::Success { .. } => panic!("stale anchor must not apply"),
                ApplyResult::Failed { conflicts } => {
                    assert!(matches!(conflicts[0], Conflict::AnchorHashMismatch { .. }));
                }
            }
        }

        #[test]
        fn missing_file_conflicts() {
            let file = FileId::new(3);
            let source = "abc";
            let anchor = Anchor::scope_insert(0, Span::new(0, 3), source.as_bytes());
            let patch =
                PatchSet::new(SnapshotId::of(source)).with_edit(Edit::insert(1, file, anchor, "x"));
            match patch.apply(&HashMap::new()) {
                ApplyResult::Failed { conflicts } => {
                    assert_eq!(conflicts, vec![Conflict::FileMissing { file_id: file }]);
                }
                ApplyResult::Success { .. } => panic!("expected FileMissing"),
            }
        }
    }

    mod materialize_tests {
        use super::*;

        #[test]
        fn materialize_reports_line_and_text() {
            let file = FileId::new(0);
            let source = "namespace foo\n{\n    class A { }\n}\n";
            let pos = source.find("    class").unwrap();
            let anchor = Anchor::scope_insert(pos, Span::new(0, source.len()), source.as_bytes());
            let patch = PatchSet::new(SnapshotId::of(source))
                .with_file_path(file, "A.cs")
                .with_edit(Edit::insert(1, file, anchor, "    delegate void D();\n\n"));

            let materialized = patch.materialize(&contents(file, source));
            assert_eq!(materialized.edits.len(), 1);
            let edit = &materialized.edits[0];
            assert_eq!(edit.file, "A.cs");
            assert_eq!(edit.line, 3);
            assert_eq!(edit.col, 1);
            assert!(edit.old_text.is_empty());
            assert!(materialized.unified_diff.contains("+    delegate void D();"));
        }
    }

    #[test]
    fn snapshot_id_is_deterministic() {
        assert_eq!(SnapshotId::of("abc"), SnapshotId::of("abc"));
        assert_ne!(SnapshotId::of("abc"), SnapshotId::of("abd"));
        assert!(SnapshotId::of("abc").0.starts_with("snap_"));
    }
}

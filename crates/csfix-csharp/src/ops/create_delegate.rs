// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C# create-delegate operation.
//!
//! At a caret inside a field-like event whose delegate type does not exist,
//! this synthesizes
//!
//! ```text
//! [public] delegate void Name(object sender, System.EventArgs e);
//! ```
//!
//! and inserts it immediately before the outermost type containing the
//! event, in that type's namespace or at file level:
//!
//! 1. Parse the source and analyze the caret
//! 2. Resolve the event's type; stop if it already exists
//! 3. Infer accessibility from the event and its containers
//! 4. Build the declaration and place it before the outermost type
//! 5. Apply the anchored edit and re-parse the result
//!
//! See [`compute_action`] for the in-memory core and [`create_delegate`]
//! for the workspace entry point.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use csfix_core::output::{Warning, SCHEMA_VERSION};
use csfix_core::patch::{
    apply_edits, Anchor, ApplyResult, Conflict, Edit, EditLabels, FileId, MaterializedPatch,
    PatchSet, SnapshotId, Span,
};
use csfix_core::text::{
    byte_offset_to_position_str, detect_indentation, line_start, only_whitespace_before,
    position_to_byte_offset_str, text_start,
};
use csfix_core::types::Location;
use csfix_cst::position_lookup::EventPath;
use csfix_cst::{parse_file, ParsedFile, TypeSyntax};

use crate::accessibility::{infer, is_externally_reachable, Accessibility, DelegateAccessibility};
use crate::analyzer::{analyze, NotApplicable};
use crate::files::FileError;
use crate::resolver::{FrameworkTypes, ScopeContext, SymbolTable, TypeReference, TypeResolver};
use crate::verification::{
    require_verified, VerificationError, VerificationMode, VerificationResult, VerificationStatus,
};

/// Parameter list of every synthesized delegate.
pub const HANDLER_PARAMETERS: &str = "object sender, System.EventArgs e";

/// Operation id recorded on edits.
pub const OP_ID: &str = "create_delegate";

/// The file being refactored, within a patch.
const TARGET_FILE: FileId = FileId(0);

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during create-delegate operations.
#[derive(Debug, Error)]
pub enum CreateDelegateError {
    /// The refactoring does not apply at the location.
    #[error("nothing to refactor at {location}: {reason}")]
    NotApplicable {
        location: Location,
        reason: NotApplicable,
    },

    /// File not found in the provided file set.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The edit no longer applies to the file content.
    #[error("edit conflict in {file}: {}", conflicts.iter().map(|c| c.to_string()).collect::<Vec<_>>().join("; "))]
    Conflict {
        file: String,
        conflicts: Vec<Conflict>,
    },

    /// Verification failed.
    #[error("verification failed ({status:?}): {output}")]
    VerificationFailed {
        status: VerificationStatus,
        output: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// File error.
    #[error("file error: {0}")]
    File(#[from] FileError),
}

impl From<VerificationError> for CreateDelegateError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::Failed { status, output } => {
                CreateDelegateError::VerificationFailed { status, output }
            }
            VerificationError::Io(e) => CreateDelegateError::Io(e),
        }
    }
}

/// Result type for create-delegate operations.
pub type CreateDelegateResult<T> = Result<T, CreateDelegateError>;

// ============================================================================
// Synthesis
// ============================================================================

/// A delegate declaration to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedDelegate {
    pub name: String,
    /// Always empty today: generic event types are never synthesized.
    pub type_params: Vec<String>,
    pub accessibility: DelegateAccessibility,
}

impl SynthesizedDelegate {
    pub fn build(name: impl Into<String>, accessibility: DelegateAccessibility) -> Self {
        SynthesizedDelegate {
            name: name.into(),
            type_params: Vec::new(),
            accessibility,
        }
    }

    /// The declaration as C# source, without indentation or newline.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SynthesizedDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.accessibility.keyword() {
            write!(f, "{} ", keyword)?;
        }
        write!(f, "delegate void {}", self.name)?;
        if !self.type_params.is_empty() {
            write!(f, "<{}>", self.type_params.join(", "))?;
        }
        write!(f, "({});", HANDLER_PARAMETERS)
    }
}

// ============================================================================
// Placement
// ============================================================================

/// The scope a delegate is inserted into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsertionScope {
    /// Inside a namespace body.
    Namespace { name: String, body: Span },
    /// At file level.
    File { span: Span },
}

impl InsertionScope {
    pub fn span(&self) -> Span {
        match self {
            InsertionScope::Namespace { body, .. } => *body,
            InsertionScope::File { span } => *span,
        }
    }
}

/// Where and how a delegate is inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub scope: InsertionScope,
    /// Byte offset the text is inserted at.
    pub position: usize,
    /// Indentation written before the declaration (empty when inline).
    pub indentation: String,
    pub edit: Edit,
}

/// Start of the `///` comment lines directly above `start`, or `start`.
fn doc_comment_start(source: &str, start: usize) -> usize {
    let mut start = start;
    loop {
        let line = line_start(source, start);
        if line <= text_start(source) {
            return start;
        }
        let prev = line_start(source, line - 1);
        let text = &source[prev..line - 1];
        let trimmed = text.trim_start();
        if !trimmed.starts_with("///") {
            return start;
        }
        start = prev + (text.len() - trimmed.len());
    }
}

fn newline_of(source: &str) -> &'static str {
    if source.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Build the insertion edit for `delegate` before the outermost type of `path`.
pub fn place(delegate: &SynthesizedDelegate, parsed: &ParsedFile<'_>, path: &EventPath<'_>) -> Placement {
    let source = parsed.source;
    let anchor_type = path.outermost_type();

    let scope = match path.namespace() {
        Some(ns) => InsertionScope::Namespace {
            name: ns.dotted_name(),
            body: ns.body,
        },
        None => InsertionScope::File {
            span: Span::new(0, source.len()),
        },
    };

    let declaration = delegate.render();
    let (position, indentation, text) = if only_whitespace_before(source, anchor_type.span.start) {
        let start = doc_comment_start(source, anchor_type.span.start);
        let indentation = detect_indentation(source, start).to_string();
        let nl = newline_of(source);
        let text = format!("{}{}{}{}", indentation, declaration, nl, nl);
        (line_start(source, start), indentation, text)
    } else {
        (anchor_type.span.start, String::new(), format!("{} ", declaration))
    };
    debug_assert!(scope.span().touches(position));

    tracing::debug!(
        position,
        anchor = %anchor_type.name.text,
        scope = ?scope,
        "placing delegate declaration"
    );

    let anchor = Anchor::scope_insert(position, scope.span(), source.as_bytes());
    let edit = Edit::insert(1, TARGET_FILE, anchor, text).with_labels(EditLabels {
        refactor_op_id: Some(OP_ID.to_string()),
        symbol: Some(delegate.name.clone()),
        reason: Some(format!("declare delegate before {}", anchor_type.name.text)),
    });

    Placement {
        scope,
        position,
        indentation,
        edit,
    }
}

/// Apply a placed edit to `source`, returning the new text.
///
/// `source` is never modified. Fails if the anchored scope changed.
pub fn apply(source: &str, edit: &Edit) -> Result<String, Vec<Conflict>> {
    apply_edits(edit.file_id, source, &[edit])
}

// ============================================================================
// Action
// ============================================================================

/// A ready-to-apply create-delegate refactoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDelegateAction {
    pub delegate: SynthesizedDelegate,
    pub placement: Placement,
    /// Accessibility the event itself has.
    pub event_accessibility: Accessibility,
}

impl CreateDelegateAction {
    pub fn apply(&self, source: &str) -> Result<String, Vec<Conflict>> {
        apply(source, &self.placement.edit)
    }
}

fn reference_for(ty: &TypeSyntax, source: &str) -> Result<TypeReference, NotApplicable> {
    let span = ty.span();
    let text = source.get(span.start..span.end).unwrap_or("").to_string();
    match ty {
        TypeSyntax::Predefined(_) => Err(NotApplicable::TypeAlreadyExists { name: text }),
        _ => TypeReference::from_syntax(ty, source)
            .ok_or(NotApplicable::UnsupportedTypeReference { text }),
    }
}

/// Compute the refactoring at `caret`, or why it does not apply.
pub fn compute_action<R: TypeResolver>(
    parsed: &ParsedFile<'_>,
    caret: usize,
    resolver: &R,
) -> Result<CreateDelegateAction, NotApplicable> {
    let decl = analyze(parsed, caret)?;
    let reference = reference_for(decl.declared_type(), parsed.source)?;

    let scope = ScopeContext::for_event(&parsed.unit, &decl.path);
    if resolver.exists(&reference, &scope) {
        tracing::debug!(reference = %reference, "event type already resolves");
        return Err(NotApplicable::TypeAlreadyExists {
            name: reference.to_string(),
        });
    }
    if reference.arity() > 0 {
        return Err(NotApplicable::UnsupportedTypeReference {
            text: reference.to_string(),
        });
    }

    let event_accessibility = Accessibility::of_member(&decl.event().modifiers, decl.container_kind());
    let reachable = is_externally_reachable(&decl.path.types);
    let accessibility = infer(event_accessibility, reachable);
    tracing::debug!(
        ?event_accessibility,
        reachable,
        ?accessibility,
        "inferred delegate accessibility"
    );

    let delegate = SynthesizedDelegate::build(reference.name, accessibility);
    let placement = place(&delegate, parsed, &decl.path);
    Ok(CreateDelegateAction {
        delegate,
        placement,
        event_accessibility,
    })
}

/// Run the refactoring on a single source text.
///
/// Only types declared in `source` itself and `framework` are considered to
/// exist. Returns the transformed text.
pub fn create_delegate_in_source(
    source: &str,
    caret: usize,
    framework: &FrameworkTypes,
) -> Result<String, NotApplicable> {
    let parsed = parse_file(source).map_err(|e| NotApplicable::MalformedSource {
        message: e.to_string(),
    })?;
    let table = SymbolTable::for_units([&parsed.unit], framework.clone());
    let action = compute_action(&parsed, caret, &table)?;
    // The anchor was hashed from this same text, so a conflict means the
    // placement is out of bounds for it.
    action
        .apply(source)
        .map_err(|conflicts| NotApplicable::MalformedSource {
            message: conflicts
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })
}

// ============================================================================
// Options
// ============================================================================

/// Library configuration for the workspace entry points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDelegateOptions {
    /// Verification run before writing.
    pub verify: VerificationMode,
    /// Write the result back to the workspace.
    pub apply: bool,
    /// Extra type names treated as existing framework types.
    pub known_types: Vec<String>,
}

impl CreateDelegateOptions {
    pub fn framework_types(&self) -> FrameworkTypes {
        FrameworkTypes::with_names(self.known_types.iter().cloned())
    }
}

// ============================================================================
// Output Types
// ============================================================================

/// Create-delegate result (after running the operation).
#[derive(Debug, Clone, Serialize)]
pub struct CreateDelegateOutput {
    /// Status.
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// Snapshot ID of the file before the edit.
    pub snapshot_id: String,
    /// Patch information.
    pub patch: MaterializedPatch,
    /// Summary.
    pub summary: CreateDelegateSummary,
    /// Verification result.
    pub verification: VerificationResult,
    /// Whether changes were applied (present when applying).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<bool>,
    /// Files that were modified (present when applying).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_written: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// Create-delegate summary.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDelegateSummary {
    pub delegate_name: String,
    /// The inserted declaration.
    pub declaration: String,
    pub accessibility: DelegateAccessibility,
    /// File the delegate was inserted into.
    pub file: String,
    /// Line the declaration lands on in the new text (1-based).
    pub insertion_line: u32,
    pub edits_count: usize,
    pub bytes_added: usize,
}

/// Analysis result (preview without applying).
#[derive(Debug, Clone, Serialize)]
pub struct CreateDelegateAnalysis {
    /// Status.
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    pub event: EventInfo,
    pub delegate: DelegateInfo,
    pub insertion_point: InsertionPoint,
    /// The edit that would be applied.
    pub patch: MaterializedPatch,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// The event the caret is on.
#[derive(Debug, Clone, Serialize)]
pub struct EventInfo {
    pub file: String,
    /// Line of the `event` keyword (1-based).
    pub line: u32,
    /// Column of the `event` keyword (1-based).
    pub col: u32,
    pub names: Vec<String>,
    pub event_type: String,
    pub modifiers: Vec<String>,
    pub accessibility: Accessibility,
    /// Name of the type declaring the event.
    pub container: String,
    /// `class`, `struct`, `interface`, ...
    pub container_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// The delegate that would be created.
#[derive(Debug, Clone, Serialize)]
pub struct DelegateInfo {
    pub name: String,
    pub accessibility: DelegateAccessibility,
    pub declaration: String,
}

/// Where the declaration would be inserted.
#[derive(Debug, Clone, Serialize)]
pub struct InsertionPoint {
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based).
    pub col: u32,
    /// The indentation that will be used.
    pub indentation: String,
    pub scope: InsertionScope,
}

// ============================================================================
// Main Implementation
// ============================================================================

/// Everything computed before touching the file system.
struct Plan {
    file: String,
    content: String,
    event: EventInfo,
    action: CreateDelegateAction,
    warnings: Vec<Warning>,
}

fn caret_offset(content: &str, location: &Location) -> usize {
    match location.byte_start {
        Some(offset) => (offset as usize).min(content.len()),
        None => position_to_byte_offset_str(content, location.line, location.col),
    }
}

fn plan(
    files: &[(String, String)],
    location: &Location,
    options: &CreateDelegateOptions,
) -> CreateDelegateResult<Plan> {
    let (file_path, content) = files
        .iter()
        .find(|(p, _)| p == &location.file)
        .ok_or_else(|| CreateDelegateError::FileNotFound {
            path: location.file.clone(),
        })?;
    let not_applicable = |reason: NotApplicable| CreateDelegateError::NotApplicable {
        location: location.clone(),
        reason,
    };

    let target = parse_file(content).map_err(|e| {
        not_applicable(NotApplicable::MalformedSource {
            message: e.to_string(),
        })
    })?;

    // Other files only contribute declared types; one that does not parse
    // is skipped with a warning.
    let mut warnings = Vec::new();
    let mut others = Vec::new();
    for (path, text) in files.iter().filter(|(p, _)| p != file_path) {
        match parse_file(text) {
            Ok(parsed) => others.push(parsed),
            Err(e) => {
                tracing::warn!(file = %path, error = %e, "skipping unparsable file");
                let mut warning = Warning::new("unparsable_file", e.to_string());
                if let Some(offset) = e.offset() {
                    let (line, col) = byte_offset_to_position_str(text, offset);
                    warning = warning.at(Location::new(path.clone(), line, col));
                }
                warnings.push(warning);
            }
        }
    }

    let table = SymbolTable::for_units(
        std::iter::once(&target.unit).chain(others.iter().map(|p| &p.unit)),
        options.framework_types(),
    );
    tracing::debug!(
        declared_types = table.declared.len(),
        files = files.len(),
        "built symbol table"
    );

    let caret = caret_offset(content, location);
    let action = compute_action(&target, caret, &table).map_err(not_applicable)?;

    // Re-analyze for the event facts; compute_action succeeded so this does too.
    let decl = analyze(&target, caret).map_err(not_applicable)?;
    let event = decl.event();
    let (line, col) = byte_offset_to_position_str(content, event.event_keyword.start);
    let info = EventInfo {
        file: file_path.clone(),
        line,
        col,
        names: decl.names().map(str::to_string).collect(),
        event_type: decl.type_text.to_string(),
        modifiers: decl.modifiers().map(str::to_string).collect(),
        accessibility: action.event_accessibility,
        container: decl.containing_type().name.text.clone(),
        container_kind: decl.container_kind().keyword().to_string(),
        namespace: decl.namespace().map(|ns| ns.dotted_name()),
    };

    Ok(Plan {
        file: file_path.clone(),
        content: content.clone(),
        event: info,
        action,
        warnings,
    })
}

impl Plan {
    fn patch(&self) -> PatchSet {
        PatchSet::new(SnapshotId::of(&self.content))
            .with_edit(self.action.placement.edit.clone())
            .with_file_path(TARGET_FILE, self.file.clone())
    }

    fn contents(&self) -> HashMap<FileId, String> {
        HashMap::from([(TARGET_FILE, self.content.clone())])
    }
}

/// Analyze a create-delegate operation (preview without applying).
///
/// # Arguments
///
/// * `files` - `(path, content)` pairs; the target file plus any files whose
///   declared types should count as existing
/// * `location` - Caret location
/// * `options` - Extra known types (verification and apply are ignored)
pub fn analyze_create_delegate(
    files: &[(String, String)],
    location: &Location,
    options: &CreateDelegateOptions,
) -> CreateDelegateResult<CreateDelegateAnalysis> {
    let _span = tracing::info_span!("analyze_create_delegate", location = %location).entered();
    let plan = plan(files, location, options)?;

    let patch = plan.patch().materialize(&plan.contents());
    let placement = &plan.action.placement;
    let (line, col) = byte_offset_to_position_str(&plan.content, placement.position);
    let delegate = &plan.action.delegate;

    Ok(CreateDelegateAnalysis {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        event: plan.event,
        delegate: DelegateInfo {
            name: delegate.name.clone(),
            accessibility: delegate.accessibility,
            declaration: delegate.render(),
        },
        insertion_point: InsertionPoint {
            line,
            col,
            indentation: placement.indentation.clone(),
            scope: placement.scope.clone(),
        },
        patch,
        warnings: plan.warnings,
    })
}

/// Run the create-delegate operation.
///
/// The edit is applied in memory, verified, and written to
/// `workspace_root` only when `options.apply` is set.
pub fn create_delegate(
    workspace_root: &Path,
    files: &[(String, String)],
    location: &Location,
    options: &CreateDelegateOptions,
) -> CreateDelegateResult<CreateDelegateOutput> {
    let _span = tracing::info_span!("create_delegate", location = %location, apply = options.apply)
        .entered();
    let plan = plan(files, location, options)?;
    let patch = plan.patch();
    let contents = plan.contents();

    let new_content = match patch.apply(&contents) {
        ApplyResult::Success { mut modified_files } => modified_files
            .remove(&TARGET_FILE)
            .unwrap_or_else(|| plan.content.clone()),
        ApplyResult::Failed { conflicts } => {
            return Err(CreateDelegateError::Conflict {
                file: plan.file.clone(),
                conflicts,
            })
        }
    };

    let verification = require_verified(&[(plan.file.clone(), new_content.clone())], options.verify)?;

    let files_written = if options.apply {
        fs::write(workspace_root.join(&plan.file), &new_content)?;
        tracing::info!(file = %plan.file, "wrote delegate declaration");
        Some(vec![plan.file.clone()])
    } else {
        None
    };

    let materialized = patch.materialize(&contents);
    let placement = &plan.action.placement;
    let declaration_offset = placement.position + placement.indentation.len();
    let (insertion_line, _) = byte_offset_to_position_str(&new_content, declaration_offset);
    let delegate = &plan.action.delegate;

    Ok(CreateDelegateOutput {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        snapshot_id: patch.snapshot_id.to_string(),
        patch: materialized,
        summary: CreateDelegateSummary {
            delegate_name: delegate.name.clone(),
            declaration: delegate.render(),
            accessibility: delegate.accessibility,
            file: plan.file.clone(),
            insertion_line,
            edits_count: patch.edit_count(),
            bytes_added: placement.edit.text.len(),
        },
        verification,
        applied: options.apply.then_some(true),
        files_written,
        warnings: plan.warnings,
    })
}

// ============================================================================
// Tests
// ============================================================================

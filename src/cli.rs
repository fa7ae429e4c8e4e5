//! CLI front door for agent integration.
//!
//! Provides the command-line interface helpers for csfix operations:
//! - `create-delegate` - Insert the missing delegate, with verification
//! - `analyze create-delegate` - Preview the insertion (diff, JSON, summary)
//!
//! ## Workspace Scanning
//!
//! With `scan` set, every `.cs` file under the workspace root contributes
//! declared types to the existence check. Without it, only the target file
//! is consulted.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, CsfixError>`. Operation errors convert
//! through the bridges in `csfix-csharp`.

use std::path::{Component, Path};

use csfix_core::error::CsfixError;
use csfix_core::output::Location;
use csfix_csharp::ops::create_delegate::{
    analyze_create_delegate, create_delegate, CreateDelegateAnalysis, CreateDelegateOptions,
    CreateDelegateOutput,
};
use csfix_csharp::ops::CSharpOpContext;
use csfix_csharp::verification::VerificationMode;

/// Analyze a create-delegate operation (preview without applying).
///
/// # Arguments
///
/// * `workspace_root` - Root that relative `at` paths resolve against
/// * `scan` - Collect declared types from every file under the root
/// * `at` - Location string in "file:line:col" format
/// * `known_types` - Extra type names to treat as existing
pub fn run_analyze_create_delegate(
    workspace_root: &Path,
    scan: bool,
    at: &str,
    known_types: &[String],
) -> Result<CreateDelegateAnalysis, CsfixError> {
    let location = parse_location(workspace_root, at)?;
    let ctx = CSharpOpContext::new(workspace_root, scan);
    let collected = ctx.collect_files(&location.file)?;

    let options = CreateDelegateOptions {
        verify: VerificationMode::None,
        apply: false,
        known_types: known_types.to_vec(),
    };
    let mut analysis = analyze_create_delegate(&collected.files, &location, &options)?;
    analysis.warnings.extend(collected.warnings());
    Ok(analysis)
}

/// Execute a create-delegate operation.
///
/// # Arguments
///
/// * `workspace_root` - Root that relative `at` paths resolve against
/// * `scan` - Collect declared types from every file under the root
/// * `at` - Location string in "file:line:col" format
/// * `known_types` - Extra type names to treat as existing
/// * `verify_mode` - Verification mode after the edit
/// * `apply` - Whether to write the edited file
pub fn run_create_delegate(
    workspace_root: &Path,
    scan: bool,
    at: &str,
    known_types: &[String],
    verify_mode: VerificationMode,
    apply: bool,
) -> Result<CreateDelegateOutput, CsfixError> {
    let location = parse_location(workspace_root, at)?;
    let ctx = CSharpOpContext::new(workspace_root, scan);
    let collected = ctx.collect_files(&location.file)?;

    let options = CreateDelegateOptions {
        verify: verify_mode,
        apply,
        known_types: known_types.to_vec(),
    };
    let mut output = create_delegate(workspace_root, &collected.files, &location, &options)?;
    output.warnings.extend(collected.warnings());
    Ok(output)
}

/// Parse `file:line:col` and normalize the file to the workspace-relative,
/// `/`-separated form that file collection uses.
///
/// An absolute path must lie under the workspace root. `.` components are
/// dropped and `..` components are folded, so `./src/A.cs` and
/// `src/../src/A.cs` both name `src/A.cs`.
fn parse_location(workspace_root: &Path, at: &str) -> Result<Location, CsfixError> {
    let mut location = Location::parse(at).ok_or_else(|| {
        CsfixError::invalid_args_with_details(
            format!("invalid location format '{}', expected path:line:col", at),
            serde_json::json!({ "at": at }),
        )
    })?;

    let outside = || {
        CsfixError::invalid_args_with_details(
            format!(
                "location '{}' is outside the workspace {}",
                at,
                workspace_root.display()
            ),
            serde_json::json!({ "at": at, "workspace": workspace_root.display().to_string() }),
        )
    };

    let path = Path::new(&location.file);
    let relative = if path.is_absolute() {
        path.strip_prefix(workspace_root).map_err(|_| outside())?
    } else {
        path
    };
    location.file = normalize_relative(relative).ok_or_else(outside)?;
    Ok(location)
}

/// Join the normal components of `path` with `/`, folding `.` and `..`.
/// Returns `None` if `..` climbs above the start or nothing is left.
fn normalize_relative(path: &Path) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

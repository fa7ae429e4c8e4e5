//! CLI end-to-end tests.
//!
//! These tests spawn the actual `csfix` binary against a temporary
//! workspace and validate stdout, file contents and exit codes.
//!
//! Exit code expectations:
//! - 0: Success
//! - 2: Invalid arguments (malformed location, bad flags)
//! - 3: Resolution error (nothing to refactor, file not found)

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const WIDGET: &str = "namespace Demo
{
    public class Widget
    {
        public event Changed OnChanged;
    }
}
";

const WIDGET_WITH_DELEGATE: &str = "namespace Demo
{
    public delegate void Changed(object sender, System.EventArgs e);

    public class Widget
    {
        public event Changed OnChanged;
    }
}
";

/// Caret on `Changed` in the event declaration.
const AT: &str = "Widget.cs:5:22";

/// Run csfix in `dir` and return (stdout, stderr, exit_code).
fn run_csfix(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_csfix"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute csfix");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        fs::write(dir.path().join(path), content).unwrap();
    }
    dir
}

fn read(dir: &TempDir, path: &str) -> String {
    fs::read_to_string(dir.path().join(path)).unwrap()
}

// ============================================================================
// create-delegate
// ============================================================================

#[test]
fn create_delegate_applies_by_default() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (stdout, _stderr, exit_code) = run_csfix(dir.path(), &["create-delegate", "--at", AT]);

    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    assert!(stdout.contains("Created delegate 'Changed'"), "{}", stdout);
    assert!(stdout.contains("Verification (syntax): passed"), "{}", stdout);
    assert_eq!(read(&dir, "Widget.cs"), WIDGET_WITH_DELEGATE);
}

#[test]
fn create_delegate_json_output() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (stdout, _stderr, exit_code) = run_csfix(
        dir.path(),
        &["create-delegate", "--at", AT, "--format", "json"],
    );

    assert_eq!(exit_code, 0);
    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["schema_version"], "1");
    assert_eq!(json["applied"], true);
    assert_eq!(json["files_written"][0], "Widget.cs");
    assert_eq!(json["summary"]["delegate_name"], "Changed");
    assert_eq!(json["summary"]["accessibility"], "public");
    assert_eq!(json["summary"]["insertion_line"], 3);
    assert_eq!(json["verification"]["status"], "passed");
}

#[test]
fn dry_run_leaves_file_untouched() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (stdout, _stderr, exit_code) = run_csfix(
        dir.path(),
        &["create-delegate", "--at", AT, "--dry-run", "--format", "json"],
    );

    assert_eq!(exit_code, 0);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert!(json.get("applied").is_none());
    assert!(json.get("files_written").is_none());
    assert_eq!(read(&dir, "Widget.cs"), WIDGET);
}

#[test]
fn no_verify_skips_verification() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (stdout, _stderr, exit_code) = run_csfix(
        dir.path(),
        &["create-delegate", "--at", AT, "--no-verify", "--format", "json"],
    );

    assert_eq!(exit_code, 0);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["verification"]["status"], "skipped");
}

#[test]
fn second_run_is_nothing_to_refactor() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (_, _, first) = run_csfix(dir.path(), &["create-delegate", "--at", AT]);
    assert_eq!(first, 0);

    // The event moved down two lines.
    let (stdout, _stderr, exit_code) =
        run_csfix(dir.path(), &["create-delegate", "--at", "Widget.cs:7:22"]);
    assert_eq!(exit_code, 3);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 3);
    assert_eq!(json["error"]["location"]["file"], "Widget.cs");
    assert_eq!(read(&dir, "Widget.cs"), WIDGET_WITH_DELEGATE);
}

#[test]
fn caret_outside_event_exits_3() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (stdout, _stderr, exit_code) =
        run_csfix(dir.path(), &["create-delegate", "--at", "Widget.cs:1:1"]);

    assert_eq!(exit_code, 3);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        json["error"]["details"]["reason"],
        "caret is not on an event field declaration"
    );
    assert_eq!(json["error"]["details"]["reason_code"], "caret_outside_event");
}

#[test]
fn malformed_location_exits_2() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (stdout, _stderr, exit_code) =
        run_csfix(dir.path(), &["create-delegate", "--at", "Widget.cs"]);

    assert_eq!(exit_code, 2);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"]["code"], 2);
}

#[test]
fn missing_file_exits_3() {
    let dir = workspace(&[]);
    let (stdout, _stderr, exit_code) =
        run_csfix(dir.path(), &["create-delegate", "--at", "Nope.cs:1:1"]);

    assert_eq!(exit_code, 3);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"]["details"]["path"], "Nope.cs");
}

#[test]
fn bom_file_keeps_bom_and_positions() {
    let bom_widget = format!("\u{feff}{}", WIDGET);
    let dir = workspace(&[("Widget.cs", bom_widget.as_str())]);

    let (stdout, _stderr, exit_code) = run_csfix(
        dir.path(),
        &["analyze", "create-delegate", "--at", AT, "--format", "json"],
    );
    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["insertion_point"]["line"], 3);

    let (stdout, _stderr, exit_code) = run_csfix(dir.path(), &["create-delegate", "--at", AT]);
    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    assert_eq!(
        read(&dir, "Widget.cs"),
        format!("\u{feff}{}", WIDGET_WITH_DELEGATE)
    );
}

#[test]
fn bom_file_scope_class() {
    let dir = workspace(&[(
        "A.cs",
        "\u{feff}public class A\n{\n    public event Changed OnChanged;\n}\n",
    )]);
    let (stdout, _stderr, exit_code) =
        run_csfix(dir.path(), &["create-delegate", "--at", "A.cs:3:18"]);
    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    assert_eq!(
        read(&dir, "A.cs"),
        "\u{feff}public delegate void Changed(object sender, System.EventArgs e);\n\npublic class A\n{\n    public event Changed OnChanged;\n}\n"
    );
}

// ============================================================================
// Workspace scanning and known types
// ============================================================================

#[test]
fn workspace_scan_finds_existing_delegate() {
    let dir = workspace(&[
        ("Widget.cs", WIDGET),
        (
            "Handlers.cs",
            "namespace Demo\n{\n    public delegate void Changed(object sender, System.EventArgs e);\n}\n",
        ),
    ]);

    // Without a workspace only the target file is consulted.
    let (_, _, exit_code) = run_csfix(dir.path(), &["create-delegate", "--at", AT, "--dry-run"]);
    assert_eq!(exit_code, 0);

    let root = dir.path().to_string_lossy().to_string();
    let (_, _, exit_code) = run_csfix(
        dir.path(),
        &["--workspace", &root, "create-delegate", "--at", AT],
    );
    assert_eq!(exit_code, 3);
    assert_eq!(read(&dir, "Widget.cs"), WIDGET);
}

#[test]
fn workspace_scan_skips_non_utf8_files() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    fs::write(dir.path().join("Latin1.cs"), b"// caf\xe9\nclass L { }\n").unwrap();
    let root = dir.path().to_string_lossy().to_string();

    let (stdout, _stderr, exit_code) = run_csfix(
        dir.path(),
        &[
            "--workspace", &root, "analyze", "create-delegate", "--at", AT, "--format", "json",
        ],
    );
    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["warnings"][0]["code"], "unreadable_file");
    assert_eq!(json["warnings"][0]["message"], "skipped Latin1.cs: not valid UTF-8");

    let (stdout, _stderr, exit_code) =
        run_csfix(dir.path(), &["--workspace", &root, "create-delegate", "--at", AT]);
    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    assert!(stdout.contains("skipped Latin1.cs"), "{}", stdout);
    assert_eq!(read(&dir, "Widget.cs"), WIDGET_WITH_DELEGATE);
}

#[test]
fn dot_slash_location_matches_scanned_target() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let root = dir.path().to_string_lossy().to_string();
    let (stdout, _stderr, exit_code) = run_csfix(
        dir.path(),
        &[
            "--workspace", &root, "analyze", "create-delegate", "--at", "./Widget.cs:5:22",
            "--format", "json",
        ],
    );
    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["event"]["file"], "Widget.cs");
    assert_eq!(json["patch"]["edits"][0]["file"], "Widget.cs");
}

#[test]
fn known_type_blocks_creation() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (_, _, exit_code) = run_csfix(
        dir.path(),
        &["create-delegate", "--at", AT, "--known-type", "Changed"],
    );
    assert_eq!(exit_code, 3);
    assert_eq!(read(&dir, "Widget.cs"), WIDGET);
}

// ============================================================================
// analyze create-delegate
// ============================================================================

#[test]
fn analyze_default_is_unified_diff() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (stdout, _stderr, exit_code) =
        run_csfix(dir.path(), &["analyze", "create-delegate", "--at", AT]);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("--- a/Widget.cs"), "{}", stdout);
    assert!(stdout.contains("+++ b/Widget.cs"), "{}", stdout);
    assert!(
        stdout.contains("+    public delegate void Changed(object sender, System.EventArgs e);"),
        "{}",
        stdout
    );
    assert_eq!(read(&dir, "Widget.cs"), WIDGET);
}

#[test]
fn analyze_json_describes_event_and_insertion() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (stdout, _stderr, exit_code) = run_csfix(
        dir.path(),
        &["analyze", "create-delegate", "--at", AT, "--format", "json"],
    );

    assert_eq!(exit_code, 0);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["event"]["names"][0], "OnChanged");
    assert_eq!(json["event"]["container"], "Widget");
    assert_eq!(json["event"]["namespace"], "Demo");
    assert_eq!(json["delegate"]["name"], "Changed");
    assert_eq!(json["insertion_point"]["line"], 3);
    assert_eq!(json["insertion_point"]["indentation"], "    ");
    assert_eq!(json["insertion_point"]["scope"]["kind"], "namespace");
}

#[test]
fn analyze_summary() {
    let dir = workspace(&[("Widget.cs", WIDGET)]);
    let (stdout, _stderr, exit_code) = run_csfix(
        dir.path(),
        &["analyze", "create-delegate", "--at", AT, "--format", "summary"],
    );

    assert_eq!(exit_code, 0);
    assert!(
        stdout.starts_with("Would create delegate 'Changed' in Widget.cs at line 3"),
        "{}",
        stdout
    );
}

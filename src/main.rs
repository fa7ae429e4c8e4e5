//! Binary entry point for the csfix CLI.
//!
//! This module provides the command-line interface for csfix operations.
//! Results and errors are JSON on stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Insert the missing delegate for the event at the caret (applies by default)
//! csfix create-delegate --at src/Widget.cs:12:22
//!
//! # Preview without applying (outputs unified diff)
//! csfix analyze create-delegate --at src/Widget.cs:12:22
//!
//! # Consider types declared anywhere in the workspace
//! csfix --workspace . create-delegate --at src/Widget.cs:12:22
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use csfix::cli::{run_analyze_create_delegate, run_create_delegate};
use csfix_core::error::{CsfixError, OutputErrorCode};
use csfix_core::output::{emit_response, ErrorResponse};
use csfix_csharp::ops::create_delegate::{CreateDelegateAnalysis, CreateDelegateOutput};
use csfix_csharp::verification::{VerificationMode, VerificationStatus};

// ============================================================================
// CLI Structure
// ============================================================================

/// Verified C# refactoring for coding agents.
#[derive(Parser, Debug)]
#[command(name = "csfix", version, about = "Verified C# refactoring for coding agents")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Workspace root directory. When given, every `.cs` file under it
    /// counts when checking whether the delegate type already exists.
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Extra type name to treat as existing (repeatable).
    #[arg(long = "known-type", global = true)]
    known_types: Vec<String>,
}

impl GlobalArgs {
    /// Workspace root and whether to scan it.
    fn workspace_root(&self) -> Result<(PathBuf, bool), CsfixError> {
        match &self.workspace {
            Some(path) => {
                let root = path.canonicalize().map_err(|e| {
                    CsfixError::invalid_args(format!(
                        "invalid workspace '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok((root, true))
            }
            None => Ok((std::env::current_dir()?, false)),
        }
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output format for the create-delegate command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum CreateFormat {
    /// Human-readable text summary (default).
    #[default]
    Text,
    /// Full JSON response.
    Json,
}

/// Output format for analyze command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum AnalyzeFormat {
    /// Unified diff format (default, compatible with `git apply`).
    #[default]
    Diff,
    /// Full JSON response.
    Json,
    /// Brief text summary.
    Summary,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a refactoring operation without applying changes.
    Analyze {
        #[command(subcommand)]
        op: AnalyzeOp,
    },
    /// Create the missing delegate type of an event (apply-by-default).
    ///
    /// Use --dry-run to preview changes without modifying files.
    CreateDelegate {
        /// Caret location inside the event declaration (file:line:col).
        #[arg(long)]
        at: String,
        /// Preview changes without applying (default: apply changes).
        #[arg(long)]
        dry_run: bool,
        /// Verification mode after applying changes.
        #[arg(long, value_enum, default_value = "syntax")]
        verify: VerifyMode,
        /// Skip verification entirely.
        #[arg(long, conflicts_with = "verify")]
        no_verify: bool,
        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: CreateFormat,
    },
}

/// Analyze operations (used by the `analyze` command).
#[derive(Subcommand, Clone, Debug)]
enum AnalyzeOp {
    /// Analyze a create-delegate operation.
    ///
    /// Shows the declaration and where it would go without applying it.
    CreateDelegate {
        /// Caret location inside the event declaration (file:line:col).
        #[arg(long)]
        at: String,
        /// Output format.
        #[arg(long, value_enum, default_value = "diff")]
        format: AnalyzeFormat,
    },
}

/// Verification modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum VerifyMode {
    /// No verification.
    None,
    /// Re-parse the edited file.
    Syntax,
}

impl From<VerifyMode> for VerificationMode {
    fn from(mode: VerifyMode) -> Self {
        match mode {
            VerifyMode::None => VerificationMode::None,
            VerifyMode::Syntax => VerificationMode::Syntax,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err, None);

            // Errors go to stdout as JSON, like results.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), CsfixError> {
    match cli.command {
        Command::Analyze { op } => execute_analyze(&cli.global, op),
        Command::CreateDelegate {
            at,
            dry_run,
            verify,
            no_verify,
            format,
        } => execute_create_delegate(&cli.global, &at, dry_run, verify, no_verify, format),
    }
}

// ============================================================================
// Command Executors
// ============================================================================

/// Execute analyze command.
fn execute_analyze(global: &GlobalArgs, op: AnalyzeOp) -> Result<(), CsfixError> {
    match op {
        AnalyzeOp::CreateDelegate { at, format } => {
            let (root, scan) = global.workspace_root()?;
            let analysis = run_analyze_create_delegate(&root, scan, &at, &global.known_types)?;

            match format {
                AnalyzeFormat::Json => print_json(&analysis)?,
                AnalyzeFormat::Diff => {
                    let diff = &analysis.patch.unified_diff;
                    if diff.is_empty() {
                        println!("No changes.");
                    } else {
                        print!("{}", diff);
                    }
                }
                AnalyzeFormat::Summary => output_analyze_summary(&analysis),
            }
            Ok(())
        }
    }
}

/// Print a brief text summary of an analysis.
fn output_analyze_summary(analysis: &CreateDelegateAnalysis) {
    println!(
        "Would create delegate '{}' in {} at line {}",
        analysis.delegate.name, analysis.event.file, analysis.insertion_point.line
    );
    println!("  {}", analysis.delegate.declaration);
    print_warnings(analysis.warnings.iter().map(|w| w.message.as_str()));
}

/// Execute create-delegate command.
///
/// # Arguments
///
/// * `global` - Global CLI arguments
/// * `at` - Location string in "file:line:col" format
/// * `dry_run` - If true, preview changes without applying
/// * `verify` - Verification mode (default: syntax)
/// * `no_verify` - If true, skip verification entirely
/// * `format` - Output format (text or json)
fn execute_create_delegate(
    global: &GlobalArgs,
    at: &str,
    dry_run: bool,
    verify: VerifyMode,
    no_verify: bool,
    format: CreateFormat,
) -> Result<(), CsfixError> {
    let (root, scan) = global.workspace_root()?;

    // --no-verify takes precedence (conflicts_with is already enforced by clap)
    let effective_verify = if no_verify {
        VerificationMode::None
    } else {
        verify.into()
    };

    let output = run_create_delegate(
        &root,
        scan,
        at,
        &global.known_types,
        effective_verify,
        !dry_run,
    )?;

    match format {
        CreateFormat::Json => print_json(&output)?,
        CreateFormat::Text => output_create_summary(&output, &root),
    }
    Ok(())
}

/// Print a human-readable summary of a create-delegate result.
fn output_create_summary(output: &CreateDelegateOutput, root: &Path) {
    let summary = &output.summary;
    if output.applied == Some(true) {
        println!(
            "Created delegate '{}' in {}:{}",
            summary.delegate_name,
            root.join(&summary.file).display(),
            summary.insertion_line
        );
    } else {
        println!(
            "Dry run: would create delegate '{}' in {}:{}",
            summary.delegate_name, summary.file, summary.insertion_line
        );
    }
    println!("  {}", summary.declaration);

    let verification = &output.verification;
    match verification.status {
        VerificationStatus::Passed => println!("  Verification (syntax): passed"),
        VerificationStatus::Failed => println!("  Verification (syntax): FAILED"),
        VerificationStatus::Skipped => {}
    }
    print_warnings(output.warnings.iter().map(|w| w.message.as_str()));
}

fn print_warnings<'a>(warnings: impl Iterator<Item = &'a str>) {
    let mut warnings = warnings.peekable();
    if warnings.peek().is_some() {
        println!("  Warnings:");
        for message in warnings {
            println!("    - {}", message);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CsfixError> {
    emit_response(value, &mut io::stdout()).map_err(|e| CsfixError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn parse_create_delegate_defaults() {
            let args = ["csfix", "create-delegate", "--at", "src/Widget.cs:12:22"];
            let cli = Cli::try_parse_from(args).unwrap();
            match cli.command {
                Command::CreateDelegate {
                    at,
                    dry_run,
                    verify,
                    no_verify,
                    format,
                } => {
                    assert_eq!(at, "src/Widget.cs:12:22");
                    assert!(!dry_run);
                    assert_eq!(verify, VerifyMode::Syntax);
                    assert!(!no_verify);
                    assert_eq!(format, CreateFormat::Text);
                }
                _ => panic!("expected CreateDelegate"),
            }
        }

        #[test]
        fn parse_create_delegate_flags() {
            let args = [
                "csfix",
                "create-delegate",
                "--at",
                "a.cs:1:1",
                "--dry-run",
                "--verify",
                "none",
                "--format",
                "json",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            match cli.command {
                Command::CreateDelegate {
                    dry_run,
                    verify,
                    format,
                    ..
                } => {
                    assert!(dry_run);
                    assert_eq!(verify, VerifyMode::None);
                    assert_eq!(format, CreateFormat::Json);
                }
                _ => panic!("expected CreateDelegate"),
            }
        }

        #[test]
        fn no_verify_conflicts_with_verify() {
            let args = [
                "csfix",
                "create-delegate",
                "--at",
                "a.cs:1:1",
                "--verify",
                "syntax",
                "--no-verify",
            ];
            assert!(Cli::try_parse_from(args).is_err());
        }

        #[test]
        fn parse_analyze_create_delegate() {
            let args = ["csfix", "analyze", "create-delegate", "--at", "a.cs:1:1"];
            let cli = Cli::try_parse_from(args).unwrap();
            match cli.command {
                Command::Analyze {
                    op: AnalyzeOp::CreateDelegate { at, format },
                } => {
                    assert_eq!(at, "a.cs:1:1");
                    assert_eq!(format, AnalyzeFormat::Diff);
                }
                _ => panic!("expected Analyze CreateDelegate"),
            }
        }

        #[test]
        fn parse_analyze_formats() {
            for (flag, expected) in [
                ("diff", AnalyzeFormat::Diff),
                ("json", AnalyzeFormat::Json),
                ("summary", AnalyzeFormat::Summary),
            ] {
                let args = [
                    "csfix",
                    "analyze",
                    "create-delegate",
                    "--at",
                    "a.cs:1:1",
                    "--format",
                    flag,
                ];
                match Cli::try_parse_from(args).unwrap().command {
                    Command::Analyze {
                        op: AnalyzeOp::CreateDelegate { format, .. },
                    } => assert_eq!(format, expected),
                    _ => panic!("expected Analyze CreateDelegate"),
                }
            }
        }

        #[test]
        fn at_is_required() {
            assert!(Cli::try_parse_from(["csfix", "create-delegate"]).is_err());
        }
    }

    mod global_args {
        use super::*;

        #[test]
        fn global_args_after_subcommand() {
            let args = [
                "csfix",
                "create-delegate",
                "--at",
                "a.cs:1:1",
                "--workspace",
                "/tmp/ws",
                "--known-type",
                "Changed",
                "--known-type",
                "Clicked",
                "--log-level",
                "debug",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(cli.global.workspace, Some(PathBuf::from("/tmp/ws")));
            assert_eq!(cli.global.known_types, vec!["Changed", "Clicked"]);
            assert!(matches!(cli.global.log_level, LogLevel::Debug));
        }

        #[test]
        fn defaults() {
            let cli = Cli::try_parse_from(["csfix", "create-delegate", "--at", "a.cs:1:1"]).unwrap();
            assert!(cli.global.workspace.is_none());
            assert!(cli.global.known_types.is_empty());
            assert!(matches!(cli.global.log_level, LogLevel::Warn));
        }

        #[test]
        fn missing_workspace_is_invalid_args() {
            let global = GlobalArgs {
                workspace: Some(PathBuf::from("/definitely/not/here")),
                log_level: LogLevel::Warn,
                known_types: Vec::new(),
            };
            let err = global.workspace_root().unwrap_err();
            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        }
    }

    mod verify_mode_conversion {
        use super::*;

        #[test]
        fn converts() {
            assert_eq!(VerificationMode::from(VerifyMode::None), VerificationMode::None);
            assert_eq!(
                VerificationMode::from(VerifyMode::Syntax),
                VerificationMode::Syntax
            );
        }
    }

    mod log_level {
        use super::*;

        #[test]
        fn maps_to_tracing_levels() {
            assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
            assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
            assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        }
    }
}

//! csfix: verified, deterministic C# refactors
//!
//! A refactoring kernel for coding agents. The first operation synthesizes
//! the missing delegate type of a field-like event and inserts it before the
//! outermost containing type.

// Core infrastructure - re-exported from csfix-core
pub use csfix_core::diff;
pub use csfix_core::error;
pub use csfix_core::output;
pub use csfix_core::patch;
pub use csfix_core::text;
pub use csfix_core::types;

// Syntax and language support
pub use csfix_csharp as csharp;
pub use csfix_cst as cst;

// Front door for agents
pub mod cli;

//! Core infrastructure for csfix.
//!
//! This crate provides language-agnostic infrastructure:
//! - Spans, content hashes and the anchored patch IR for code transformations
//! - Error types and exit codes
//! - JSON output types for CLI responses
//! - Text utilities and unified diff generation

pub mod diff;
pub mod error;
pub mod output;
pub mod patch;
pub mod text;
pub mod types;

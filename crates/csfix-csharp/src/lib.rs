// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C# language support for csfix.
//!
//! This crate holds the create-delegate refactoring and the pieces it is
//! built from:
//! - Type existence resolution over declared and well-known framework types
//! - Caret applicability analysis for event field declarations
//! - Accessibility inference for the synthesized delegate
//! - The create-delegate operation (synthesis, placement, apply)
//! - Syntax verification and workspace file collection

pub mod accessibility;
pub mod analyzer;
mod error_bridges;
pub mod files;
pub mod ops;
pub mod resolver;
pub mod test_helpers;
pub mod verification;

pub use analyzer::{analyze, EventFieldDeclaration, NotApplicable};
pub use ops::create_delegate::{
    apply, compute_action, create_delegate_in_source, CreateDelegateAction, SynthesizedDelegate,
};
pub use resolver::{FrameworkTypes, SymbolTable, TypeReference, TypeResolver};

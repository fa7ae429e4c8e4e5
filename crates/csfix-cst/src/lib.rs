// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A C# tokenizer and declaration-level Concrete Syntax Tree.
//!
//! # Overview
//!
//! - **Tokenizing**: [`tokenize`] splits source into tokens with byte spans.
//! - **Parsing**: [`parse_file`] builds a [`CompilationUnit`] of namespaces,
//!   types and events, keeping every other member as an opaque span.
//! - **Position lookup**: [`position_lookup`] maps a caret offset to the
//!   token under it and to the chain of declarations enclosing it.
//!
//! The tree never owns text. Spans index into the source string the file
//! was parsed from, so rendering a node is a slice of that string and
//! untouched code round-trips byte for byte.
//!
//! # Quick Start
//!
//! ```
//! use csfix_cst::{parse_file, TypeKind};
//!
//! let parsed = parse_file("class TestClass { event MyEventHandler evt; }").unwrap();
//! let class = parsed.unit.types().next().unwrap();
//! assert_eq!(class.kind, TypeKind::Class);
//! assert_eq!(class.events().count(), 1);
//! ```

pub mod nodes;
pub mod parser;
pub mod position_lookup;
pub mod tokenizer;

pub use nodes::{
    CompilationUnit, EventDecl, Ident, Member, NamedType, NamespaceDecl, NamespaceMember,
    TypeDecl, TypeKind, TypeSegment, TypeSyntax, UsingDirective, UsingKind,
};
pub use parser::{parse_compilation_unit, parse_file, ParsedFile, ParserError};
pub use tokenizer::{tokenize, Token, TokenKind, TokenizeError};

// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Position-to-node lookup for C# syntax trees.
//!
//! A caret is a byte offset *between* characters, so a caret touches a node
//! when `start <= offset <= end`. When two siblings touch the same offset
//! (the caret sits exactly between them), the one that contains the offset
//! half-open (`start <= offset < end`) wins.
//!
//! # Usage
//!
//! ```
//! use csfix_cst::{parse_file, position_lookup::{ancestors_at, event_path_at, NodeRef}};
//!
//! let source = "namespace foo { class A { event H evt; } }";
//! let parsed = parse_file(source).unwrap();
//! let offset = source.find("evt").unwrap();
//!
//! let path = ancestors_at(&parsed.unit, offset);
//! assert!(matches!(path.last(), Some(NodeRef::Event(_))));
//!
//! let event = event_path_at(&parsed.unit, offset).unwrap();
//! assert_eq!(event.namespaces.len(), 1);
//! assert_eq!(event.types[0].name.text, "A");
//! ```

use csfix_core::patch::Span;

use crate::nodes::{CompilationUnit, EventDecl, Member, NamespaceDecl, NamespaceMember, TypeDecl};
use crate::tokenizer::Token;

/// A node on the path from the root to a position.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Namespace(&'a NamespaceDecl),
    Type(&'a TypeDecl),
    Event(&'a EventDecl),
}

impl NodeRef<'_> {
    pub fn span(&self) -> Span {
        match self {
            NodeRef::Namespace(ns) => ns.span,
            NodeRef::Type(ty) => ty.span,
            NodeRef::Event(ev) => ev.span,
        }
    }
}

/// The event under a position together with everything enclosing it.
#[derive(Debug, Clone)]
pub struct EventPath<'a> {
    /// Enclosing namespaces, outermost first.
    pub namespaces: Vec<&'a NamespaceDecl>,
    /// Enclosing types, outermost first. Never empty.
    pub types: Vec<&'a TypeDecl>,
    pub event: &'a EventDecl,
}

impl<'a> EventPath<'a> {
    /// The type that declares the event.
    pub fn containing_type(&self) -> &'a TypeDecl {
        // `event_path_at` only builds paths with at least one type.
        self.types[self.types.len() - 1]
    }

    /// The type declared directly in a namespace or at file level.
    pub fn outermost_type(&self) -> &'a TypeDecl {
        self.types[0]
    }

    /// The innermost enclosing namespace, if any.
    pub fn namespace(&self) -> Option<&'a NamespaceDecl> {
        self.namespaces.last().copied()
    }
}

/// Find the token touching `offset`.
///
/// Prefers the token that starts at `offset`, then a token that contains it,
/// then a token that ends at it. The trailing Eof token is never returned.
pub fn token_at<'t, 'a>(tokens: &'t [Token<'a>], offset: usize) -> Option<&'t Token<'a>> {
    let tokens = match tokens.last() {
        Some(last) if last.is_eof() => &tokens[..tokens.len() - 1],
        _ => tokens,
    };
    // First token whose end is at or after the offset.
    let idx = tokens.partition_point(|t| t.span.end < offset);
    let candidate = tokens.get(idx)?;
    if let Some(next) = tokens.get(idx + 1) {
        if candidate.span.end == offset && next.span.start == offset {
            return Some(next);
        }
    }
    if candidate.span.touches(offset) {
        Some(candidate)
    } else {
        None
    }
}

fn pick<T: Copy>(items: impl Iterator<Item = (Span, T)>, offset: usize) -> Option<T> {
    let mut touching = None;
    for (span, item) in items {
        if span.start <= offset && offset < span.end {
            return Some(item);
        }
        if touching.is_none() && span.touches(offset) {
            touching = Some(item);
        }
    }
    touching
}

/// All namespace, type and event nodes touching `offset`, outermost first.
pub fn ancestors_at(unit: &CompilationUnit, offset: usize) -> Vec<NodeRef<'_>> {
    let mut path = Vec::new();
    let mut members: &[NamespaceMember] = &unit.members;

    loop {
        let found = pick(members.iter().map(|m| (m.span(), m)), offset);
        match found {
            Some(NamespaceMember::Namespace(ns)) => {
                path.push(NodeRef::Namespace(ns));
                members = &ns.members;
            }
            Some(NamespaceMember::Type(ty)) => {
                push_type_path(ty, offset, &mut path);
                return path;
            }
            Some(NamespaceMember::Other { .. }) | None => return path,
        }
    }
}

fn push_type_path<'a>(ty: &'a TypeDecl, offset: usize, path: &mut Vec<NodeRef<'a>>) {
    let mut current = ty;
    loop {
        path.push(NodeRef::Type(current));
        match pick(current.members.iter().map(|m| (m.span(), m)), offset) {
            Some(Member::Type(nested)) => current = nested,
            Some(Member::Event(event)) => {
                path.push(NodeRef::Event(event));
                return;
            }
            Some(Member::Other { .. }) | None => return,
        }
    }
}

/// The event declaration touching `offset`, with its enclosing nodes.
pub fn event_path_at(unit: &CompilationUnit, offset: usize) -> Option<EventPath<'_>> {
    let mut namespaces = Vec::new();
    let mut types = Vec::new();
    let mut event = None;

    for node in ancestors_at(unit, offset) {
        match node {
            NodeRef::Namespace(ns) => namespaces.push(ns),
            NodeRef::Type(ty) => types.push(ty),
            NodeRef::Event(ev) => event = Some(ev),
        }
    }

    let event = event?;
    if types.is_empty() {
        return None;
    }
    Some(EventPath {
        namespaces,
        types,
        event,
    })
}

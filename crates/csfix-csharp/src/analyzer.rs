// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Caret applicability analysis.
//!
//! A caret is eligible when it touches the `event` keyword, the event's
//! declared type, or one of its declarator names, and the event is
//! field-like (`event T name;`). Accessor-style events are rejected at any
//! caret position inside them.

use serde::Serialize;
use thiserror::Error;

use csfix_core::patch::Span;
use csfix_cst::position_lookup::{event_path_at, token_at, EventPath};
use csfix_cst::{EventDecl, NamespaceDecl, ParsedFile, TypeDecl, TypeKind, TypeSyntax};

/// Why the refactoring does not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotApplicable {
    #[error("caret is not on an event field declaration")]
    CaretOutsideEvent,

    #[error("event declares add/remove accessors")]
    AccessorStyleEvent,

    #[error("type '{name}' already exists")]
    TypeAlreadyExists { name: String },

    #[error("type '{text}' cannot be synthesized as a delegate")]
    UnsupportedTypeReference { text: String },

    #[error("source does not parse: {message}")]
    MalformedSource { message: String },
}

impl NotApplicable {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            NotApplicable::CaretOutsideEvent => "caret_outside_event",
            NotApplicable::AccessorStyleEvent => "accessor_style_event",
            NotApplicable::TypeAlreadyExists { .. } => "type_already_exists",
            NotApplicable::UnsupportedTypeReference { .. } => "unsupported_type_reference",
            NotApplicable::MalformedSource { .. } => "malformed_source",
        }
    }
}

/// JSON form of a [`NotApplicable`] reason.
#[derive(Debug, Clone, Serialize)]
pub struct NotApplicableInfo {
    pub reason: &'static str,
    pub message: String,
}

impl From<&NotApplicable> for NotApplicableInfo {
    fn from(value: &NotApplicable) -> Self {
        NotApplicableInfo {
            reason: value.code(),
            message: value.to_string(),
        }
    }
}

/// An eligible event field declaration and everything enclosing it.
#[derive(Debug, Clone)]
pub struct EventFieldDeclaration<'a> {
    pub path: EventPath<'a>,
    /// Source text of the declared type.
    pub type_text: &'a str,
}

impl<'a> EventFieldDeclaration<'a> {
    pub fn event(&self) -> &'a EventDecl {
        self.path.event
    }

    pub fn declared_type(&self) -> &'a TypeSyntax {
        &self.path.event.ty
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> {
        self.path.event.declarators.iter().map(|d| d.text.as_str())
    }

    pub fn modifiers(&self) -> impl Iterator<Item = &'a str> {
        self.path.event.modifiers.iter().map(|m| m.text.as_str())
    }

    pub fn containing_type(&self) -> &'a TypeDecl {
        self.path.containing_type()
    }

    pub fn container_kind(&self) -> TypeKind {
        self.containing_type().kind
    }

    pub fn namespace(&self) -> Option<&'a NamespaceDecl> {
        self.path.namespace()
    }
}

fn caret_on_event_parts(event: &EventDecl, caret: usize) -> bool {
    let parts = [event.event_keyword, event.ty.span()]
        .into_iter()
        .chain(event.declarators.iter().map(|d| d.span));
    parts.into_iter().any(|span: Span| span.touches(caret))
}

/// Decide whether `caret` sits on an eligible event field declaration.
pub fn analyze<'a>(
    parsed: &'a ParsedFile<'_>,
    caret: usize,
) -> Result<EventFieldDeclaration<'a>, NotApplicable> {
    let token = token_at(&parsed.tokens, caret).map(|t| t.text);
    let Some(path) = event_path_at(&parsed.unit, caret) else {
        tracing::debug!(caret, ?token, "caret is not inside an event declaration");
        return Err(NotApplicable::CaretOutsideEvent);
    };

    let event = path.event;
    if !event.is_field_like() {
        tracing::debug!(caret, ?token, "event has accessor bodies");
        return Err(NotApplicable::AccessorStyleEvent);
    }
    if !caret_on_event_parts(event, caret) {
        tracing::debug!(caret, ?token, "caret is inside the event but not on an eligible token");
        return Err(NotApplicable::CaretOutsideEvent);
    }

    let type_text = parsed.text(event.ty.span());
    tracing::debug!(
        caret,
        ?token,
        event_type = type_text,
        container = %path.containing_type().name.text,
        "eligible event field declaration"
    );
    Ok(EventFieldDeclaration { path, type_text })
}

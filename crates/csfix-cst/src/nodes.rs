// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Declaration-level C# syntax tree.
//!
//! Only the structure needed to reason about types and events is modeled:
//! using directives, namespaces, type declarations, event declarations and
//! type references. Every other member is kept as an opaque span. All nodes
//! carry byte spans into the source they were parsed from, so the text of
//! any node is `&source[node.span.start..node.span.end]`.

use csfix_core::patch::Span;

/// An identifier as written, including a leading `@` for verbatim identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Ident {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Ident {
            text: text.into(),
            span,
        }
    }

    /// The identifier without a verbatim `@` prefix.
    pub fn name(&self) -> &str {
        self.text.strip_prefix('@').unwrap_or(&self.text)
    }
}

/// Root of a parsed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub usings: Vec<UsingDirective>,
    pub members: Vec<NamespaceMember>,
    pub span: Span,
}

impl CompilationUnit {
    /// Top-level type declarations, in source order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.members.iter().filter_map(NamespaceMember::as_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    pub kind: UsingKind,
    /// `global using`.
    pub global: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsingKind {
    /// `using A.B.C;`
    Namespace(Vec<Ident>),
    /// `using static A.B.C;`
    Static(TypeSyntax),
    /// `using Alias = A.B.C;`
    Alias { alias: Ident, target: TypeSyntax },
}

/// A member of a compilation unit or namespace body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceMember {
    Namespace(NamespaceDecl),
    Type(TypeDecl),
    /// Anything else (top-level statements, assembly attributes, ...).
    Other { span: Span },
}

impl NamespaceMember {
    pub fn span(&self) -> Span {
        match self {
            NamespaceMember::Namespace(ns) => ns.span,
            NamespaceMember::Type(ty) => ty.span,
            NamespaceMember::Other { span } => *span,
        }
    }

    pub fn as_type(&self) -> Option<&TypeDecl> {
        match self {
            NamespaceMember::Type(ty) => Some(ty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Dotted name segments (`namespace A.B` has two).
    pub name: Vec<Ident>,
    pub usings: Vec<UsingDirective>,
    pub members: Vec<NamespaceMember>,
    /// `namespace A;` rather than `namespace A { ... }`.
    pub file_scoped: bool,
    /// The region members live in: between the braces, or from the `;` of a
    /// file-scoped declaration to the end of the file.
    pub body: Span,
    pub span: Span,
}

impl NamespaceDecl {
    pub fn dotted_name(&self) -> String {
        self.name
            .iter()
            .map(Ident::name)
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    RecordStruct,
    Delegate,
}

impl TypeKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::RecordStruct => "record struct",
            TypeKind::Delegate => "delegate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: Ident,
    pub type_params: Vec<Ident>,
    pub modifiers: Vec<Ident>,
    /// Spans of the `[...]` attribute sections in front of the declaration.
    pub attributes: Vec<Span>,
    pub members: Vec<Member>,
    /// Span of `{ ... }`, absent for delegates and `;`-terminated records.
    pub body: Option<Span>,
    /// Whole declaration, attributes included.
    pub span: Span,
}

impl TypeDecl {
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m.text == modifier)
    }

    /// Nested type declarations, in source order.
    pub fn nested_types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Type(ty) => Some(ty),
            _ => None,
        })
    }

    pub fn events(&self) -> impl Iterator<Item = &EventDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Event(ev) => Some(ev),
            _ => None,
        })
    }
}

/// A member of a type body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Event(EventDecl),
    Type(TypeDecl),
    /// Fields, methods, properties, ... kept as opaque token runs.
    Other { span: Span },
}

impl Member {
    pub fn span(&self) -> Span {
        match self {
            Member::Event(ev) => ev.span,
            Member::Type(ty) => ty.span,
            Member::Other { span } => *span,
        }
    }
}

/// `[attrs] modifiers event Type Name[, Name...];` or
/// `[attrs] modifiers event Type Name { add ... remove ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDecl {
    pub attributes: Vec<Span>,
    pub modifiers: Vec<Ident>,
    /// Span of the `event` keyword.
    pub event_keyword: Span,
    pub ty: TypeSyntax,
    /// `IFoo` in an explicit interface implementation `event T IFoo.Name`.
    pub explicit_interface: Option<TypeSyntax>,
    pub declarators: Vec<Ident>,
    /// Span of the `{ ... }` accessor block for accessor-style events.
    pub accessors: Option<Span>,
    pub span: Span,
}

impl EventDecl {
    pub fn is_field_like(&self) -> bool {
        self.accessors.is_none()
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m.text == modifier)
    }
}

// ============================================================================
// Type references
// ============================================================================

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSyntax {
    /// `int`, `string`, `object`, `void`, ...
    Predefined(Ident),
    /// `A.B<C>.D`, optionally `global::` or `alias::` qualified.
    Named(NamedType),
    Array {
        element: Box<TypeSyntax>,
        rank: usize,
        span: Span,
    },
    Nullable {
        inner: Box<TypeSyntax>,
        span: Span,
    },
    Pointer {
        inner: Box<TypeSyntax>,
        span: Span,
    },
    Tuple {
        elements: Vec<TypeSyntax>,
        span: Span,
    },
}

impl TypeSyntax {
    pub fn span(&self) -> Span {
        match self {
            TypeSyntax::Predefined(ident) => ident.span,
            TypeSyntax::Named(named) => named.span,
            TypeSyntax::Array { span, .. }
            | TypeSyntax::Nullable { span, .. }
            | TypeSyntax::Pointer { span, .. }
            | TypeSyntax::Tuple { span, .. } => *span,
        }
    }

    pub fn as_named(&self) -> Option<&NamedType> {
        match self {
            TypeSyntax::Named(named) => Some(named),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    /// `global` in `global::X`, or the alias in `alias::X`.
    pub qualifier: Option<Ident>,
    pub segments: Vec<TypeSegment>,
    pub span: Span,
}

impl NamedType {
    /// A single unqualified segment such as `Foo` or `Foo<T>`.
    pub fn is_simple(&self) -> bool {
        self.qualifier.is_none() && self.segments.len() == 1
    }

    pub fn last(&self) -> &TypeSegment {
        // The parser never builds a NamedType without segments.
        &self.segments[self.segments.len() - 1]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSegment {
    pub name: Ident,
    pub type_args: Vec<TypeSyntax>,
}

// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Accessibility inference for synthesized delegates.
//!
//! | event accessibility  | container reachable externally | delegate   |
//! |----------------------|--------------------------------|------------|
//! | public, protected    | yes                            | `public`   |
//! | public, protected    | no                             | (internal) |
//! | internal, private    | any                            | (internal) |
//!
//! `protected internal` counts as protected and `private protected` as
//! private. Interface members without a modifier are implicitly public.

use serde::{Deserialize, Serialize};

use csfix_cst::{Ident, TypeDecl, TypeKind};

/// Declared accessibility of a member or type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    Public,
    ProtectedInternal,
    Protected,
    Internal,
    PrivateProtected,
    Private,
}

impl Accessibility {
    /// Read accessibility from a modifier list, if one is written.
    pub fn from_modifiers(modifiers: &[Ident]) -> Option<Self> {
        let has = |m: &str| modifiers.iter().any(|i| i.text == m);
        match (
            has("public"),
            has("protected"),
            has("internal"),
            has("private"),
        ) {
            (true, ..) => Some(Accessibility::Public),
            (_, true, true, _) => Some(Accessibility::ProtectedInternal),
            (_, true, _, true) => Some(Accessibility::PrivateProtected),
            (_, true, ..) => Some(Accessibility::Protected),
            (_, _, true, _) => Some(Accessibility::Internal),
            (_, _, _, true) => Some(Accessibility::Private),
            _ => None,
        }
    }

    /// Accessibility of a member, applying the container's default.
    pub fn of_member(modifiers: &[Ident], container: TypeKind) -> Self {
        Accessibility::from_modifiers(modifiers).unwrap_or(match container {
            TypeKind::Interface => Accessibility::Public,
            _ => Accessibility::Private,
        })
    }

    /// Visible to code outside the assembly, given a visible container.
    fn is_exported(self) -> bool {
        matches!(
            self,
            Accessibility::Public | Accessibility::ProtectedInternal | Accessibility::Protected
        )
    }
}

/// Accessibility written on the synthesized delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegateAccessibility {
    Public,
    /// No modifier, which is `internal` at namespace and file scope.
    Internal,
}

impl DelegateAccessibility {
    /// The modifier to write, if any.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            DelegateAccessibility::Public => Some("public"),
            DelegateAccessibility::Internal => None,
        }
    }
}

/// True when every type in `types` (outermost first) is visible outside
/// the assembly.
///
/// The outermost type must be `public`. Nested types may also be
/// `protected` or `protected internal`; interface members with no modifier
/// are public.
pub fn is_externally_reachable(types: &[&TypeDecl]) -> bool {
    let mut parent: Option<TypeKind> = None;
    for ty in types {
        let accessibility = match parent {
            None => Accessibility::from_modifiers(&ty.modifiers).unwrap_or(Accessibility::Internal),
            Some(kind) => Accessibility::of_member(&ty.modifiers, kind),
        };
        let reachable = match parent {
            None => accessibility == Accessibility::Public,
            Some(_) => accessibility.is_exported(),
        };
        if !reachable {
            return false;
        }
        parent = Some(ty.kind);
    }
    true
}

/// Accessibility for a delegate that serves an event.
pub fn infer(event: Accessibility, container_reachable: bool) -> DelegateAccessibility {
    if event.is_exported() && container_reachable {
        DelegateAccessibility::Public
    } else {
        DelegateAccessibility::Internal
    }
}

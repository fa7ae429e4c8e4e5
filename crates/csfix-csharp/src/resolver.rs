// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Type existence resolution.
//!
//! Answers one question: does a type with this name and arity already
//! resolve from a given scope? Two sources are consulted:
//!
//! - [`DeclaredTypeSet`]: every type declared in a set of compilation units,
//!   at every namespace and nesting level, filtered by C# simple-name
//!   visibility from the asking scope.
//! - [`FrameworkTypes`]: well-known framework handler delegates that are
//!   never re-synthesized, whatever their generic arguments.
//!
//! [`SymbolTable`] joins both behind the [`TypeResolver`] trait.

use std::collections::BTreeSet;

use csfix_cst::position_lookup::EventPath;
use csfix_cst::{
    CompilationUnit, NamedType, NamespaceMember, TypeDecl, TypeKind, TypeSyntax, UsingDirective,
    UsingKind,
};

/// Framework handler delegates that always exist.
pub const WELL_KNOWN_HANDLERS: &[&str] = &["EventHandler"];

/// Contextual keywords that name built-in types without being reserved.
const BUILTIN_TYPE_NAMES: &[&str] = &["dynamic", "nint", "nuint", "var"];

// ============================================================================
// Type References
// ============================================================================

/// A simple type name with optional generic arguments, as written.
///
/// Identity for existence checks is `(name, arity)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    pub name: String,
    pub type_args: Vec<String>,
}

impl TypeReference {
    pub fn new(name: impl Into<String>) -> Self {
        TypeReference {
            name: name.into(),
            type_args: Vec::new(),
        }
    }

    pub fn with_type_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.type_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn arity(&self) -> usize {
        self.type_args.len()
    }

    /// Build a reference from a parsed type.
    ///
    /// Only unqualified named types qualify. Predefined, qualified, array,
    /// nullable, pointer and tuple types return `None`.
    pub fn from_syntax(ty: &TypeSyntax, source: &str) -> Option<Self> {
        let named = ty.as_named()?;
        if !named.is_simple() {
            return None;
        }
        let segment = named.last();
        let type_args = segment
            .type_args
            .iter()
            .map(|arg| {
                let span = arg.span();
                source.get(span.start..span.end).unwrap_or("").to_string()
            })
            .collect();
        Some(TypeReference {
            name: segment.name.name().to_string(),
            type_args,
        })
    }
}

impl std::fmt::Display for TypeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.type_args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}<{}>", self.name, self.type_args.join(", "))
        }
    }
}

// ============================================================================
// Scope Context
// ============================================================================

/// What is visible from the position a type is referenced at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContext {
    /// Dotted name of the innermost enclosing namespace, empty for global.
    pub namespace: String,
    /// Namespaces imported by `using` directives in effect.
    pub imports: Vec<String>,
    /// Types imported by `using static` directives in effect.
    pub static_imports: Vec<String>,
    /// Names introduced by `using Alias = ...;` directives in effect.
    pub aliases: Vec<String>,
    /// Names of the enclosing types, outermost first.
    pub enclosing_types: Vec<String>,
}

impl ScopeContext {
    /// The global namespace with nothing imported.
    pub fn global() -> Self {
        ScopeContext::default()
    }

    /// The scope of an event declaration inside `unit`.
    pub fn for_event(unit: &CompilationUnit, path: &EventPath<'_>) -> Self {
        let mut scope = ScopeContext::default();
        scope.add_usings(&unit.usings);

        let mut namespace = String::new();
        for ns in &path.namespaces {
            if !namespace.is_empty() {
                namespace.push('.');
            }
            namespace.push_str(&ns.dotted_name());
            scope.add_usings(&ns.usings);
        }
        scope.namespace = namespace;
        scope.enclosing_types = path
            .types
            .iter()
            .map(|ty| ty.name.name().to_string())
            .collect();
        scope
    }

    fn add_usings(&mut self, usings: &[UsingDirective]) {
        for using in usings {
            match &using.kind {
                UsingKind::Namespace(name) => self.imports.push(dotted(name.iter().map(|i| i.name()))),
                UsingKind::Static(ty) => {
                    if let Some(named) = ty.as_named() {
                        self.static_imports.push(named_path(named));
                    }
                }
                UsingKind::Alias { alias, .. } => self.aliases.push(alias.name().to_string()),
            }
        }
    }

    /// True if top-level types of `namespace` resolve by simple name here.
    pub fn sees_namespace(&self, namespace: &str) -> bool {
        namespace.is_empty()
            || self.namespace == namespace
            || self
                .namespace
                .strip_prefix(namespace)
                .is_some_and(|rest| rest.starts_with('.'))
            || self.imports.iter().any(|i| i == namespace)
    }
}

fn dotted<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(".")
}

fn named_path(named: &NamedType) -> String {
    dotted(named.segments.iter().map(|s| s.name.name()))
}

// ============================================================================
// Resolver Trait
// ============================================================================

/// Answers whether a type reference already resolves from a scope.
pub trait TypeResolver {
    fn exists(&self, reference: &TypeReference, scope: &ScopeContext) -> bool;
}

impl<T: TypeResolver + ?Sized> TypeResolver for &T {
    fn exists(&self, reference: &TypeReference, scope: &ScopeContext) -> bool {
        (**self).exists(reference, scope)
    }
}

// ============================================================================
// Declared Types
// ============================================================================

/// A type declared somewhere in the analyzed sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    pub name: String,
    pub arity: usize,
    pub kind: TypeKind,
    /// Dotted namespace name, empty for the global namespace.
    pub namespace: String,
    /// Names of the types this one is nested in, outermost first.
    pub containers: Vec<String>,
}

impl DeclaredType {
    /// `Namespace.Outer` for a type nested in `Outer`.
    fn container_path(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.namespace.is_empty() {
            parts.push(&self.namespace);
        }
        parts.extend(self.containers.iter().map(String::as_str));
        parts.join(".")
    }

    fn visible_from(&self, scope: &ScopeContext, global_imports: &[String]) -> bool {
        if self.containers.is_empty() {
            return scope.sees_namespace(&self.namespace)
                || global_imports.iter().any(|i| *i == self.namespace);
        }
        (self.namespace == scope.namespace && scope.enclosing_types.starts_with(&self.containers))
            || scope.static_imports.contains(&self.container_path())
    }
}

/// Every type declared in a set of compilation units.
#[derive(Debug, Clone, Default)]
pub struct DeclaredTypeSet {
    types: Vec<DeclaredType>,
    /// Namespaces imported by `global using` in any unit.
    global_imports: Vec<String>,
}

impl DeclaredTypeSet {
    pub fn new() -> Self {
        DeclaredTypeSet::default()
    }

    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a CompilationUnit>) -> Self {
        let mut set = DeclaredTypeSet::new();
        for unit in units {
            set.add_unit(unit);
        }
        set
    }

    pub fn add_unit(&mut self, unit: &CompilationUnit) {
        for using in unit.usings.iter().filter(|u| u.global) {
            if let UsingKind::Namespace(name) = &using.kind {
                self.global_imports
                    .push(dotted(name.iter().map(|i| i.name())));
            }
        }
        self.collect_members(&unit.members, "");
    }

    fn collect_members(&mut self, members: &[NamespaceMember], namespace: &str) {
        for member in members {
            match member {
                NamespaceMember::Namespace(ns) => {
                    let name = if namespace.is_empty() {
                        ns.dotted_name()
                    } else {
                        format!("{}.{}", namespace, ns.dotted_name())
                    };
                    self.collect_members(&ns.members, &name);
                }
                NamespaceMember::Type(ty) => self.collect_type(ty, namespace, &mut Vec::new()),
                NamespaceMember::Other { .. } => {}
            }
        }
    }

    fn collect_type(&mut self, ty: &TypeDecl, namespace: &str, containers: &mut Vec<String>) {
        self.types.push(DeclaredType {
            name: ty.name.name().to_string(),
            arity: ty.arity(),
            kind: ty.kind,
            namespace: namespace.to_string(),
            containers: containers.clone(),
        });
        containers.push(ty.name.name().to_string());
        for nested in ty.nested_types() {
            self.collect_type(nested, namespace, containers);
        }
        containers.pop();
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclaredType> {
        self.types.iter()
    }
}

impl TypeResolver for DeclaredTypeSet {
    fn exists(&self, reference: &TypeReference, scope: &ScopeContext) -> bool {
        self.types.iter().any(|t| {
            t.name == reference.name
                && t.arity == reference.arity()
                && t.visible_from(scope, &self.global_imports)
        })
    }
}

// ============================================================================
// Framework Types
// ============================================================================

/// Well-known handler delegates, matched by name at any arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkTypes {
    names: BTreeSet<String>,
}

impl Default for FrameworkTypes {
    fn default() -> Self {
        FrameworkTypes {
            names: WELL_KNOWN_HANDLERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FrameworkTypes {
    /// The default handlers plus `names`.
    pub fn with_names(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut types = FrameworkTypes::default();
        types.names.extend(names.into_iter().map(Into::into));
        types
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl TypeResolver for FrameworkTypes {
    fn exists(&self, reference: &TypeReference, _scope: &ScopeContext) -> bool {
        self.contains(&reference.name)
    }
}

// ============================================================================
// Symbol Table
// ============================================================================

/// Declared and framework types together.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub declared: DeclaredTypeSet,
    pub framework: FrameworkTypes,
}

impl SymbolTable {
    pub fn new(declared: DeclaredTypeSet, framework: FrameworkTypes) -> Self {
        SymbolTable {
            declared,
            framework,
        }
    }

    pub fn for_units<'a>(
        units: impl IntoIterator<Item = &'a CompilationUnit>,
        framework: FrameworkTypes,
    ) -> Self {
        SymbolTable::new(DeclaredTypeSet::from_units(units), framework)
    }
}

impl TypeResolver for SymbolTable {
    fn exists(&self, reference: &TypeReference, scope: &ScopeContext) -> bool {
        let name = reference.name.as_str();
        let found = if reference.arity() == 0 && BUILTIN_TYPE_NAMES.contains(&name) {
            Some("builtin")
        } else if self.framework.exists(reference, scope) {
            Some("framework")
        } else if reference.arity() == 0 && scope.aliases.iter().any(|a| a == name) {
            Some("alias")
        } else if self.declared.exists(reference, scope) {
            Some("declared")
        } else {
            None
        };
        tracing::trace!(reference = %reference, source = ?found, "type lookup");
        found.is_some()
    }
}

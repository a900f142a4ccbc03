//! The read-only declaration abstraction.
//!
//! A [`DeclarationRef`] is a polymorphic view over a type declaration
//! that may originate from source text in the current compilation unit
//! or from a previously compiled binary dependency. The engine only ever
//! borrows declarations through this trait; it never mutates them and
//! never branches on the underlying representation except through
//! [`DeclarationRef::resolve_generic_parameter`], where the two
//! representations genuinely need different strategies.
//!
//! Declarations from both representations are value-equal when their
//! qualified names match.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::annotation::Annotation;
use crate::name::QualifiedName;

/// Where a declaration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    /// A declaration parsed from source in the current compilation unit.
    Source,
    /// A declaration reconstructed from a compiled dependency.
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    Public,
    Internal,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Interface,
    AbstractClass,
    Class,
    Object,
}

/// Read-only view over a type declaration.
pub trait DeclarationRef: Send + Sync {
    fn qualified_name(&self) -> &QualifiedName;
    fn origin_kind(&self) -> OriginKind;
    fn annotations(&self) -> &[Annotation];
    fn direct_supertypes(&self) -> &[QualifiedName];
    fn visibility(&self) -> Visibility;
    fn decl_kind(&self) -> DeclKind;
    /// Declared type parameter names, in declaration order.
    fn type_parameters(&self) -> &[String];
    /// Qualified names of declarations nested inside this one.
    fn inner_declarations(&self) -> &[QualifiedName];

    /// Resolve a generic parameter to its concrete argument, when the
    /// representation can. Source declarations track substitutions from
    /// the syntax tree; binary declarations have erased them and always
    /// answer `None`.
    fn resolve_generic_parameter(&self, name: &str) -> Option<QualifiedName>;

    /// First annotation with the given qualified name, if any.
    fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations()
            .iter()
            .find(|a| a.name.as_str() == name)
    }

    fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }
}

/// A declaration backed by source text in the current unit.
///
/// Built by the host front end; in tests, built directly through the
/// fluent constructors.
#[derive(Debug, Clone)]
pub struct SourceDecl {
    name: QualifiedName,
    annotations: Vec<Annotation>,
    supertypes: Vec<QualifiedName>,
    visibility: Visibility,
    kind: DeclKind,
    type_parameters: Vec<String>,
    inner: Vec<QualifiedName>,
    generic_substitutions: BTreeMap<String, QualifiedName>,
}

impl SourceDecl {
    pub fn new(name: QualifiedName, kind: DeclKind) -> Self {
        Self {
            name,
            annotations: Vec::new(),
            supertypes: Vec::new(),
            visibility: Visibility::Public,
            kind,
            type_parameters: Vec::new(),
            inner: Vec::new(),
            generic_substitutions: BTreeMap::new(),
        }
    }

    pub fn class(name: QualifiedName) -> Self {
        Self::new(name, DeclKind::Class)
    }

    pub fn interface(name: QualifiedName) -> Self {
        Self::new(name, DeclKind::Interface)
    }

    pub fn abstract_class(name: QualifiedName) -> Self {
        Self::new(name, DeclKind::AbstractClass)
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_supertype(mut self, supertype: QualifiedName) -> Self {
        self.supertypes.push(supertype);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_type_parameter(mut self, name: &str) -> Self {
        self.type_parameters.push(name.to_string());
        self
    }

    pub fn with_inner(mut self, inner: QualifiedName) -> Self {
        self.inner.push(inner);
        self
    }

    pub fn with_generic_substitution(mut self, param: &str, concrete: QualifiedName) -> Self {
        self.generic_substitutions.insert(param.to_string(), concrete);
        self
    }
}

impl DeclarationRef for SourceDecl {
    fn qualified_name(&self) -> &QualifiedName {
        &self.name
    }

    fn origin_kind(&self) -> OriginKind {
        OriginKind::Source
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn direct_supertypes(&self) -> &[QualifiedName] {
        &self.supertypes
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn decl_kind(&self) -> DeclKind {
        self.kind
    }

    fn type_parameters(&self) -> &[String] {
        &self.type_parameters
    }

    fn inner_declarations(&self) -> &[QualifiedName] {
        &self.inner
    }

    fn resolve_generic_parameter(&self, name: &str) -> Option<QualifiedName> {
        self.generic_substitutions.get(name).cloned()
    }
}

/// A declaration reconstructed from a compiled dependency.
///
/// Annotations survive compilation, so a binary declaration still
/// carries its contribution annotations; generic substitutions do not
/// survive, so [`DeclarationRef::resolve_generic_parameter`] always
/// answers `None`.
#[derive(Debug, Clone)]
pub struct BinaryDecl {
    name: QualifiedName,
    annotations: Vec<Annotation>,
    supertypes: Vec<QualifiedName>,
    kind: DeclKind,
    type_parameters: Vec<String>,
    inner: Vec<QualifiedName>,
}

impl BinaryDecl {
    pub fn new(name: QualifiedName, kind: DeclKind) -> Self {
        Self {
            name,
            annotations: Vec::new(),
            supertypes: Vec::new(),
            kind,
            type_parameters: Vec::new(),
            inner: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_supertype(mut self, supertype: QualifiedName) -> Self {
        self.supertypes.push(supertype);
        self
    }

    pub fn with_type_parameter(mut self, name: &str) -> Self {
        self.type_parameters.push(name.to_string());
        self
    }

    pub fn with_inner(mut self, inner: QualifiedName) -> Self {
        self.inner.push(inner);
        self
    }
}

impl DeclarationRef for BinaryDecl {
    fn qualified_name(&self) -> &QualifiedName {
        &self.name
    }

    fn origin_kind(&self) -> OriginKind {
        OriginKind::Binary
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn direct_supertypes(&self) -> &[QualifiedName] {
        &self.supertypes
    }

    fn visibility(&self) -> Visibility {
        // Only public declarations are visible across compiled binaries.
        Visibility::Public
    }

    fn decl_kind(&self) -> DeclKind {
        self.kind
    }

    fn type_parameters(&self) -> &[String] {
        &self.type_parameters
    }

    fn inner_declarations(&self) -> &[QualifiedName] {
        &self.inner
    }

    fn resolve_generic_parameter(&self, _name: &str) -> Option<QualifiedName> {
        None
    }
}

/// The set of declarations visible to one compilation round.
///
/// Declarations are keyed by qualified name; iteration order is the
/// canonical name order, which keeps every downstream pass
/// deterministic. Dependency hints are surfaced alongside, already
/// extracted from the hint package by the declaration layer.
#[derive(Default)]
pub struct DeclSet {
    decls: BTreeMap<QualifiedName, Arc<dyn DeclarationRef>>,
    dependency_hints: Vec<String>,
}

impl DeclSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, decl: impl DeclarationRef + 'static) {
        self.decls
            .insert(decl.qualified_name().clone(), Arc::new(decl));
    }

    pub fn insert_arc(&mut self, decl: Arc<dyn DeclarationRef>) {
        self.decls.insert(decl.qualified_name().clone(), decl);
    }

    /// Record the encoded payload of a hint discovered in a compiled
    /// dependency's hint package.
    pub fn add_dependency_hint(&mut self, payload: impl Into<String>) {
        self.dependency_hints.push(payload.into());
    }

    pub fn dependency_hints(&self) -> &[String] {
        &self.dependency_hints
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&Arc<dyn DeclarationRef>> {
        self.decls.get(name)
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.decls.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Declarations in canonical name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DeclarationRef>> {
        self.decls.values()
    }

    /// Walk the full supertype chain of `name`, breadth first, following
    /// declarations known to this set. Unknown supertypes are included
    /// (their chains simply cannot be followed further). A type is never
    /// its own supertype; inheritance cycles are tolerated by the
    /// visited guard.
    pub fn supertype_chain(&self, name: &QualifiedName) -> Vec<QualifiedName> {
        let mut chain = Vec::new();
        let mut visited = std::collections::BTreeSet::new();
        visited.insert(name.clone());
        let mut queue: Vec<QualifiedName> = match self.get(name) {
            Some(decl) => decl.direct_supertypes().to_vec(),
            None => Vec::new(),
        };

        while let Some(next) = queue.pop() {
            if !visited.insert(next.clone()) {
                continue;
            }
            if let Some(decl) = self.get(&next) {
                queue.extend(decl.direct_supertypes().iter().cloned());
            }
            chain.push(next);
        }

        chain.sort();
        chain
    }
}

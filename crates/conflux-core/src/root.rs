//! Merge roots.
//!
//! A root is a declaration annotated with one of the merge annotations;
//! it triggers aggregation of a scope's contributions into a synthesized
//! component declaration. Whatever module list and supertype list the
//! root already declares in source is preserved verbatim ahead of the
//! merged additions.

use serde::{Deserialize, Serialize};

use crate::name::{QualifiedName, ScopeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootKind {
    Component,
    Subcomponent,
    /// Merge only contributed supertype interfaces.
    InterfacesOnly,
    /// Merge only contributed modules.
    ModulesOnly,
}

impl RootKind {
    pub fn merges_modules(&self) -> bool {
        matches!(
            self,
            RootKind::Component | RootKind::Subcomponent | RootKind::ModulesOnly
        )
    }

    pub fn merges_supertypes(&self) -> bool {
        matches!(
            self,
            RootKind::Component | RootKind::Subcomponent | RootKind::InterfacesOnly
        )
    }
}

/// A merge trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    /// The declaration carrying the merge annotation.
    pub origin: QualifiedName,
    pub kind: RootKind,
    pub target_scope: ScopeId,
    /// Contributions to omit, by origin.
    pub exclusions: Vec<QualifiedName>,
    /// Modules already listed in source, preserved verbatim and in order.
    pub existing_modules: Vec<QualifiedName>,
    /// Supertypes already declared in source.
    pub existing_supertypes: Vec<QualifiedName>,
}

impl Root {
    pub fn new(origin: QualifiedName, kind: RootKind, target_scope: ScopeId) -> Self {
        Self {
            origin,
            kind,
            target_scope,
            exclusions: Vec::new(),
            existing_modules: Vec::new(),
            existing_supertypes: Vec::new(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: Vec<QualifiedName>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_existing_modules(mut self, modules: Vec<QualifiedName>) -> Self {
        self.existing_modules = modules;
        self
    }

    pub fn with_existing_supertypes(mut self, supertypes: Vec<QualifiedName>) -> Self {
        self.existing_supertypes = supertypes;
        self
    }

    pub fn excludes(&self, origin: &QualifiedName) -> bool {
        self.exclusions.contains(origin)
    }
}

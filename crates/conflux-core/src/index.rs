//! The scope index: `scope -> contributions`.
//!
//! The index is the engine's only long-lived aggregation. It grows
//! monotonically across compilation rounds: a previously indexed
//! contribution is never lost except through an explicit removal by the
//! replacement resolver. Lookups return contributions in the stable
//! total order defined on [`Contribution`], so merge output is
//! byte-identical across repeated builds regardless of insertion order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contribution::{Contribution, ContributionKindTag};
use crate::name::{QualifiedName, ScopeId};

#[derive(Debug, Default, Clone)]
pub struct ScopeIndex {
    entries: BTreeMap<ScopeId, BTreeSet<Contribution>>,
}

impl ScopeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a contribution under its target scope (the parent scope
    /// for subcomponents). Returns `true` when the record was not
    /// present before; re-indexing the same record across rounds is a
    /// no-op.
    pub fn index(&mut self, contribution: Contribution) -> bool {
        let inserted = self
            .entries
            .entry(contribution.target_scope().clone())
            .or_default()
            .insert(contribution.clone());
        if inserted {
            debug!(
                scope = %contribution.target_scope(),
                origin = %contribution.origin,
                kind = ?contribution.kind.tag(),
                "indexed contribution"
            );
        }
        inserted
    }

    /// All contributions for a scope, in stable order.
    pub fn lookup(&self, scope: &ScopeId) -> Vec<&Contribution> {
        self.entries
            .get(scope)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// Contributions for a scope filtered by kind, in stable order.
    pub fn lookup_kind(&self, scope: &ScopeId, kind: ContributionKindTag) -> Vec<&Contribution> {
        self.lookup(scope)
            .into_iter()
            .filter(|c| c.kind.tag() == kind)
            .collect()
    }

    /// Whether any scope holds a contribution from `origin`.
    pub fn contains_origin(&self, origin: &QualifiedName) -> bool {
        self.entries
            .values()
            .any(|set| set.iter().any(|c| &c.origin == origin))
    }

    /// Scopes under which `origin` has contributions.
    pub fn scopes_of_origin(&self, origin: &QualifiedName) -> Vec<&ScopeId> {
        self.entries
            .iter()
            .filter(|(_, set)| set.iter().any(|c| &c.origin == origin))
            .map(|(scope, _)| scope)
            .collect()
    }

    /// Remove every contribution from `origin` under `scope`. Reserved
    /// for the replacement resolver; returns the number removed.
    pub fn remove_origin(&mut self, scope: &ScopeId, origin: &QualifiedName) -> usize {
        let Some(set) = self.entries.get_mut(scope) else {
            return 0;
        };
        let before = set.len();
        set.retain(|c| &c.origin != origin);
        let removed = before - set.len();
        if removed > 0 {
            debug!(%scope, %origin, removed, "removed replaced contribution");
        }
        removed
    }

    pub fn scopes(&self) -> impl Iterator<Item = &ScopeId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export the index for diagnostics.
    pub fn to_debug_data(&self) -> ScopeIndexDebugData {
        ScopeIndexDebugData {
            entries: self
                .entries
                .iter()
                .map(|(scope, set)| (scope.clone(), set.iter().cloned().collect()))
                .collect(),
        }
    }
}

/// Serializable snapshot of the scope index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeIndexDebugData {
    pub entries: BTreeMap<ScopeId, Vec<Contribution>>,
}

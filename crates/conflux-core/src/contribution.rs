//! Contribution records.
//!
//! A contribution is one declaration's request to participate in a
//! scope's merged output. A single declaration may yield multiple
//! records (one per scope when multiply annotated). Records are
//! immutable value objects owned by the round that scanned them; the
//! scope index aggregates them across rounds.

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationKey;
use crate::name::{QualifiedName, ScopeId};

/// Binding priority. Higher ranks win conflicts over the same bound
/// type and qualifier; equal ranks on the same key are an error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rank(pub i64);

impl Rank {
    pub const NORMAL: Rank = Rank(0);
    pub const HIGH: Rank = Rank(100);
    pub const HIGHEST: Rank = Rank(200);
}

impl Default for Rank {
    fn default() -> Self {
        Rank::NORMAL
    }
}

/// Kind-specific payload of a contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionKind {
    /// Bind the origin as an implementation of `bound_type`.
    Binding { bound_type: QualifiedName },
    /// Contribute the origin into a set or map multibinding of `bound_type`.
    Multibinding {
        bound_type: QualifiedName,
        map_key: Option<AnnotationKey>,
    },
    /// Contribute the origin as a module.
    Module,
    /// Contribute the origin interface as a supertype of the merged component.
    Supertype,
    /// Contribute the origin as a subcomponent of `parent_scope`.
    Subcomponent { parent_scope: ScopeId },
}

/// Discriminant of [`ContributionKind`], used for lookup filters and
/// duplicate-scope detection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ContributionKindTag {
    Binding,
    Multibinding,
    Module,
    Supertype,
    Subcomponent,
}

impl ContributionKind {
    pub fn tag(&self) -> ContributionKindTag {
        match self {
            ContributionKind::Binding { .. } => ContributionKindTag::Binding,
            ContributionKind::Multibinding { .. } => ContributionKindTag::Multibinding,
            ContributionKind::Module => ContributionKindTag::Module,
            ContributionKind::Supertype => ContributionKindTag::Supertype,
            ContributionKind::Subcomponent { .. } => ContributionKindTag::Subcomponent,
        }
    }

    pub fn bound_type(&self) -> Option<&QualifiedName> {
        match self {
            ContributionKind::Binding { bound_type }
            | ContributionKind::Multibinding { bound_type, .. } => Some(bound_type),
            _ => None,
        }
    }
}

/// One declaration's request to participate in a scope's merged output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// The contributing declaration. Invariant: it carries the
    /// annotation that produced this record.
    pub origin: QualifiedName,
    pub scope: ScopeId,
    pub kind: ContributionKind,
    /// Declarations this contribution supersedes.
    pub replaces: Vec<QualifiedName>,
    pub rank: Rank,
    pub qualifier: Option<AnnotationKey>,
}

impl Contribution {
    pub fn new(origin: QualifiedName, scope: ScopeId, kind: ContributionKind) -> Self {
        Self {
            origin,
            scope,
            kind,
            replaces: Vec::new(),
            rank: Rank::NORMAL,
            qualifier: None,
        }
    }

    pub fn with_replaces(mut self, replaces: Vec<QualifiedName>) -> Self {
        self.replaces = replaces;
        self
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_qualifier(mut self, qualifier: AnnotationKey) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// The scope whose merge discovers this contribution. Subcomponents
    /// are discovered when their *parent* scope merges; every other kind
    /// targets its own scope.
    pub fn target_scope(&self) -> &ScopeId {
        match &self.kind {
            ContributionKind::Subcomponent { parent_scope } => parent_scope,
            _ => &self.scope,
        }
    }

    /// The stable total-order key: origin name first, bound-type name as
    /// a tie break, then rank. Index lookups sort by this so merge
    /// output is byte-identical across builds.
    fn sort_key(&self) -> (&str, &str, Rank, ContributionKindTag, &str) {
        let bound = self.kind.bound_type().map(|n| n.as_str()).unwrap_or("");
        let qualifier = self
            .qualifier
            .as_ref()
            .map(|q| q.canonical.as_str())
            .unwrap_or("");
        (self.origin.as_str(), bound, self.rank, self.kind.tag(), qualifier)
    }
}

impl PartialOrd for Contribution {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Contribution {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            // Scope and the remaining payload still participate so that
            // distinct records never compare equal inside a set.
            .then_with(|| self.scope.cmp(&other.scope))
            .then_with(|| self.replaces.cmp(&other.replaces))
    }
}

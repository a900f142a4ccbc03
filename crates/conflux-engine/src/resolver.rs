//! Replacement and exclusion resolution.
//!
//! Before a scope is merged, the resolver prunes its working set:
//! contributions whose origin is named in another contribution's
//! `replaces` list are removed from the index, and contributions named
//! in the root's exclusion list are filtered per root. Replacement and
//! exclusion are set-based (identity by qualified name), not ordered;
//! either is sufficient for removal.
//!
//! Two invariants are fatal:
//! - replacing an origin whose generated output already exists
//!   ([`MergeError::ReplacementAfterGeneration`]), because the artifact
//!   cannot be retracted once written;
//! - one declaration contributing twice to the same scope with the same
//!   kind ([`MergeError::DuplicateScopeContribution`]).

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use conflux_core::{Contribution, MergeError, QualifiedName, Root, ScopeId, ScopeIndex};

pub struct Resolver;

impl Resolver {
    /// Duplicate-scope invariant: a single declaration must not carry
    /// two contribution annotations with the same target scope and the
    /// same kind.
    pub fn check_duplicate_scopes(contributions: &[Contribution]) -> Result<(), MergeError> {
        let mut seen = BTreeSet::new();
        for contribution in contributions {
            let key = (
                contribution.origin.clone(),
                contribution.target_scope().clone(),
                contribution.kind.tag(),
            );
            if !seen.insert(key) {
                return Err(MergeError::DuplicateScopeContribution {
                    origin: contribution.origin.clone(),
                    scope: contribution.target_scope().clone(),
                });
            }
        }
        Ok(())
    }

    /// Apply every `replaces` declaration within `scope`, removing the
    /// replaced origins from the index. Returns the removed origins.
    ///
    /// Replacing an origin that was never indexed is not an error; that
    /// permits replacing dependency-only contributions defensively.
    #[instrument(skip(index, emitted), fields(%scope))]
    pub fn apply_replacements(
        index: &mut ScopeIndex,
        scope: &ScopeId,
        emitted: &BTreeSet<QualifiedName>,
    ) -> Result<Vec<QualifiedName>, MergeError> {
        // Replacer -> replaced pairs, collected before any removal so
        // that union semantics hold: a replaced contribution's own
        // replaces list still applies.
        let mut replaced: BTreeMap<QualifiedName, QualifiedName> = BTreeMap::new();
        for contribution in index.lookup(scope) {
            for target in &contribution.replaces {
                replaced
                    .entry(target.clone())
                    .or_insert_with(|| contribution.origin.clone());
            }
        }

        for (target, replacer) in &replaced {
            if emitted.contains(target) {
                return Err(MergeError::ReplacementAfterGeneration {
                    replacer: replacer.clone(),
                    replaced: target.clone(),
                });
            }
            // A replacement must stay within its own scope: if the
            // replaced origin only contributes elsewhere, the intent
            // cannot be honored here.
            let target_scopes = index.scopes_of_origin(target);
            if !target_scopes.is_empty() && !target_scopes.contains(&scope) {
                return Err(MergeError::CrossScopeReplacement {
                    replacer: replacer.clone(),
                    replaced: target.clone(),
                    scope: scope.clone(),
                });
            }
        }

        let mut removed = Vec::new();
        for target in replaced.keys() {
            if index.remove_origin(scope, target) > 0 {
                removed.push(target.clone());
            }
        }
        if !removed.is_empty() {
            debug!(?removed, "replacements pruned contributions");
        }
        Ok(removed)
    }

    /// The post-replacement working set for one root, minus its
    /// exclusions, in stable index order.
    pub fn survivors_for_root<'a>(index: &'a ScopeIndex, root: &Root) -> Vec<&'a Contribution> {
        index
            .lookup(&root.target_scope)
            .into_iter()
            .filter(|c| !root.excludes(&c.origin))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_core::{ContributionKind, RootKind};

    fn qn(s: &str) -> QualifiedName {
        QualifiedName::parse(s).unwrap()
    }

    fn scope(s: &str) -> ScopeId {
        ScopeId::parse(s).unwrap()
    }

    fn module(origin: &str, s: &str) -> Contribution {
        Contribution::new(qn(origin), scope(s), ContributionKind::Module)
    }

    #[test]
    fn replacement_removes_from_index() {
        let mut index = ScopeIndex::new();
        // Indexed first; replacement must still find it.
        index.index(module("com.app.Y", "com.app.S"));
        index.index(module("com.app.X", "com.app.S").with_replaces(vec![qn("com.app.Y")]));

        let removed =
            Resolver::apply_replacements(&mut index, &scope("com.app.S"), &BTreeSet::new())
                .unwrap();
        assert_eq!(removed, vec![qn("com.app.Y")]);

        let remaining: Vec<&QualifiedName> = index
            .lookup(&scope("com.app.S"))
            .into_iter()
            .map(|c| &c.origin)
            .collect();
        assert_eq!(remaining, vec![&qn("com.app.X")]);
    }

    #[test]
    fn replacing_unknown_origin_is_allowed() {
        let mut index = ScopeIndex::new();
        index.index(module("com.app.X", "com.app.S").with_replaces(vec![qn("dep.lib.NeverSeen")]));

        let removed =
            Resolver::apply_replacements(&mut index, &scope("com.app.S"), &BTreeSet::new())
                .unwrap();
        assert!(removed.is_empty());
        assert_eq!(index.lookup(&scope("com.app.S")).len(), 1);
    }

    #[test]
    fn replacement_after_generation_is_fatal() {
        let mut index = ScopeIndex::new();
        index.index(module("com.app.Y", "com.app.S"));
        index.index(module("com.app.X", "com.app.S").with_replaces(vec![qn("com.app.Y")]));

        let emitted: BTreeSet<QualifiedName> = [qn("com.app.Y")].into_iter().collect();
        assert!(matches!(
            Resolver::apply_replacements(&mut index, &scope("com.app.S"), &emitted),
            Err(MergeError::ReplacementAfterGeneration { .. })
        ));
    }

    #[test]
    fn cross_scope_replacement_is_fatal() {
        let mut index = ScopeIndex::new();
        index.index(module("com.app.Y", "com.other.T"));
        index.index(module("com.app.X", "com.app.S").with_replaces(vec![qn("com.app.Y")]));

        assert!(matches!(
            Resolver::apply_replacements(&mut index, &scope("com.app.S"), &BTreeSet::new()),
            Err(MergeError::CrossScopeReplacement { .. })
        ));
    }

    #[test]
    fn replacement_within_shared_scope_is_allowed() {
        let mut index = ScopeIndex::new();
        // Y contributes to both scopes; replacing it in S is legal and
        // leaves the other scope untouched.
        index.index(module("com.app.Y", "com.app.S"));
        index.index(module("com.app.Y", "com.other.T"));
        index.index(module("com.app.X", "com.app.S").with_replaces(vec![qn("com.app.Y")]));

        Resolver::apply_replacements(&mut index, &scope("com.app.S"), &BTreeSet::new()).unwrap();
        assert_eq!(index.lookup(&scope("com.app.S")).len(), 1);
        assert_eq!(index.lookup(&scope("com.other.T")).len(), 1);
    }

    #[test]
    fn duplicate_scope_contribution_is_fatal() {
        let contributions = vec![
            module("com.app.M", "com.app.S"),
            module("com.app.M", "com.app.S").with_replaces(vec![qn("com.app.Old")]),
        ];
        assert!(matches!(
            Resolver::check_duplicate_scopes(&contributions),
            Err(MergeError::DuplicateScopeContribution { .. })
        ));
    }

    #[test]
    fn same_origin_different_scope_or_kind_is_fine() {
        let contributions = vec![
            module("com.app.M", "com.app.S1"),
            module("com.app.M", "com.app.S2"),
            Contribution::new(
                qn("com.app.M"),
                scope("com.app.S1"),
                ContributionKind::Supertype,
            ),
        ];
        assert!(Resolver::check_duplicate_scopes(&contributions).is_ok());
    }

    #[test]
    fn exclusions_filter_survivors() {
        let mut index = ScopeIndex::new();
        index.index(module("com.app.M1", "com.app.S"));
        index.index(module("com.app.M2", "com.app.S"));

        let root = Root::new(qn("com.app.C"), RootKind::Component, scope("com.app.S"))
            .with_exclusions(vec![qn("com.app.M1")]);

        let survivors = Resolver::survivors_for_root(&index, &root);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].origin, qn("com.app.M2"));
    }
}

//! Merged component synthesis.
//!
//! Takes one merge root plus the surviving contributions for its scope
//! and produces the structural description of the generated output: the
//! merged module list, the merged supertype list, and one synthesized
//! binding shim module per binding or multibinding contribution. The
//! description is purely structural; rendering it to source text lives
//! in `conflux-codegen`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use conflux_core::{
    naming, AnnotationKey, Contribution, ContributionKind, MergeError, QualifiedName, Rank, Root,
    RootKind, ScopeId,
};

/// Package all synthesized binding shim modules are placed in.
pub const GENERATED_MODULE_PACKAGE: &str = "conflux.generated.module";

/// A synthesized module holding a single binding method that maps a
/// contributed implementation to its bound type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingShim {
    /// Fully qualified name of the generated module.
    pub module_name: QualifiedName,
    pub origin: QualifiedName,
    pub scope: ScopeId,
    pub bound_type: QualifiedName,
    pub multibinding: bool,
    pub map_key: Option<AnnotationKey>,
    pub qualifier: Option<AnnotationKey>,
}

/// The structural result of merging one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedComponent {
    pub package: String,
    /// Simple name of the generated declaration.
    pub name: String,
    pub origin: QualifiedName,
    pub kind: RootKind,
    pub target_scope: ScopeId,
    /// Final module list: the root's hand-written modules first, then
    /// contributed modules and shims in sorted order.
    pub modules: Vec<QualifiedName>,
    /// Final supertype list: hand-written supertypes first, then
    /// contributed interfaces in sorted order.
    pub supertypes: Vec<QualifiedName>,
    pub shims: Vec<BindingShim>,
}

/// Merge `survivors` into `root`. Survivors must already be
/// replacement-pruned and exclusion-filtered, in stable index order.
#[instrument(skip(survivors), fields(root = %root.origin, scope = %root.target_scope))]
pub fn synthesize(root: &Root, survivors: &[&Contribution]) -> Result<MergedComponent, MergeError> {
    let winners = resolve_binding_ranks(&root.target_scope, survivors)?;

    let mut shims = Vec::new();
    let mut contributed_modules = BTreeSet::new();
    let mut contributed_supertypes = BTreeSet::new();

    for contribution in survivors {
        match &contribution.kind {
            ContributionKind::Binding { bound_type } => {
                if !winners.contains(&contribution.origin) {
                    continue;
                }
                shims.push(shim_for(contribution, bound_type, false, None)?);
            }
            ContributionKind::Multibinding {
                bound_type,
                map_key,
            } => {
                shims.push(shim_for(contribution, bound_type, true, map_key.clone())?);
            }
            ContributionKind::Module => {
                contributed_modules.insert(contribution.origin.clone());
            }
            ContributionKind::Supertype => {
                contributed_supertypes.insert(contribution.origin.clone());
            }
            // Subcomponents spawn their own merge roots; they never
            // appear in the parent's module or supertype lists.
            ContributionKind::Subcomponent { .. } => {}
        }
    }

    let mut modules = Vec::new();
    let mut supertypes = Vec::new();
    if root.kind.merges_modules() {
        modules.extend(root.existing_modules.iter().cloned());
        // Contributed modules and synthesized wrapper modules form one
        // sorted, deduplicated set appended after the hand-written list.
        for shim in &shims {
            contributed_modules.insert(shim.module_name.clone());
        }
        for module in contributed_modules {
            if !modules.contains(&module) {
                modules.push(module);
            }
        }
    } else {
        shims.clear();
    }
    if root.kind.merges_supertypes() {
        supertypes.extend(root.existing_supertypes.iter().cloned());
        for supertype in contributed_supertypes {
            if !supertypes.contains(&supertype) {
                supertypes.push(supertype);
            }
        }
    }

    debug!(
        modules = modules.len(),
        supertypes = supertypes.len(),
        shims = shims.len(),
        "synthesized merged component"
    );

    Ok(MergedComponent {
        package: root.origin.package().to_string(),
        name: format!("Merged{}", root.origin.simple_name()),
        origin: root.origin.clone(),
        kind: root.kind,
        target_scope: root.target_scope.clone(),
        modules,
        supertypes,
        shims,
    })
}

/// Resolve rank conflicts among plain bindings: for each (bound type,
/// qualifier) key the highest-ranked contribution wins; a tie at the top
/// is an error. Multibindings never conflict and are left alone.
fn resolve_binding_ranks(
    scope: &ScopeId,
    survivors: &[&Contribution],
) -> Result<BTreeSet<QualifiedName>, MergeError> {
    let mut groups: BTreeMap<(QualifiedName, String), Vec<&Contribution>> = BTreeMap::new();
    for contribution in survivors {
        if let ContributionKind::Binding { bound_type } = &contribution.kind {
            let qualifier = contribution
                .qualifier
                .as_ref()
                .map(|q| q.canonical.clone())
                .unwrap_or_default();
            groups
                .entry((bound_type.clone(), qualifier))
                .or_default()
                .push(contribution);
        }
    }

    let mut winners = BTreeSet::new();
    for ((bound_type, _), group) in groups {
        let top = group
            .iter()
            .map(|c| c.rank)
            .max()
            .unwrap_or(Rank::NORMAL);
        let mut at_top: Vec<&&Contribution> =
            group.iter().filter(|c| c.rank == top).collect();
        at_top.sort_by(|a, b| a.origin.cmp(&b.origin));
        match at_top.as_slice() {
            [sole] => {
                winners.insert(sole.origin.clone());
            }
            [first, second, ..] => {
                return Err(MergeError::DuplicateBinding {
                    scope: scope.clone(),
                    bound_type,
                    first: first.origin.clone(),
                    second: second.origin.clone(),
                });
            }
            [] => {}
        }
    }
    Ok(winners)
}

fn shim_for(
    contribution: &Contribution,
    bound_type: &QualifiedName,
    multibinding: bool,
    map_key: Option<AnnotationKey>,
) -> Result<BindingShim, MergeError> {
    Ok(BindingShim {
        module_name: shim_name(&contribution.origin, &contribution.scope, bound_type)?,
        origin: contribution.origin.clone(),
        scope: contribution.scope.clone(),
        bound_type: bound_type.clone(),
        multibinding,
        map_key,
        qualifier: contribution.qualifier.clone(),
    })
}

/// Deterministic shim module name, unique per (origin, scope, bound
/// type) and capped at the file-name length limit.
fn shim_name(
    origin: &QualifiedName,
    scope: &ScopeId,
    bound_type: &QualifiedName,
) -> Result<QualifiedName, MergeError> {
    let simple = naming::capped_for_file_name(format!(
        "{}_{}_{}_BindingModule",
        naming::flatten(origin),
        naming::flatten(scope.name()),
        naming::flatten(bound_type),
    ));
    QualifiedName::parse(&format!("{}.{}", GENERATED_MODULE_PACKAGE, simple))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_core::Annotation;

    fn qn(s: &str) -> QualifiedName {
        QualifiedName::parse(s).unwrap()
    }

    fn scope(s: &str) -> ScopeId {
        ScopeId::parse(s).unwrap()
    }

    fn binding(origin: &str, s: &str, bound: &str) -> Contribution {
        Contribution::new(
            qn(origin),
            scope(s),
            ContributionKind::Binding {
                bound_type: qn(bound),
            },
        )
    }

    fn module(origin: &str, s: &str) -> Contribution {
        Contribution::new(qn(origin), scope(s), ContributionKind::Module)
    }

    fn root() -> Root {
        Root::new(
            qn("com.app.AppComponent"),
            RootKind::Component,
            scope("com.app.AppScope"),
        )
    }

    #[test]
    fn existing_modules_come_first_and_verbatim() {
        let root = root().with_existing_modules(vec![qn("z.app.HandWritten")]);
        let m1 = module("com.app.NetworkModule", "com.app.AppScope");
        let m2 = module("a.lib.EarlyModule", "com.app.AppScope");
        let merged = synthesize(&root, &[&m1, &m2]).unwrap();
        assert_eq!(
            merged.modules,
            vec![
                qn("z.app.HandWritten"),
                qn("a.lib.EarlyModule"),
                qn("com.app.NetworkModule"),
            ]
        );
    }

    #[test]
    fn binding_produces_shim_module() {
        let b = binding("com.app.RealRepo", "com.app.AppScope", "com.app.Repo");
        let merged = synthesize(&root(), &[&b]).unwrap();
        assert_eq!(merged.shims.len(), 1);
        let shim = &merged.shims[0];
        assert_eq!(
            shim.module_name.as_str(),
            "conflux.generated.module.com_app_RealRepo_com_app_AppScope_com_app_Repo_BindingModule"
        );
        assert!(!shim.multibinding);
        assert!(merged.modules.contains(&shim.module_name));
    }

    #[test]
    fn contributed_modules_and_shims_share_one_sort_order() {
        // The shim's generated package sorts before org.lib, so the shim
        // must precede the contributed module in the final list.
        let late = module("org.lib.LateModule", "com.app.AppScope");
        let bound = binding("com.app.Impl", "com.app.AppScope", "com.app.Api");
        let merged = synthesize(&root(), &[&bound, &late]).unwrap();
        assert_eq!(
            merged.modules,
            vec![
                qn("conflux.generated.module.com_app_Impl_com_app_AppScope_com_app_Api_BindingModule"),
                qn("org.lib.LateModule"),
            ]
        );
    }

    #[test]
    fn higher_rank_wins_binding_conflict() {
        let low = binding("com.app.FakeRepo", "com.app.AppScope", "com.app.Repo");
        let high = binding("com.app.RealRepo", "com.app.AppScope", "com.app.Repo")
            .with_rank(Rank::HIGH);
        let merged = synthesize(&root(), &[&low, &high]).unwrap();
        assert_eq!(merged.shims.len(), 1);
        assert_eq!(merged.shims[0].origin, qn("com.app.RealRepo"));
    }

    #[test]
    fn equal_rank_conflict_is_fatal() {
        let a = binding("com.app.RepoA", "com.app.AppScope", "com.app.Repo");
        let b = binding("com.app.RepoB", "com.app.AppScope", "com.app.Repo");
        let err = synthesize(&root(), &[&a, &b]).unwrap_err();
        assert!(matches!(
            err,
            MergeError::DuplicateBinding {
                ref first,
                ref second,
                ..
            } if first.as_str() == "com.app.RepoA" && second.as_str() == "com.app.RepoB"
        ));
    }

    #[test]
    fn distinct_qualifiers_do_not_conflict() {
        let plain = binding("com.app.RepoA", "com.app.AppScope", "com.app.Repo");
        let named = binding("com.app.RepoB", "com.app.AppScope", "com.app.Repo")
            .with_qualifier(AnnotationKey::of(Annotation::new(qn("javax.inject.Named"))));
        let merged = synthesize(&root(), &[&plain, &named]).unwrap();
        assert_eq!(merged.shims.len(), 2);
    }

    #[test]
    fn multibindings_all_survive() {
        let a = Contribution::new(
            qn("com.app.PluginA"),
            scope("com.app.AppScope"),
            ContributionKind::Multibinding {
                bound_type: qn("com.app.Plugin"),
                map_key: None,
            },
        );
        let b = Contribution::new(
            qn("com.app.PluginB"),
            scope("com.app.AppScope"),
            ContributionKind::Multibinding {
                bound_type: qn("com.app.Plugin"),
                map_key: None,
            },
        );
        let merged = synthesize(&root(), &[&a, &b]).unwrap();
        assert_eq!(merged.shims.len(), 2);
        assert!(merged.shims.iter().all(|s| s.multibinding));
    }

    #[test]
    fn interfaces_only_root_skips_modules() {
        let root = Root::new(
            qn("com.app.AppComponent"),
            RootKind::InterfacesOnly,
            scope("com.app.AppScope"),
        );
        let m = module("com.app.NetworkModule", "com.app.AppScope");
        let s = Contribution::new(
            qn("com.app.Callbacks"),
            scope("com.app.AppScope"),
            ContributionKind::Supertype,
        );
        let merged = synthesize(&root, &[&m, &s]).unwrap();
        assert!(merged.modules.is_empty());
        assert!(merged.shims.is_empty());
        assert_eq!(merged.supertypes, vec![qn("com.app.Callbacks")]);
    }

    #[test]
    fn supertypes_deduplicate_against_existing() {
        let root = root().with_existing_supertypes(vec![qn("com.app.Callbacks")]);
        let s = Contribution::new(
            qn("com.app.Callbacks"),
            scope("com.app.AppScope"),
            ContributionKind::Supertype,
        );
        let merged = synthesize(&root, &[&s]).unwrap();
        assert_eq!(merged.supertypes, vec![qn("com.app.Callbacks")]);
    }

    #[test]
    fn subcomponent_contributions_are_ignored_in_lists() {
        let sub = Contribution::new(
            qn("com.app.UserComponent"),
            scope("com.app.UserScope"),
            ContributionKind::Subcomponent {
                parent_scope: scope("com.app.AppScope"),
            },
        );
        let merged = synthesize(&root(), &[&sub]).unwrap();
        assert!(merged.modules.is_empty());
        assert!(merged.supertypes.is_empty());
    }

    #[test]
    fn generated_name_and_package_derive_from_origin() {
        let merged = synthesize(&root(), &[]).unwrap();
        assert_eq!(merged.package, "com.app");
        assert_eq!(merged.name, "MergedAppComponent");
    }
}

//! Subcomponent propagation loop.
//!
//! The engine owns all cross-round state: the scope index, the
//! processed-event set, the emitted-artifact set, and the root registry.
//! Each compilation round scans the declarations visible to it, indexes
//! what it finds, and merges every root that gained fresh merge events.
//! A merge event is one `(root, contribution)` pair; events already
//! processed are never re-emitted, which is also what breaks contribution
//! cycles. Newly contributed subcomponents become roots of their own in
//! the same round and merge in the next, so the loop is a breadth-first
//! expansion over the contribution/root graph until a round produces
//! nothing new.
//!
//! Single-threaded by construction; the host driver calls [`Engine::run_round`]
//! once per compilation round, or [`Engine::drain_until_empty`] when it
//! controls all rounds itself.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use conflux_core::annotation::{args, names};
use conflux_core::{
    Contribution, ContributionKind, DeclSet, DeclarationRef, GeneratedHint, MergeError,
    QualifiedName, Root, RootKind, RoundConfig, ScopeId, ScopeIndex,
};

use crate::resolver::Resolver;
use crate::scanner;
use crate::synthesizer::{synthesize, MergedComponent};

/// Hard cap on drain iterations. A well-formed project reaches its fixed
/// point in a handful of rounds; hitting the cap means the event guard
/// is broken.
const MAX_ROUNDS: u64 = 64;

/// What one round produced.
#[derive(Debug)]
pub enum RoundOutcome {
    /// Nothing new: no contributions, no roots, no merge events.
    FixedPoint,
    Progressed {
        merged: Vec<MergedComponent>,
        /// Hints this unit must emit for its own contributions.
        hints: Vec<GeneratedHint>,
        new_roots: usize,
        new_contributions: usize,
    },
}

/// The propagation loop driver. Long-lived across rounds.
pub struct Engine {
    config: RoundConfig,
    index: ScopeIndex,
    /// Stable hashes of every `(root, contribution)` pair already merged.
    processed_events: BTreeSet<String>,
    /// Origins whose generated artifact exists; replacing one of these
    /// is [`MergeError::ReplacementAfterGeneration`].
    emitted: BTreeSet<QualifiedName>,
    /// `(scope, origin)` pairs removed by replacement. Re-scanning the
    /// same sources next round must not resurrect them.
    retired: BTreeSet<(ScopeId, QualifiedName)>,
    roots: BTreeMap<QualifiedName, Root>,
    merged_roots: BTreeSet<QualifiedName>,
    /// Roots that exist because a subcomponent contribution spawned them.
    spawned_subcomponents: BTreeSet<QualifiedName>,
    /// Contribution/root graph, for cycle diagnostics only.
    graph: DiGraph<QualifiedName, ()>,
    graph_nodes: BTreeMap<QualifiedName, NodeIndex>,
    binaries_scanned: bool,
    round: u64,
}

impl Engine {
    pub fn new(config: RoundConfig) -> Self {
        Self {
            config,
            index: ScopeIndex::new(),
            processed_events: BTreeSet::new(),
            emitted: BTreeSet::new(),
            retired: BTreeSet::new(),
            roots: BTreeMap::new(),
            merged_roots: BTreeSet::new(),
            spawned_subcomponents: BTreeSet::new(),
            graph: DiGraph::new(),
            graph_nodes: BTreeMap::new(),
            binaries_scanned: false,
            round: 0,
        }
    }

    pub fn index(&self) -> &ScopeIndex {
        &self.index
    }

    pub fn emitted(&self) -> &BTreeSet<QualifiedName> {
        &self.emitted
    }

    /// Serializable snapshot of the cross-round state, for diagnostics.
    pub fn debug_data(&self) -> serde_json::Value {
        serde_json::json!({
            "round": self.round,
            "index": self.index.to_debug_data(),
            "roots": self.roots.keys().collect::<Vec<_>>(),
            "emitted": self.emitted,
            "processed_events": self.processed_events.len(),
        })
    }

    /// Run one compilation round over the declarations the host made
    /// visible. May be called repeatedly with a growing declaration set;
    /// all cross-round state is monotonic.
    #[instrument(skip_all, fields(round = self.round + 1, decls = decls.len()))]
    pub fn run_round(&mut self, decls: &DeclSet) -> Result<RoundOutcome, MergeError> {
        if !self.config.merging_enabled() {
            debug!("merging disabled by round config");
            return Ok(RoundOutcome::FixedPoint);
        }
        self.round += 1;

        let scan = scanner::scan_sources(decls)?;
        let mut contributions = scan.contributions;
        if !self.binaries_scanned {
            // Compiled dependencies cannot change between rounds; their
            // hints are decoded exactly once per engine lifetime.
            contributions.extend(scanner::scan_dependency_hints(decls)?);
            self.binaries_scanned = true;
        }
        Resolver::check_duplicate_scopes(&contributions)?;

        let mut new_contributions = 0;
        for contribution in contributions {
            let identity = (
                contribution.target_scope().clone(),
                contribution.origin.clone(),
            );
            if self.retired.contains(&identity) {
                continue;
            }
            if self.index.index(contribution) {
                new_contributions += 1;
            }
        }

        let mut new_roots = 0;
        for root in scan.roots {
            if self.register_root(root) {
                new_roots += 1;
            }
        }

        let mut merged = Vec::new();
        let mut fresh_events = 0;
        // Snapshot: merging may spawn new roots, which merge next round.
        let pending: Vec<QualifiedName> = self.roots.keys().cloned().collect();
        for origin in pending {
            let root = self.roots[&origin].clone();
            let removed =
                Resolver::apply_replacements(&mut self.index, &root.target_scope, &self.emitted)?;
            for name in removed {
                self.retired.insert((root.target_scope.clone(), name));
            }

            let survivors: Vec<Contribution> = Resolver::survivors_for_root(&self.index, &root)
                .into_iter()
                .cloned()
                .collect();

            let mut fresh = Vec::new();
            for contribution in &survivors {
                if self.processed_events.insert(event_key(&root, contribution)) {
                    self.record_edge(&contribution.origin, &root.origin);
                    fresh.push(contribution.clone());
                }
            }
            fresh_events += fresh.len();

            // A root merges when it gained events, and at least once even
            // with an empty working set (its existing lists still need a
            // generated counterpart).
            if fresh.is_empty() && self.merged_roots.contains(&root.origin) {
                continue;
            }
            let survivor_refs: Vec<&Contribution> = survivors.iter().collect();
            let component = synthesize(&root, &survivor_refs)?;
            self.merged_roots.insert(root.origin.clone());
            for shim in &component.shims {
                self.emitted.insert(shim.origin.clone());
            }
            if self.spawned_subcomponents.contains(&root.origin) {
                self.emitted.insert(root.origin.clone());
            }
            merged.push(component);

            for contribution in &fresh {
                if let ContributionKind::Subcomponent { parent_scope } = &contribution.kind {
                    if let Some(child) = spawn_child_root(decls, contribution, parent_scope)? {
                        let origin = child.origin.clone();
                        if self.register_root(child) {
                            self.spawned_subcomponents.insert(origin.clone());
                            self.record_edge(&root.origin, &origin);
                            new_roots += 1;
                            info!(subcomponent = %origin, "spawned subcomponent root");
                        }
                    }
                }
            }
        }

        if is_cyclic_directed(&self.graph) {
            // Not an error: the processed-event set already prevents
            // regeneration, so a cycle only warrants a diagnostic.
            warn!("contribution/root graph contains a cycle");
        }

        if new_contributions == 0 && new_roots == 0 && fresh_events == 0 && merged.is_empty() {
            info!(round = self.round, "fixed point reached");
            return Ok(RoundOutcome::FixedPoint);
        }
        debug!(
            merged = merged.len(),
            new_roots, new_contributions, fresh_events, "round progressed"
        );
        Ok(RoundOutcome::Progressed {
            merged,
            hints: scan.hints,
            new_roots,
            new_contributions,
        })
    }

    /// Run rounds until the fixed point, returning every merged
    /// component in merge order.
    pub fn drain_until_empty(
        &mut self,
        decls: &DeclSet,
    ) -> Result<Vec<MergedComponent>, MergeError> {
        let mut all = Vec::new();
        for _ in 0..MAX_ROUNDS {
            match self.run_round(decls)? {
                RoundOutcome::FixedPoint => return Ok(all),
                RoundOutcome::Progressed { merged, .. } => all.extend(merged),
            }
        }
        Err(MergeError::Internal(format!(
            "no fixed point after {} rounds; processed-event guard is not converging",
            MAX_ROUNDS
        )))
    }

    fn register_root(&mut self, root: Root) -> bool {
        use std::collections::btree_map::Entry;
        match self.roots.entry(root.origin.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(root);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    fn record_edge(&mut self, from: &QualifiedName, to: &QualifiedName) {
        let from = self.graph_node(from);
        let to = self.graph_node(to);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    fn graph_node(&mut self, name: &QualifiedName) -> NodeIndex {
        if let Some(node) = self.graph_nodes.get(name) {
            return *node;
        }
        let node = self.graph.add_node(name.clone());
        self.graph_nodes.insert(name.clone(), node);
        node
    }
}

/// Stable identity of one merge event.
fn event_key(root: &Root, contribution: &Contribution) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root.origin.as_str());
    hasher.update("|");
    hasher.update(root.target_scope.as_str());
    hasher.update("|");
    hasher.update(contribution.origin.as_str());
    hasher.update("|");
    hasher.update(contribution.target_scope().as_str());
    hasher.update("|");
    hasher.update(format!("{:?}", contribution.kind.tag()));
    format!("{:x}", hasher.finalize())
}

/// Build the merge root for a freshly discovered subcomponent
/// contribution. Returns `None` when the origin declaration is not
/// visible (a dependency-only subcomponent merges in its own unit).
fn spawn_child_root(
    decls: &DeclSet,
    contribution: &Contribution,
    parent_scope: &ScopeId,
) -> Result<Option<Root>, MergeError> {
    let Some(decl) = decls.get(&contribution.origin) else {
        warn!(origin = %contribution.origin, "subcomponent declaration not visible; skipping");
        return Ok(None);
    };

    check_inner_candidates(decls, decl.as_ref(), parent_scope)?;

    let annotation = decl.annotation(names::CONTRIBUTES_SUBCOMPONENT);
    let mut root = Root::new(
        contribution.origin.clone(),
        RootKind::Subcomponent,
        contribution.scope.clone(),
    )
    .with_existing_supertypes(decl.direct_supertypes().to_vec());
    if let Some(annotation) = annotation {
        root = root
            .with_exclusions(annotation.class_array_arg(args::EXCLUDE))
            .with_existing_modules(annotation.class_array_arg(args::MODULES));
    }
    Ok(Some(root))
}

/// A contributed subcomponent may declare at most one parent component
/// interface (an inner interface contributed to the parent scope) and at
/// most one factory interface.
fn check_inner_candidates(
    decls: &DeclSet,
    decl: &dyn DeclarationRef,
    parent_scope: &ScopeId,
) -> Result<(), MergeError> {
    let mut parent_interfaces = Vec::new();
    let mut factories = Vec::new();
    for inner_name in decl.inner_declarations() {
        let Some(inner) = decls.get(inner_name) else {
            continue;
        };
        if inner.has_annotation(names::SUBCOMPONENT_FACTORY) {
            factories.push(inner_name.clone());
        }
        let contributed_to_parent = inner
            .annotation(names::CONTRIBUTES_TO)
            .and_then(|a| a.scope_arg(args::SCOPE))
            .is_some_and(|scope| &scope == parent_scope);
        if contributed_to_parent {
            parent_interfaces.push(inner_name.clone());
        }
    }

    if parent_interfaces.len() > 1 {
        return Err(MergeError::AmbiguousParentComponent {
            subcomponent: decl.qualified_name().clone(),
            candidates: parent_interfaces,
        });
    }
    if factories.len() > 1 {
        return Err(MergeError::AmbiguousFactory {
            subcomponent: decl.qualified_name().clone(),
            candidates: factories,
        });
    }
    Ok(())
}

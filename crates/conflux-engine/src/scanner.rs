//! Contribution scanner.
//!
//! Walks the declarations visible to a round and classifies each as
//! zero or more contribution records and merge roots, validating
//! contribution shapes as it goes. The scanner also decides what each
//! contribution's cross-module hint must encode; writing the hint is the
//! emission layer's job.
//!
//! Source declarations are scanned every round. Binary-dependency
//! declarations are reachable only through decoded hints and are scanned
//! once, lazily, by [`scan_dependency_hints`].

use std::collections::BTreeSet;

use tracing::{debug, instrument, warn};

use conflux_core::annotation::{args, names};
use conflux_core::{
    Annotation, AnnotationKey, Contribution, ContributionKind, DeclKind, DeclSet, DeclarationRef,
    GeneratedHint, MergeError, OriginKind, QualifiedName, Rank, Root, RootKind, ScopeId,
    Visibility,
};

/// Everything one scan pass produced.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub contributions: Vec<Contribution>,
    pub roots: Vec<Root>,
    /// Hints to be emitted for this module's own contributions.
    pub hints: Vec<GeneratedHint>,
}

/// Scan every source declaration in the set.
#[instrument(skip_all, fields(decls = decls.len()))]
pub fn scan_sources(decls: &DeclSet) -> Result<ScanOutput, MergeError> {
    let mut output = ScanOutput::default();

    for decl in decls.iter() {
        if decl.origin_kind() != OriginKind::Source {
            continue;
        }
        classify(decls, decl.as_ref(), &mut output, true)?;
    }

    output.hints = decided_hints(&output.contributions);
    debug!(
        contributions = output.contributions.len(),
        roots = output.roots.len(),
        "scanned source declarations"
    );
    Ok(output)
}

/// Reconstruct contributions from compiled dependencies.
///
/// Each dependency hint names a contributed type whose binary
/// declaration still carries its contribution annotations; the hint is
/// discovery only, classification re-reads the annotations. Hints whose
/// contributed type is not visible are skipped with a warning; the
/// dependency may have been compiled against a different classpath.
#[instrument(skip_all, fields(hints = decls.dependency_hints().len()))]
pub fn scan_dependency_hints(decls: &DeclSet) -> Result<Vec<Contribution>, MergeError> {
    let mut contributed_types = BTreeSet::new();
    for payload in decls.dependency_hints() {
        let hint = GeneratedHint::decode(payload)?;
        contributed_types.insert(hint.contributed_type);
    }

    let mut output = ScanOutput::default();
    for name in contributed_types {
        let Some(decl) = decls.get(&name) else {
            warn!(%name, "hint references a type not on the classpath; skipping");
            continue;
        };
        // Merge annotations on binary declarations never create roots
        // here; merging happens in the unit that compiles the root.
        classify(decls, decl.as_ref(), &mut output, false)?;
    }

    debug!(
        contributions = output.contributions.len(),
        "reconstructed contributions from dependency hints"
    );
    Ok(output.contributions)
}

/// The hints this module must emit for its own contributions, one per
/// record, keyed on the contribution's target scope.
pub fn decided_hints(contributions: &[Contribution]) -> Vec<GeneratedHint> {
    contributions
        .iter()
        .map(|c| {
            GeneratedHint::new(c.target_scope().clone(), c.origin.clone())
                .with_replaces(c.replaces.clone())
        })
        .collect()
}

fn classify(
    decls: &DeclSet,
    decl: &dyn DeclarationRef,
    output: &mut ScanOutput,
    collect_roots: bool,
) -> Result<(), MergeError> {
    for annotation in decl.annotations() {
        match annotation.name.as_str() {
            names::CONTRIBUTES_BINDING => {
                output
                    .contributions
                    .push(binding_contribution(decls, decl, annotation, false)?);
            }
            names::CONTRIBUTES_MULTIBINDING => {
                output
                    .contributions
                    .push(binding_contribution(decls, decl, annotation, true)?);
            }
            names::CONTRIBUTES_TO => {
                output
                    .contributions
                    .push(module_or_supertype_contribution(decl, annotation)?);
            }
            names::CONTRIBUTES_SUBCOMPONENT => {
                output
                    .contributions
                    .push(subcomponent_contribution(decl, annotation)?);
            }
            names::MERGE_COMPONENT if collect_roots => {
                output.roots.push(root(decl, annotation, RootKind::Component)?);
            }
            names::MERGE_SUBCOMPONENT if collect_roots => {
                output
                    .roots
                    .push(root(decl, annotation, RootKind::Subcomponent)?);
            }
            names::MERGE_INTERFACES if collect_roots => {
                output
                    .roots
                    .push(root(decl, annotation, RootKind::InterfacesOnly)?);
            }
            names::MERGE_MODULES if collect_roots => {
                output
                    .roots
                    .push(root(decl, annotation, RootKind::ModulesOnly)?);
            }
            _ => {}
        }
    }
    Ok(())
}

fn require_public(decl: &dyn DeclarationRef) -> Result<(), MergeError> {
    if decl.visibility() != Visibility::Public {
        return Err(MergeError::NonPublicContribution {
            origin: decl.qualified_name().clone(),
        });
    }
    Ok(())
}

fn scope_of(decl: &dyn DeclarationRef, annotation: &Annotation, key: &str) -> Result<ScopeId, MergeError> {
    annotation
        .scope_arg(key)
        .ok_or_else(|| MergeError::UnresolvedScope {
            origin: decl.qualified_name().clone(),
        })
}

/// At most one qualifier annotation per contributing declaration.
fn qualifier_of(decl: &dyn DeclarationRef) -> Result<Option<AnnotationKey>, MergeError> {
    let qualifiers: Vec<&Annotation> = decl
        .annotations()
        .iter()
        .filter(|a| a.is_qualifier)
        .collect();
    if qualifiers.len() > 1 {
        return Err(MergeError::MultipleQualifiers {
            origin: decl.qualified_name().clone(),
        });
    }
    Ok(qualifiers.first().map(|a| AnnotationKey::of((*a).clone())))
}

/// At most one map key annotation for multibindings.
fn map_key_of(decl: &dyn DeclarationRef) -> Result<Option<AnnotationKey>, MergeError> {
    let keys: Vec<&Annotation> = decl
        .annotations()
        .iter()
        .filter(|a| a.is_map_key)
        .collect();
    if keys.len() > 1 {
        return Err(MergeError::MultipleMapKeys {
            origin: decl.qualified_name().clone(),
        });
    }
    Ok(keys.first().map(|a| AnnotationKey::of((*a).clone())))
}

fn binding_contribution(
    decls: &DeclSet,
    decl: &dyn DeclarationRef,
    annotation: &Annotation,
    multibinding: bool,
) -> Result<Contribution, MergeError> {
    require_public(decl)?;
    let origin = decl.qualified_name().clone();
    let scope = scope_of(decl, annotation, args::SCOPE)?;

    let bound_type = match annotation.class_arg(args::BOUND_TYPE) {
        Some(explicit) => {
            let chain = decls.supertype_chain(&origin);
            if !chain.contains(explicit) {
                return Err(MergeError::BoundTypeNotSupertype {
                    origin,
                    bound_type: explicit.clone(),
                });
            }
            explicit.clone()
        }
        None => {
            let direct = decl.direct_supertypes();
            if direct.len() != 1 {
                return Err(MergeError::AmbiguousBoundType {
                    origin,
                    candidates: direct.len(),
                });
            }
            direct[0].clone()
        }
    };

    // Generic bound types are unsupported: every declared type parameter
    // of the bound type must resolve to a concrete argument at the
    // contribution site.
    if let Some(bound_decl) = decls.get(&bound_type) {
        for param in bound_decl.type_parameters() {
            if decl.resolve_generic_parameter(param).is_none() {
                return Err(MergeError::GenericBoundType {
                    origin,
                    bound_type,
                });
            }
        }
    }

    let qualifier = qualifier_of(decl)?;
    let kind = if multibinding {
        ContributionKind::Multibinding {
            bound_type,
            map_key: map_key_of(decl)?,
        }
    } else {
        ContributionKind::Binding { bound_type }
    };

    let mut contribution = Contribution::new(origin, scope, kind)
        .with_replaces(annotation.class_array_arg(args::REPLACES))
        .with_rank(Rank(annotation.int_arg(args::RANK).unwrap_or(0)));
    if let Some(qualifier) = qualifier {
        contribution = contribution.with_qualifier(qualifier);
    }
    Ok(contribution)
}

fn module_or_supertype_contribution(
    decl: &dyn DeclarationRef,
    annotation: &Annotation,
) -> Result<Contribution, MergeError> {
    require_public(decl)?;
    let origin = decl.qualified_name().clone();
    let scope = scope_of(decl, annotation, args::SCOPE)?;

    let kind = if decl.has_annotation(names::MODULE) {
        ContributionKind::Module
    } else if decl.decl_kind() == DeclKind::Interface {
        ContributionKind::Supertype
    } else {
        return Err(MergeError::InvalidModuleContribution { origin });
    };

    Ok(Contribution::new(origin, scope, kind)
        .with_replaces(annotation.class_array_arg(args::REPLACES)))
}

fn subcomponent_contribution(
    decl: &dyn DeclarationRef,
    annotation: &Annotation,
) -> Result<Contribution, MergeError> {
    require_public(decl)?;
    let origin = decl.qualified_name().clone();
    if !matches!(decl.decl_kind(), DeclKind::Interface | DeclKind::AbstractClass) {
        return Err(MergeError::InvalidSubcomponentContribution { origin });
    }

    let scope = scope_of(decl, annotation, args::SCOPE)?;
    let parent_scope = scope_of(decl, annotation, args::PARENT_SCOPE)?;

    Ok(Contribution::new(
        origin,
        scope,
        ContributionKind::Subcomponent { parent_scope },
    )
    .with_replaces(annotation.class_array_arg(args::REPLACES)))
}

fn root(
    decl: &dyn DeclarationRef,
    annotation: &Annotation,
    kind: RootKind,
) -> Result<Root, MergeError> {
    let target_scope = scope_of(decl, annotation, args::SCOPE)?;
    Ok(
        Root::new(decl.qualified_name().clone(), kind, target_scope)
            .with_exclusions(annotation.class_array_arg(args::EXCLUDE))
            .with_existing_modules(annotation.class_array_arg(args::MODULES))
            .with_existing_supertypes(decl.direct_supertypes().to_vec()),
    )
}

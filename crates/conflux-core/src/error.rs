//! Error taxonomy for contribution merging.
//!
//! Every variant is fatal to the compilation round that raised it; the
//! engine performs no silent recovery and no retries. Each error carries
//! the qualified name(s) needed to point the developer at the offending
//! declaration.

use thiserror::Error;

use crate::name::{QualifiedName, ScopeId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("invalid qualified name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error(
        "{origin} binds {bound_type}, but {bound_type} is not a supertype of {origin}"
    )]
    BoundTypeNotSupertype {
        origin: QualifiedName,
        bound_type: QualifiedName,
    },

    #[error(
        "{origin} has {candidates} direct supertype(s); contributed bindings must either \
         extend exactly one type or name the bound type explicitly"
    )]
    AmbiguousBoundType {
        origin: QualifiedName,
        candidates: usize,
    },

    #[error("{origin} binds {bound_type}, which carries unresolved type parameters; generic bindings are not supported")]
    GenericBoundType {
        origin: QualifiedName,
        bound_type: QualifiedName,
    },

    #[error("{origin} is contributed as a module but is neither an interface nor annotated as a module")]
    InvalidModuleContribution { origin: QualifiedName },

    #[error("{origin} is contributed as a subcomponent but is neither an interface nor an abstract class")]
    InvalidSubcomponentContribution { origin: QualifiedName },

    #[error("{origin} is contributed to a scope and must be public")]
    NonPublicContribution { origin: QualifiedName },

    #[error("{origin} carries more than one qualifier annotation")]
    MultipleQualifiers { origin: QualifiedName },

    #[error("{origin} carries more than one map key annotation")]
    MultipleMapKeys { origin: QualifiedName },

    #[error("{origin} contributes to scope {scope} more than once with the same contribution kind")]
    DuplicateScopeContribution {
        origin: QualifiedName,
        scope: ScopeId,
    },

    #[error(
        "{replacer} replaces {replaced}, but code for {replaced} was already generated in an \
         earlier round; replacements must be declared before the replaced contribution is merged"
    )]
    ReplacementAfterGeneration {
        replacer: QualifiedName,
        replaced: QualifiedName,
    },

    #[error(
        "{replacer} (scope {scope}) replaces {replaced}, which only contributes to other scopes; \
         replacements must stay within one scope"
    )]
    CrossScopeReplacement {
        replacer: QualifiedName,
        replaced: QualifiedName,
        scope: ScopeId,
    },

    #[error(
        "bindings from {first} and {second} for {bound_type} in scope {scope} have equal rank; \
         exactly one binding per type and qualifier may win"
    )]
    DuplicateBinding {
        scope: ScopeId,
        bound_type: QualifiedName,
        first: QualifiedName,
        second: QualifiedName,
    },

    #[error("{subcomponent} declares more than one parent component interface: {candidates:?}")]
    AmbiguousParentComponent {
        subcomponent: QualifiedName,
        candidates: Vec<QualifiedName>,
    },

    #[error("{subcomponent} declares more than one factory interface: {candidates:?}")]
    AmbiguousFactory {
        subcomponent: QualifiedName,
        candidates: Vec<QualifiedName>,
    },

    #[error("could not resolve the scope argument on {origin} to a concrete type")]
    UnresolvedScope { origin: QualifiedName },

    #[error("malformed contribution hint {payload:?}: {reason}")]
    MalformedHint { payload: String, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

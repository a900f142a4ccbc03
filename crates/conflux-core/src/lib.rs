//! Core data model for the conflux contribution merging engine.
//!
//! This crate defines the value types the engine operates on: qualified
//! names and scope identities, annotation snapshots, the read-only
//! declaration abstraction over source and compiled-binary declarations,
//! contribution and root records, the scope index, and the generated
//! hint wire format used for cross-module contribution discovery.

pub mod annotation;
pub mod config;
pub mod contribution;
pub mod decl;
pub mod error;
pub mod hint;
pub mod index;
pub mod name;
pub mod naming;
pub mod root;

pub use annotation::{Annotation, AnnotationKey, ArgValue};
pub use config::RoundConfig;
pub use contribution::{Contribution, ContributionKind, ContributionKindTag, Rank};
pub use decl::{BinaryDecl, DeclKind, DeclSet, DeclarationRef, OriginKind, SourceDecl, Visibility};
pub use error::MergeError;
pub use hint::{GeneratedHint, HINT_PACKAGE};
pub use index::ScopeIndex;
pub use name::{QualifiedName, ScopeId};
pub use root::{Root, RootKind};

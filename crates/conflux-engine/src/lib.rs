//! The conflux merging engine.
//!
//! One compilation round runs four passes over the declarations visible
//! to it:
//!
//! ```text
//! Scan -> Index -> Resolve -> Synthesize
//!   |       |         |           |
//! contributions  scope     replacement   merged module /
//! and roots      index     & exclusion   supertype lists
//! ```
//!
//! The [`worklist::Engine`] drives these passes across rounds until a
//! fixed point: contributed subcomponents become new roots in the next
//! round, which can in turn discover further contributions.

pub mod resolver;
pub mod scanner;
pub mod synthesizer;
pub mod worklist;

pub use resolver::Resolver;
pub use scanner::{scan_dependency_hints, scan_sources, ScanOutput};
pub use synthesizer::{synthesize, BindingShim, MergedComponent, GENERATED_MODULE_PACKAGE};
pub use worklist::{Engine, RoundOutcome};

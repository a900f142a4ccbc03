//! Emission boundary for merge results.
//!
//! The engine produces a structural description of each merged
//! component; this crate renders it to deterministic host-language
//! source text and cross-checks the textual rendering against the
//! structural result. The two representations must agree on final
//! content; the cross-check is an invariant, not a second source of
//! truth.

pub mod crosscheck;
pub mod error;
pub mod render;

pub use crosscheck::verify_component;
pub use error::CodegenError;
pub use render::{render_component, render_hint, render_shim};

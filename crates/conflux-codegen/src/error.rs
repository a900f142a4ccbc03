//! Error types for rendering and cross-checking.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("rendered output for {component} is missing section {section:?}")]
    MissingSection {
        component: String,
        section: String,
    },

    #[error(
        "structural and textual {list} lists disagree for {component}: \
         structural {structural:?}, rendered {rendered:?}"
    )]
    ListMismatch {
        component: String,
        list: String,
        structural: Vec<String>,
        rendered: Vec<String>,
    },
}

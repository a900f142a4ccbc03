//! Round configuration.
//!
//! Applicability flags consumed at the start of a round. Either flag
//! short-circuits the whole pipeline for that round; there is no
//! per-root granularity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Skip contribution merging entirely (e.g. a build that only wants
    /// the non-merged annotation processing of the host).
    #[serde(default)]
    pub disable_component_merging: bool,
    /// Generate factories only; merging is skipped.
    #[serde(default)]
    pub generate_factories_only: bool,
}

impl RoundConfig {
    pub fn merging_enabled(&self) -> bool {
        !self.disable_component_merging && !self.generate_factories_only
    }
}

//! Generated hint wire format.
//!
//! A hint is a synthetic marker declaration emitted into the well-known
//! package [`HINT_PACKAGE`] during a module's compilation. Downstream
//! compilation units cannot see this module's source, so they recover
//! contributions from compiled binaries by decoding hints instead. The
//! payload is the only persisted, binary-compatible artifact the engine
//! defines; it must round-trip across separate compilations.
//!
//! Layout: `scope|contributedType|replaces...`, with ordered `|`-joined
//! fully-qualified names. `|` is rejected inside names by
//! [`QualifiedName::parse`], so the encoding is unambiguous.

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::name::{QualifiedName, ScopeId};
use crate::naming;

/// The well-known package hints are emitted into.
pub const HINT_PACKAGE: &str = "conflux.hint";

/// A cross-module contribution marker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeneratedHint {
    pub scope: ScopeId,
    pub contributed_type: QualifiedName,
    pub replaces: Vec<QualifiedName>,
}

impl GeneratedHint {
    pub fn new(scope: ScopeId, contributed_type: QualifiedName) -> Self {
        Self {
            scope,
            contributed_type,
            replaces: Vec::new(),
        }
    }

    pub fn with_replaces(mut self, replaces: Vec<QualifiedName>) -> Self {
        self.replaces = replaces;
        self
    }

    /// Encode to the pipe-delimited payload.
    pub fn encode(&self) -> String {
        let mut parts = Vec::with_capacity(2 + self.replaces.len());
        parts.push(self.scope.as_str());
        parts.push(self.contributed_type.as_str());
        parts.extend(self.replaces.iter().map(QualifiedName::as_str));
        parts.join("|")
    }

    /// Decode a payload produced by [`GeneratedHint::encode`].
    pub fn decode(payload: &str) -> Result<Self, MergeError> {
        let malformed = |reason: &str| MergeError::MalformedHint {
            payload: payload.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = payload.split('|');
        let scope = parts.next().ok_or_else(|| malformed("missing scope"))?;
        let contributed = parts
            .next()
            .ok_or_else(|| malformed("missing contributed type"))?;

        let scope = ScopeId::parse(scope).map_err(|_| malformed("invalid scope name"))?;
        let contributed_type =
            QualifiedName::parse(contributed).map_err(|_| malformed("invalid contributed type"))?;

        let mut replaces = Vec::new();
        for part in parts {
            replaces
                .push(QualifiedName::parse(part).map_err(|_| malformed("invalid replaces entry"))?);
        }

        Ok(Self {
            scope,
            contributed_type,
            replaces,
        })
    }

    /// The fully-qualified name of the marker declaration this hint is
    /// emitted as, derived from the contributed type and capped at the
    /// file-name limit.
    pub fn property_name(&self) -> QualifiedName {
        let simple = naming::capped_for_file_name(format!(
            "{}_hint",
            naming::flatten(&self.contributed_type)
        ));
        // The capped name contains no dots, so this cannot fail.
        QualifiedName::parse(&format!("{}.{}", HINT_PACKAGE, simple))
            .unwrap_or_else(|_| self.contributed_type.clone())
    }
}

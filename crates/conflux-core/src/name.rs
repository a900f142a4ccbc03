//! Qualified names and scope identities.
//!
//! A [`QualifiedName`] is a dotted fully-qualified type name
//! (e.g. `com.app.user.UserRepository`). It is the single identity used
//! throughout the engine: two declarations are the same declaration when
//! their qualified names are equal, regardless of whether they originate
//! from source text or from a compiled binary. Ordering is the canonical
//! string order, which is what makes merge output byte-stable.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;

/// A dotted fully-qualified type name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Parse a dotted name. Rejects empty names and empty segments.
    pub fn parse(name: &str) -> Result<Self, MergeError> {
        if name.is_empty() {
            return Err(MergeError::InvalidName {
                name: name.to_string(),
                reason: "empty name".to_string(),
            });
        }
        if name.split('.').any(str::is_empty) {
            return Err(MergeError::InvalidName {
                name: name.to_string(),
                reason: "empty segment".to_string(),
            });
        }
        if name.contains('|') {
            // '|' is the hint payload delimiter and can never appear in a name.
            return Err(MergeError::InvalidName {
                name: name.to_string(),
                reason: "reserved character '|'".to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last segment (e.g. `UserRepository`).
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Everything before the last segment, or `""` for top-level names.
    pub fn package(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// A name nested under this one (used for inner declarations).
    pub fn child(&self, simple: &str) -> QualifiedName {
        QualifiedName(format!("{}.{}", self.0, simple))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scope identity: a marker type used purely as a key.
///
/// Equality and ordering are inherited from the underlying qualified
/// name; a scope has no behavior of its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(QualifiedName);

impl ScopeId {
    pub fn new(name: QualifiedName) -> Self {
        Self(name)
    }

    pub fn parse(name: &str) -> Result<Self, MergeError> {
        Ok(Self(QualifiedName::parse(name)?))
    }

    pub fn name(&self) -> &QualifiedName {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<QualifiedName> for ScopeId {
    fn from(name: QualifiedName) -> Self {
        Self(name)
    }
}

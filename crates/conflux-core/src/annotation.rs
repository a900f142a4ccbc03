//! Annotation snapshots.
//!
//! The declaration abstraction hands the engine resolved annotation
//! values rather than syntax: every argument is already evaluated to a
//! class reference, a literal, or an array of class references. The
//! engine never sees unevaluated expressions.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::name::{QualifiedName, ScopeId};

/// Well-known annotation names recognized by the scanner.
pub mod names {
    /// Contribute the annotated class as a binding of its supertype.
    pub const CONTRIBUTES_BINDING: &str = "conflux.runtime.ContributesBinding";
    /// Contribute the annotated class into a set or map multibinding.
    pub const CONTRIBUTES_MULTIBINDING: &str = "conflux.runtime.ContributesMultibinding";
    /// Contribute the annotated module or interface to a scope.
    pub const CONTRIBUTES_TO: &str = "conflux.runtime.ContributesTo";
    /// Contribute the annotated interface as a subcomponent of a parent scope.
    pub const CONTRIBUTES_SUBCOMPONENT: &str = "conflux.runtime.ContributesSubcomponent";

    /// Merge a scope into the annotated component interface.
    pub const MERGE_COMPONENT: &str = "conflux.runtime.MergeComponent";
    /// Merge a scope into the annotated subcomponent interface.
    pub const MERGE_SUBCOMPONENT: &str = "conflux.runtime.MergeSubcomponent";
    /// Merge only contributed supertype interfaces.
    pub const MERGE_INTERFACES: &str = "conflux.runtime.MergeInterfaces";
    /// Merge only contributed modules.
    pub const MERGE_MODULES: &str = "conflux.runtime.MergeModules";

    /// Marker identifying a type as a module.
    pub const MODULE: &str = "conflux.runtime.Module";
    /// Marker identifying a nested subcomponent factory interface.
    pub const SUBCOMPONENT_FACTORY: &str = "conflux.runtime.SubcomponentFactory";
}

/// Argument names shared by the contribution and merge annotations.
pub mod args {
    pub const SCOPE: &str = "scope";
    pub const BOUND_TYPE: &str = "boundType";
    pub const REPLACES: &str = "replaces";
    pub const RANK: &str = "rank";
    pub const PARENT_SCOPE: &str = "parentScope";
    pub const EXCLUDE: &str = "exclude";
    pub const MODULES: &str = "modules";
}

/// A resolved annotation argument value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArgValue {
    ClassRef(QualifiedName),
    ClassArray(Vec<QualifiedName>),
    Str(String),
    Int(i64),
    Bool(bool),
}

/// A resolved annotation on a declaration.
///
/// `is_qualifier`/`is_map_key` snapshot what the declaration abstraction
/// resolved about the annotation class itself (whether it is
/// meta-annotated as a qualifier or a map key); the engine never loads
/// annotation classes on its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Annotation {
    pub name: QualifiedName,
    pub args: BTreeMap<String, ArgValue>,
    #[serde(default)]
    pub is_qualifier: bool,
    #[serde(default)]
    pub is_map_key: bool,
}

impl Annotation {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            args: BTreeMap::new(),
            is_qualifier: false,
            is_map_key: false,
        }
    }

    pub fn with_arg(mut self, key: &str, value: ArgValue) -> Self {
        self.args.insert(key.to_string(), value);
        self
    }

    pub fn qualifier(mut self) -> Self {
        self.is_qualifier = true;
        self
    }

    pub fn map_key(mut self) -> Self {
        self.is_map_key = true;
        self
    }

    pub fn arg(&self, key: &str) -> Option<&ArgValue> {
        self.args.get(key)
    }

    /// Resolve a class-reference argument, if present.
    pub fn class_arg(&self, key: &str) -> Option<&QualifiedName> {
        match self.args.get(key) {
            Some(ArgValue::ClassRef(name)) => Some(name),
            _ => None,
        }
    }

    /// Resolve a class-array argument; absent arguments read as empty.
    pub fn class_array_arg(&self, key: &str) -> Vec<QualifiedName> {
        match self.args.get(key) {
            Some(ArgValue::ClassArray(names)) => names.clone(),
            Some(ArgValue::ClassRef(name)) => vec![name.clone()],
            _ => Vec::new(),
        }
    }

    pub fn int_arg(&self, key: &str) -> Option<i64> {
        match self.args.get(key) {
            Some(ArgValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// The scope argument as a scope identity, if present.
    pub fn scope_arg(&self, key: &str) -> Option<ScopeId> {
        self.class_arg(key).cloned().map(ScopeId::new)
    }

    /// Render the annotation to its canonical string key. Arguments are
    /// emitted in `BTreeMap` order, so equal annotations always render
    /// identically.
    pub fn canonical_key(&self) -> String {
        let mut out = self.name.as_str().to_string();
        if self.args.is_empty() {
            return out;
        }
        out.push('(');
        for (i, (key, value)) in self.args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}=", key);
            match value {
                ArgValue::ClassRef(name) => {
                    let _ = write!(out, "{}", name);
                }
                ArgValue::ClassArray(names) => {
                    out.push('[');
                    for (j, name) in names.iter().enumerate() {
                        if j > 0 {
                            out.push_str(", ");
                        }
                        let _ = write!(out, "{}", name);
                    }
                    out.push(']');
                }
                ArgValue::Str(s) => {
                    let _ = write!(out, "{:?}", s);
                }
                ArgValue::Int(i) => {
                    let _ = write!(out, "{}", i);
                }
                ArgValue::Bool(b) => {
                    let _ = write!(out, "{}", b);
                }
            }
        }
        out.push(')');
        out
    }
}

/// An annotation paired with its canonical string key.
///
/// Used for qualifiers and map keys, where equality of the *rendered*
/// annotation (name plus arguments) is the identity that matters for
/// binding conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationKey {
    pub annotation: Annotation,
    pub canonical: String,
}

impl AnnotationKey {
    pub fn of(annotation: Annotation) -> Self {
        let canonical = annotation.canonical_key();
        Self {
            annotation,
            canonical,
        }
    }
}

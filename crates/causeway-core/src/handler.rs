//! Handler descriptors and the control vocabulary handlers speak.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fault::Fault;
use crate::types::TypeKey;

// ─── Qualifiers ───────────────────────────────────────────────────────────────

/// A comparable tag narrowing which handlers match a dispatch request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qualifier(pub String);

impl Qualifier {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Qualifier {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

/// An ordered set of qualifiers. Empty means "matches any qualifier".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifierSet(BTreeSet<Qualifier>);

impl QualifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, qualifier: Qualifier) {
        self.0.insert(qualifier);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, qualifier: &Qualifier) -> bool {
        self.0.contains(qualifier)
    }

    /// Returns `true` if the two sets share at least one qualifier.
    pub fn intersects(&self, other: &QualifierSet) -> bool {
        self.0.iter().any(|q| other.contains(q))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Qualifier> {
        self.0.iter()
    }
}

impl<Q: Into<Qualifier>> FromIterator<Q> for QualifierSet {
    fn from_iter<I: IntoIterator<Item = Q>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// ─── Traversal ────────────────────────────────────────────────────────────────

/// Which invocation tier a handler runs in. Each cause is visited by the
/// breadth tier first, then the depth tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Breadth,
    Depth,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breadth => write!(f, "breadth"),
            Self::Depth => write!(f, "depth"),
        }
    }
}

/// Orientation used for precedence comparison and cross-path ordering.
///
/// Descending-path handlers schedule before ascending ones in a mixed set,
/// and their precedence comparison runs highest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalPath {
    Ascending,
    Descending,
}

impl fmt::Display for TraversalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "ascending"),
            Self::Descending => write!(f, "descending"),
        }
    }
}

// ─── Descriptor ───────────────────────────────────────────────────────────────

/// Opaque invocation handle naming the handler body an invoker can run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(pub String);

impl HandlerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HandlerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Immutable record describing one registered handler.
///
/// Two descriptors are equal iff all identifying fields match; the engine's
/// processed-set and the ordering dedup both rely on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    /// Declared exception type (a type, not an instance). The registry
    /// expands the hierarchy at query time.
    pub exception_type: TypeKey,
    /// Qualifier set; empty matches any dispatch request.
    pub qualifiers: QualifierSet,
    /// Caller-defined ordering hint among handlers of the same type.
    pub precedence: i32,
    /// Which invocation tier runs this handler.
    pub pass: Pass,
    /// Orientation for precedence and cross-path ordering.
    pub path: TraversalPath,
    /// Invocation handle resolved by the [`HandlerInvoker`] seam.
    pub handle: HandlerId,
}

impl HandlerDescriptor {
    /// Descriptor with no qualifiers, precedence 0, ascending path.
    pub fn new(exception_type: TypeKey, pass: Pass, handle: impl Into<HandlerId>) -> Self {
        Self {
            exception_type,
            qualifiers: QualifierSet::new(),
            precedence: 0,
            pass,
            path: TraversalPath::Ascending,
            handle: handle.into(),
        }
    }

    pub fn with_qualifiers(mut self, qualifiers: QualifierSet) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_path(mut self, path: TraversalPath) -> Self {
        self.path = path;
        self
    }
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// The control directive a single handler invocation returns.
///
/// These are the engine's normal vocabulary, not failures. Returned up the
/// call stack as plain values; the entry point's caller decides whether
/// anything actually propagates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "directive", content = "fault", rename_all = "snake_case")]
pub enum Outcome {
    /// Mark handled and stop all further dispatch.
    Handled,
    /// Mark handled and keep going.
    MarkHandled,
    /// Stop all further dispatch without asserting handled.
    Abort,
    /// Mark handled, skip the rest of this cause (both tiers), move on.
    DropCause,
    /// Record intent to re-raise the originally raised fault.
    Rethrow,
    /// Record intent to raise a replacement fault instead.
    Throw(Fault),
}

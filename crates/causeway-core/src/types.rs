//! The fault type graph — an arena of named type descriptors with parent
//! edges, replacing runtime type introspection with an explicit,
//! precomputable ancestor walk.
//!
//! Every fault carries a [`TypeKey`] into one [`TypeArena`]. Hierarchy
//! questions ("which registered handler types apply to this concrete
//! type?") are answered by [`TypeArena::closure`], which lists the type
//! itself first and then every ancestor, most-specific first.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TypeGraphError;

/// Opaque key identifying one type in a [`TypeArena`].
///
/// Keys are only meaningful against the arena that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(u32);

impl TypeKey {
    /// Raw index of this key in its arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One registered type: a name plus the keys of its direct parents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeEntry {
    /// Unique type name (e.g. `"DatabaseError"`).
    pub name: String,
    /// Direct parents in declaration order. Empty for a root type.
    pub parents: Vec<TypeKey>,
}

/// Append-only arena of type descriptors.
///
/// Parents must be inserted before their children, so the edge list is a
/// DAG by construction and [`closure`](Self::closure) always terminates.
#[derive(Debug, Clone, Default)]
pub struct TypeArena {
    entries: Vec<TypeEntry>,
    by_name: HashMap<String, TypeKey>,
}

impl TypeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a type with the given direct parents.
    ///
    /// Fails if the name is already taken or a parent key is foreign to
    /// this arena.
    pub fn insert(&mut self, name: &str, parents: &[TypeKey]) -> Result<TypeKey, TypeGraphError> {
        if self.by_name.contains_key(name) {
            return Err(TypeGraphError::DuplicateType { name: name.to_string() });
        }
        for parent in parents {
            if parent.index() >= self.entries.len() {
                return Err(TypeGraphError::UnknownKey { key: parent.0 });
            }
        }
        let key = TypeKey(self.entries.len() as u32);
        self.entries.push(TypeEntry {
            name: name.to_string(),
            parents: parents.to_vec(),
        });
        self.by_name.insert(name.to_string(), key);
        Ok(key)
    }

    /// Look up a type key by name.
    pub fn key(&self, name: &str) -> Option<TypeKey> {
        self.by_name.get(name).copied()
    }

    /// Name of a registered type.
    pub fn name(&self, key: TypeKey) -> Result<&str, TypeGraphError> {
        self.entry(key).map(|e| e.name.as_str())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, key: TypeKey) -> Result<&TypeEntry, TypeGraphError> {
        self.entries
            .get(key.index())
            .ok_or(TypeGraphError::UnknownKey { key: key.0 })
    }

    /// The hierarchy closure of `key`: the type itself first, then every
    /// ancestor in breadth-first order over parent edges in declaration
    /// order, without duplicates.
    ///
    /// Total for every key the arena issued; fails only for a foreign key.
    pub fn closure(&self, key: TypeKey) -> Result<Vec<TypeKey>, TypeGraphError> {
        self.entry(key)?;
        let mut out = vec![key];
        let mut cursor = 0;
        while cursor < out.len() {
            let current = out[cursor];
            cursor += 1;
            for &parent in &self.entries[current.index()].parents {
                if !out.contains(&parent) {
                    out.push(parent);
                }
            }
        }
        Ok(out)
    }

    /// Returns `true` if `ancestor` appears in the closure of `key`.
    pub fn is_ancestor(&self, key: TypeKey, ancestor: TypeKey) -> Result<bool, TypeGraphError> {
        Ok(self.closure(key)?.contains(&ancestor))
    }
}

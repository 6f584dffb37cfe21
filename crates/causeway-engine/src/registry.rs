//! Two-phase handler registry: an open build phase accepting and validating
//! registrations, then a sealed read-only phase safe for concurrent
//! resolution without locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use causeway_core::error::{RegistryError, TypeGraphError};
use causeway_core::handler::{HandlerDescriptor, HandlerId, Pass, QualifierSet};
use causeway_core::types::{TypeArena, TypeKey};

use crate::ordering::HandlerOrdering;

/// Startup-phase registry accepting handler registrations.
///
/// Descriptors are keyed by their exact declared type; hierarchy expansion
/// happens at query time in [`HandlerRegistry::resolve`]. [`seal`](Self::seal)
/// consumes the builder, so late registration is unrepresentable.
#[derive(Debug)]
pub struct RegistryBuilder {
    arena: Arc<TypeArena>,
    by_type: HashMap<TypeKey, Vec<HandlerDescriptor>>,
    handles: HashSet<HandlerId>,
}

impl RegistryBuilder {
    pub fn new(arena: Arc<TypeArena>) -> Self {
        Self {
            arena,
            by_type: HashMap::new(),
            handles: HashSet::new(),
        }
    }

    /// Register one handler descriptor.
    ///
    /// Fails if the declared type key is foreign to the arena or the
    /// invocation handle is already taken. Both are definition-time
    /// configuration errors; dispatch never sees them.
    pub fn register(&mut self, descriptor: HandlerDescriptor) -> Result<(), RegistryError> {
        if self.arena.name(descriptor.exception_type).is_err() {
            return Err(RegistryError::UnknownExceptionType {
                handle: descriptor.handle.to_string(),
                key: descriptor.exception_type.index() as u32,
            });
        }
        if !self.handles.insert(descriptor.handle.clone()) {
            return Err(RegistryError::DuplicateHandler {
                handle: descriptor.handle.to_string(),
            });
        }
        self.by_type
            .entry(descriptor.exception_type)
            .or_default()
            .push(descriptor);
        Ok(())
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Freeze the registry. The sealed registry is immutable and safe to
    /// share across threads for concurrent resolution.
    pub fn seal(self) -> HandlerRegistry {
        debug!(handlers = self.handles.len(), types = self.by_type.len(), "registry sealed");
        HandlerRegistry {
            arena: self.arena,
            by_type: self.by_type,
        }
    }
}

/// Sealed, read-only handler registry.
#[derive(Debug)]
pub struct HandlerRegistry {
    arena: Arc<TypeArena>,
    by_type: HashMap<TypeKey, Vec<HandlerDescriptor>>,
}

impl HandlerRegistry {
    /// The fault type graph this registry resolves against.
    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    /// Every registered descriptor, in no particular order.
    pub fn descriptors(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.by_type.values().flatten()
    }

    /// Handlers applicable to a concrete fault type for one tier.
    ///
    /// Walks the type's closure gathering descriptors of the requested
    /// pass, keeps those whose qualifier set is empty or intersects the
    /// requested qualifiers, and returns them ordered by
    /// [`HandlerOrdering`] with Equal-comparing duplicates collapsed.
    /// Deterministic for identical inputs.
    pub fn resolve(
        &self,
        concrete: TypeKey,
        pass: Pass,
        requested: &QualifierSet,
    ) -> Result<Vec<HandlerDescriptor>, TypeGraphError> {
        let closure = self.arena.closure(concrete)?;
        let ordering = HandlerOrdering::from_closure(&closure);

        let mut matched: Vec<HandlerDescriptor> = Vec::new();
        for hierarchy_type in &closure {
            let Some(declared) = self.by_type.get(hierarchy_type) else {
                continue;
            };
            for descriptor in declared {
                if descriptor.pass != pass {
                    continue;
                }
                if descriptor.qualifiers.is_empty() || descriptor.qualifiers.intersects(requested) {
                    matched.push(descriptor.clone());
                }
            }
        }

        matched.sort_by(|a, b| ordering.compare(a, b));
        matched.dedup_by(|a, b| ordering.compare(a, b).is_eq());

        debug!(
            concrete = self.arena.name(concrete).unwrap_or("?"),
            %pass,
            matched = matched.len(),
            "resolved handlers"
        );
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::handler::TraversalPath;

    fn hierarchy() -> (Arc<TypeArena>, TypeKey, TypeKey, TypeKey) {
        let mut arena = TypeArena::new();
        let root = arena.insert("Throwable", &[]).unwrap();
        let mid = arena.insert("IoError", &[root]).unwrap();
        let leaf = arena.insert("SocketError", &[mid]).unwrap();
        (Arc::new(arena), root, mid, leaf)
    }

    #[test]
    fn register_rejects_duplicate_handle() {
        let (arena, root, _, _) = hierarchy();
        let mut builder = RegistryBuilder::new(arena);
        builder
            .register(HandlerDescriptor::new(root, Pass::Breadth, "h"))
            .unwrap();
        let result = builder.register(HandlerDescriptor::new(root, Pass::Depth, "h"));
        assert!(matches!(result, Err(RegistryError::DuplicateHandler { .. })));
    }

    #[test]
    fn register_rejects_foreign_type_key() {
        let (arena, _, _, _) = hierarchy();
        let mut foreign_arena = TypeArena::new();
        for i in 0..10 {
            foreign_arena.insert(&format!("T{i}"), &[]).unwrap();
        }
        let foreign = foreign_arena.key("T9").unwrap();
        let mut builder = RegistryBuilder::new(arena);
        let result = builder.register(HandlerDescriptor::new(foreign, Pass::Breadth, "h"));
        assert!(matches!(result, Err(RegistryError::UnknownExceptionType { .. })));
    }

    #[test]
    fn resolve_expands_hierarchy_most_specific_first() {
        let (arena, root, mid, leaf) = hierarchy();
        let mut builder = RegistryBuilder::new(arena);
        builder.register(HandlerDescriptor::new(root, Pass::Breadth, "on-root")).unwrap();
        builder.register(HandlerDescriptor::new(leaf, Pass::Breadth, "on-leaf")).unwrap();
        builder.register(HandlerDescriptor::new(mid, Pass::Breadth, "on-mid")).unwrap();
        let registry = builder.seal();

        let resolved = registry
            .resolve(leaf, Pass::Breadth, &QualifierSet::new())
            .unwrap();
        let handles: Vec<_> = resolved.iter().map(|d| d.handle.as_str()).collect();
        assert_eq!(handles, vec!["on-leaf", "on-mid", "on-root"]);
    }

    #[test]
    fn resolve_filters_by_pass() {
        let (arena, root, _, _) = hierarchy();
        let mut builder = RegistryBuilder::new(arena);
        builder.register(HandlerDescriptor::new(root, Pass::Breadth, "b")).unwrap();
        builder.register(HandlerDescriptor::new(root, Pass::Depth, "d")).unwrap();
        let registry = builder.seal();

        let breadth = registry.resolve(root, Pass::Breadth, &QualifierSet::new()).unwrap();
        assert_eq!(breadth.len(), 1);
        assert_eq!(breadth[0].handle.as_str(), "b");
    }

    #[test]
    fn resolve_excludes_qualified_handler_without_matching_request() {
        let (arena, root, _, _) = hierarchy();
        let mut builder = RegistryBuilder::new(arena);
        builder
            .register(
                HandlerDescriptor::new(root, Pass::Breadth, "db-only")
                    .with_qualifiers(["db"].into_iter().collect()),
            )
            .unwrap();
        builder.register(HandlerDescriptor::new(root, Pass::Breadth, "generic")).unwrap();
        let registry = builder.seal();

        let unqualified = registry.resolve(root, Pass::Breadth, &QualifierSet::new()).unwrap();
        assert_eq!(unqualified.len(), 1);
        assert_eq!(unqualified[0].handle.as_str(), "generic");

        let qualified = registry
            .resolve(root, Pass::Breadth, &["db"].into_iter().collect())
            .unwrap();
        let handles: Vec<_> = qualified.iter().map(|d| d.handle.as_str()).collect();
        // Qualifier-bearing handler first, per the precedence tie-break.
        assert_eq!(handles, vec!["db-only", "generic"]);
    }

    #[test]
    fn resolve_keeps_both_tied_handlers_when_one_is_qualified() {
        let (arena, root, _, _) = hierarchy();
        let mut builder = RegistryBuilder::new(arena);
        builder
            .register(
                HandlerDescriptor::new(root, Pass::Breadth, "qualified")
                    .with_qualifiers(["web"].into_iter().collect()),
            )
            .unwrap();
        builder.register(HandlerDescriptor::new(root, Pass::Breadth, "generic")).unwrap();
        let registry = builder.seal();

        let resolved = registry
            .resolve(root, Pass::Breadth, &["web"].into_iter().collect())
            .unwrap();
        assert_eq!(resolved.len(), 2, "neither tied handler may be dropped");
    }

    #[test]
    fn resolve_is_deterministic() {
        let (arena, root, mid, leaf) = hierarchy();
        let mut builder = RegistryBuilder::new(arena);
        for (i, ty) in [root, mid, leaf, root, mid].iter().enumerate() {
            builder
                .register(
                    HandlerDescriptor::new(*ty, Pass::Depth, format!("h{i}").as_str())
                        .with_path(if i % 2 == 0 {
                            TraversalPath::Ascending
                        } else {
                            TraversalPath::Descending
                        }),
                )
                .unwrap();
        }
        let registry = builder.seal();

        let first = registry.resolve(leaf, Pass::Depth, &QualifierSet::new()).unwrap();
        for _ in 0..5 {
            let again = registry.resolve(leaf, Pass::Depth, &QualifierSet::new()).unwrap();
            assert_eq!(first, again);
        }
    }
}

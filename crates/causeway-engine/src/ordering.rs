//! Total order over handler descriptors matched for one dispatch tier.
//!
//! Sort keys, in priority order:
//! 1. Identical descriptors compare equal (and collapse on dedup).
//! 2. Descending-path handlers before ascending ones.
//! 3. Same declared type: precedence, directionally — ascending path sorts
//!    lower precedence first, descending sorts higher first. On a tie, a
//!    qualifier-bearing descriptor sorts strictly before its tie partner so
//!    it is never dropped from a deduplicating ordered set.
//! 4. Different declared types: the one earlier in the concrete fault
//!    type's closure (more specific) sorts first.

use std::cmp::Ordering;
use std::collections::HashMap;

use causeway_core::error::TypeGraphError;
use causeway_core::handler::{HandlerDescriptor, TraversalPath};
use causeway_core::types::{TypeArena, TypeKey};

/// Comparator for the handler set matched against one concrete fault type.
///
/// Specificity ranking (key 4) depends on the concrete type's closure, so a
/// fresh ordering is built per resolution.
#[derive(Debug)]
pub struct HandlerOrdering {
    rank: HashMap<TypeKey, usize>,
}

impl HandlerOrdering {
    /// Build an ordering from the concrete type's precomputed closure.
    pub fn from_closure(closure: &[TypeKey]) -> Self {
        let rank = closure.iter().enumerate().map(|(i, &k)| (k, i)).collect();
        Self { rank }
    }

    /// Convenience: compute the closure of `concrete` and build an ordering.
    pub fn for_concrete(arena: &TypeArena, concrete: TypeKey) -> Result<Self, TypeGraphError> {
        Ok(Self::from_closure(&arena.closure(concrete)?))
    }

    /// Compare two descriptors from the same matched set.
    pub fn compare(&self, lhs: &HandlerDescriptor, rhs: &HandlerDescriptor) -> Ordering {
        if lhs == rhs {
            return Ordering::Equal;
        }

        if lhs.path != rhs.path {
            return if lhs.path == TraversalPath::Descending {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }

        if lhs.exception_type == rhs.exception_type {
            return self.compare_same_type(lhs, rhs);
        }

        self.compare_specificity(lhs.exception_type, rhs.exception_type, lhs, rhs)
    }

    fn compare_same_type(&self, lhs: &HandlerDescriptor, rhs: &HandlerDescriptor) -> Ordering {
        let by_precedence = match lhs.path {
            TraversalPath::Ascending => lhs.precedence.cmp(&rhs.precedence),
            TraversalPath::Descending => rhs.precedence.cmp(&lhs.precedence),
        };
        if by_precedence != Ordering::Equal {
            return by_precedence;
        }

        // Precedence tie. A qualifier-bearing handler must rank strictly
        // apart from a generic one, or the dedup below the sort would
        // silently drop it.
        match (lhs.qualifiers.is_empty(), rhs.qualifiers.is_empty()) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            _ => lhs
                .qualifiers
                .cmp(&rhs.qualifiers)
                .then_with(|| lhs.handle.cmp(&rhs.handle)),
        }
    }

    fn compare_specificity(
        &self,
        lhs_type: TypeKey,
        rhs_type: TypeKey,
        lhs: &HandlerDescriptor,
        rhs: &HandlerDescriptor,
    ) -> Ordering {
        let lhs_rank = self.rank.get(&lhs_type).copied().unwrap_or(usize::MAX);
        let rhs_rank = self.rank.get(&rhs_type).copied().unwrap_or(usize::MAX);
        lhs_rank
            .cmp(&rhs_rank)
            .then_with(|| lhs.handle.cmp(&rhs.handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::handler::{Pass, QualifierSet};

    fn arena() -> (TypeArena, TypeKey, TypeKey, TypeKey) {
        let mut arena = TypeArena::new();
        let root = arena.insert("Throwable", &[]).unwrap();
        let mid = arena.insert("IoError", &[root]).unwrap();
        let leaf = arena.insert("SocketError", &[mid]).unwrap();
        (arena, root, mid, leaf)
    }

    #[test]
    fn identical_descriptors_compare_equal() {
        let (arena, _, _, leaf) = arena();
        let ordering = HandlerOrdering::for_concrete(&arena, leaf).unwrap();
        let d = HandlerDescriptor::new(leaf, Pass::Breadth, "h");
        assert_eq!(ordering.compare(&d, &d.clone()), Ordering::Equal);
    }

    #[test]
    fn descending_path_sorts_first() {
        let (arena, _, _, leaf) = arena();
        let ordering = HandlerOrdering::for_concrete(&arena, leaf).unwrap();
        let asc = HandlerDescriptor::new(leaf, Pass::Breadth, "asc");
        let desc = HandlerDescriptor::new(leaf, Pass::Breadth, "desc")
            .with_path(TraversalPath::Descending);
        assert_eq!(ordering.compare(&desc, &asc), Ordering::Less);
        assert_eq!(ordering.compare(&asc, &desc), Ordering::Greater);
    }

    #[test]
    fn ascending_precedence_lower_first() {
        let (arena, _, _, leaf) = arena();
        let ordering = HandlerOrdering::for_concrete(&arena, leaf).unwrap();
        let low = HandlerDescriptor::new(leaf, Pass::Breadth, "low").with_precedence(-5);
        let high = HandlerDescriptor::new(leaf, Pass::Breadth, "high").with_precedence(5);
        assert_eq!(ordering.compare(&low, &high), Ordering::Less);
    }

    #[test]
    fn descending_precedence_higher_first() {
        let (arena, _, _, leaf) = arena();
        let ordering = HandlerOrdering::for_concrete(&arena, leaf).unwrap();
        let low = HandlerDescriptor::new(leaf, Pass::Breadth, "low")
            .with_precedence(-5)
            .with_path(TraversalPath::Descending);
        let high = HandlerDescriptor::new(leaf, Pass::Breadth, "high")
            .with_precedence(5)
            .with_path(TraversalPath::Descending);
        assert_eq!(ordering.compare(&high, &low), Ordering::Less);
    }

    #[test]
    fn qualifier_bearing_wins_precedence_tie() {
        let (arena, _, _, leaf) = arena();
        let ordering = HandlerOrdering::for_concrete(&arena, leaf).unwrap();
        let generic = HandlerDescriptor::new(leaf, Pass::Breadth, "generic");
        let qualified = HandlerDescriptor::new(leaf, Pass::Breadth, "qualified")
            .with_qualifiers(["db"].into_iter().collect::<QualifierSet>());
        assert_eq!(ordering.compare(&qualified, &generic), Ordering::Less);
        assert_eq!(ordering.compare(&generic, &qualified), Ordering::Greater);
    }

    #[test]
    fn distinct_tied_handlers_never_compare_equal() {
        let (arena, _, _, leaf) = arena();
        let ordering = HandlerOrdering::for_concrete(&arena, leaf).unwrap();
        let a = HandlerDescriptor::new(leaf, Pass::Breadth, "a");
        let b = HandlerDescriptor::new(leaf, Pass::Breadth, "b");
        assert_ne!(ordering.compare(&a, &b), Ordering::Equal);
        // Antisymmetric.
        assert_eq!(ordering.compare(&a, &b), ordering.compare(&b, &a).reverse());
    }

    #[test]
    fn more_specific_type_sorts_first() {
        let (arena, root, mid, leaf) = arena();
        let ordering = HandlerOrdering::for_concrete(&arena, leaf).unwrap();
        let on_root = HandlerDescriptor::new(root, Pass::Breadth, "root");
        let on_mid = HandlerDescriptor::new(mid, Pass::Breadth, "mid");
        let on_leaf = HandlerDescriptor::new(leaf, Pass::Breadth, "leaf");
        assert_eq!(ordering.compare(&on_leaf, &on_mid), Ordering::Less);
        assert_eq!(ordering.compare(&on_mid, &on_root), Ordering::Less);
        assert_eq!(ordering.compare(&on_root, &on_leaf), Ordering::Greater);
    }
}

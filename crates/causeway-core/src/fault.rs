//! Faults and the cause chain one dispatch call walks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::TypeKey;

/// A raised error object: a type in the fault graph, a message, and an
/// optional causing fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    /// The fault's concrete type.
    pub type_key: TypeKey,
    /// Human-readable description.
    pub message: String,
    /// The fault this one wraps, if any.
    pub cause: Option<Box<Fault>>,
}

impl Fault {
    pub fn new(type_key: TypeKey, message: impl Into<String>) -> Self {
        Self {
            type_key,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a causing fault, consuming and returning `self`.
    pub fn caused_by(mut self, cause: Fault) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn cause(&self) -> Option<&Fault> {
        self.cause.as_deref()
    }

    /// The innermost fault in the cause chain (`self` if there is none).
    pub fn root_cause(&self) -> &Fault {
        let mut current = self;
        while let Some(next) = current.cause() {
            current = next;
        }
        current
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(cause) = self.cause() {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

/// The ordered sequence of causally-linked faults derived from one raised
/// fault, outermost first, with a forward-only cursor.
///
/// Built once per dispatch call and advanced only by the engine; once the
/// sequence is exhausted [`current`](Self::current) stays `None`.
#[derive(Debug)]
pub struct CauseChain<'a> {
    causes: Vec<&'a Fault>,
    cursor: usize,
}

impl<'a> CauseChain<'a> {
    /// Flatten the raised fault's cause links, outermost to root.
    pub fn new(raised: &'a Fault) -> Self {
        let mut causes = Vec::new();
        let mut current = Some(raised);
        while let Some(fault) = current {
            causes.push(fault);
            current = fault.cause();
        }
        Self { causes, cursor: 0 }
    }

    /// The fault under the cursor, or `None` once the chain is exhausted.
    pub fn current(&self) -> Option<&'a Fault> {
        self.causes.get(self.cursor).copied()
    }

    /// Move the cursor one step toward the root cause. The cursor never
    /// moves backward.
    pub fn advance(&mut self) {
        if self.cursor < self.causes.len() {
            self.cursor += 1;
        }
    }

    /// Zero-based cursor position.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Total number of faults in the chain.
    pub fn len(&self) -> usize {
        self.causes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.causes.len()
    }

    /// The originally raised (outermost) fault.
    pub fn outermost(&self) -> &'a Fault {
        self.causes[0]
    }

    /// All faults, outermost first.
    pub fn faults(&self) -> &[&'a Fault] {
        &self.causes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeArena;

    fn three_deep() -> (TypeArena, Fault) {
        let mut arena = TypeArena::new();
        let root = arena.insert("Throwable", &[]).unwrap();
        let mid = arena.insert("WrapperError", &[root]).unwrap();
        let outer = arena.insert("FacadeError", &[root]).unwrap();
        let fault = Fault::new(outer, "facade")
            .caused_by(Fault::new(mid, "wrapper").caused_by(Fault::new(root, "root")));
        (arena, fault)
    }

    #[test]
    fn chain_flattens_outermost_first() {
        let (_, fault) = three_deep();
        let chain = CauseChain::new(&fault);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.outermost().message, "facade");
        assert_eq!(chain.faults()[2].message, "root");
    }

    #[test]
    fn cursor_moves_forward_only_and_exhausts() {
        let (_, fault) = three_deep();
        let mut chain = CauseChain::new(&fault);
        assert_eq!(chain.current().unwrap().message, "facade");
        chain.advance();
        assert_eq!(chain.current().unwrap().message, "wrapper");
        chain.advance();
        chain.advance();
        assert!(chain.is_exhausted());
        assert!(chain.current().is_none());
        // Advancing past the end stays exhausted.
        chain.advance();
        assert!(chain.current().is_none());
        assert_eq!(chain.position(), 3);
    }

    #[test]
    fn root_cause_walks_to_innermost() {
        let (_, fault) = three_deep();
        assert_eq!(fault.root_cause().message, "root");
    }
}

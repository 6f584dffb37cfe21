//! The invocation seam between the dispatch engine and whatever owns the
//! handler bodies.

use std::collections::HashMap;

use causeway_core::event::ExceptionEvent;
use causeway_core::handler::{HandlerDescriptor, HandlerId, Outcome};
use causeway_core::RegistryError;

/// Executes handler bodies on behalf of the engine.
///
/// The engine never constructs or locates handler owners itself; an
/// implementation of this trait is injected at engine construction. A
/// handler body cannot return a failure — the signature admits only an
/// [`Outcome`] — so "handler declares checked failures" is unrepresentable.
/// A panic inside a body propagates out of dispatch uncaught.
///
/// Implementations must be `Send + Sync`; independent dispatch calls may
/// run concurrently on separate threads.
pub trait HandlerInvoker: Send + Sync {
    /// Whether this invoker can service the given invocation handle.
    /// Checked once per registered descriptor when the engine is built.
    fn supports(&self, handle: &HandlerId) -> bool;

    /// Run the handler body named by `descriptor.handle` against `event`
    /// and return its control directive.
    fn invoke(&self, descriptor: &HandlerDescriptor, event: &mut ExceptionEvent<'_>) -> Outcome;
}

type HandlerFn = dyn Fn(&HandlerDescriptor, &mut ExceptionEvent<'_>) -> Outcome + Send + Sync;

/// Invoker backed by a table of closures keyed by invocation handle.
#[derive(Default)]
pub struct FnInvoker {
    table: HashMap<HandlerId, Box<HandlerFn>>,
}

impl FnInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler body under a handle.
    pub fn register<F>(&mut self, handle: impl Into<HandlerId>, body: F) -> Result<(), RegistryError>
    where
        F: Fn(&HandlerDescriptor, &mut ExceptionEvent<'_>) -> Outcome + Send + Sync + 'static,
    {
        let handle = handle.into();
        if self.table.contains_key(&handle) {
            return Err(RegistryError::DuplicateHandler {
                handle: handle.to_string(),
            });
        }
        self.table.insert(handle, Box::new(body));
        Ok(())
    }

    /// Register a body that ignores its event and always returns `outcome`.
    pub fn register_scripted(
        &mut self,
        handle: impl Into<HandlerId>,
        outcome: Outcome,
    ) -> Result<(), RegistryError> {
        self.register(handle, move |_, _| outcome.clone())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl HandlerInvoker for FnInvoker {
    fn supports(&self, handle: &HandlerId) -> bool {
        self.table.contains_key(handle)
    }

    fn invoke(&self, descriptor: &HandlerDescriptor, event: &mut ExceptionEvent<'_>) -> Outcome {
        match self.table.get(&descriptor.handle) {
            Some(body) => body(descriptor, event),
            // Unreachable when the engine validated `supports` at build
            // time; a direct caller bypassing that gets the panic the
            // uncaught-failure contract promises.
            None => panic!("no handler body registered for '{}'", descriptor.handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::fault::{CauseChain, Fault};
    use causeway_core::handler::Pass;
    use causeway_core::types::TypeArena;
    use causeway_core::HandlerChain;

    #[test]
    fn duplicate_body_registration_fails() {
        let mut invoker = FnInvoker::new();
        invoker.register_scripted("h", Outcome::Handled).unwrap();
        let result = invoker.register_scripted("h", Outcome::Abort);
        assert!(matches!(result, Err(RegistryError::DuplicateHandler { .. })));
    }

    #[test]
    fn scripted_body_returns_its_outcome() {
        let mut arena = TypeArena::new();
        let root = arena.insert("Throwable", &[]).unwrap();
        let mut invoker = FnInvoker::new();
        invoker.register_scripted("h", Outcome::MarkHandled).unwrap();

        let descriptor = HandlerDescriptor::new(root, Pass::Breadth, "h");
        assert!(invoker.supports(&descriptor.handle));

        let fault = Fault::new(root, "boom");
        let chain = CauseChain::new(&fault);
        let tier = HandlerChain::new();
        let mut event = ExceptionEvent::new(&fault, &chain, Pass::Breadth, false, &tier);
        assert_eq!(invoker.invoke(&descriptor, &mut event), Outcome::MarkHandled);
    }
}

//! The dispatch state machine.
//!
//! For each cause, outermost to root: run the breadth tier, then the depth
//! tier (in reversed resolution order, so category-level depth handlers run
//! last). Interpret each handler's outcome; when the chain is exhausted
//! without a terminating outcome, resolve to the recorded raise intent.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use causeway_core::error::{RegistryError, TypeGraphError};
use causeway_core::event::{ExceptionEvent, HandlerChain};
use causeway_core::fault::{CauseChain, Fault};
use causeway_core::handler::{Outcome, Pass, QualifierSet};

use crate::invoker::HandlerInvoker;
use crate::registry::HandlerRegistry;

/// Terminal result of one dispatch call.
///
/// Returned as a plain value; the hosting runtime decides whether to
/// actually re-raise or propagate anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DispatchResult {
    /// Dispatch ran to a stop without a raise intent. `handled` is false
    /// when termination came from an abort (or no handler marked the
    /// exception handled).
    Suppressed { handled: bool },
    /// Re-raise the originally raised fault.
    RethrowOriginal,
    /// Raise this fault instead of the original.
    RaiseReplacement(Fault),
}

/// Pending raise intent; the last one recorded wins at chain exhaustion.
enum RaiseIntent {
    Rethrow,
    Replace(Fault),
}

/// The exception entry point: resolves, orders, and invokes handlers
/// against a raised fault's cause chain.
///
/// One engine serves many dispatch calls; the sealed registry makes
/// concurrent calls on separate threads safe. A single dispatch call is
/// strictly sequential.
pub struct DispatchEngine {
    registry: HandlerRegistry,
    invoker: Arc<dyn HandlerInvoker>,
}

impl DispatchEngine {
    /// Assemble an engine, verifying every registered descriptor has an
    /// invocation target. A miss is a configuration error surfaced here,
    /// never at dispatch time.
    pub fn new(
        registry: HandlerRegistry,
        invoker: Arc<dyn HandlerInvoker>,
    ) -> Result<Self, RegistryError> {
        for descriptor in registry.descriptors() {
            if !invoker.supports(&descriptor.handle) {
                return Err(RegistryError::MissingInvocationTarget {
                    handle: descriptor.handle.to_string(),
                });
            }
        }
        Ok(Self { registry, invoker })
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatch one raised fault against the registered handlers.
    ///
    /// Fails only if a fault in the chain carries a type key foreign to
    /// the registry's arena.
    pub fn dispatch(
        &self,
        raised: &Fault,
        qualifiers: &QualifierSet,
    ) -> Result<DispatchResult, TypeGraphError> {
        let mut chain = CauseChain::new(raised);
        let mut processed = HashSet::new();
        let mut handled = false;
        let mut intent: Option<RaiseIntent> = None;

        debug!(causes = chain.len(), "dispatch started");

        'causes: while let Some(cause) = chain.current() {
            for pass in [Pass::Breadth, Pass::Depth] {
                let mut resolved = self.registry.resolve(cause.type_key, pass, qualifiers)?;
                if pass == Pass::Depth {
                    // Category handlers sort later under ascending
                    // specificity; in the unwind orientation they must run
                    // last, so most-specific depth handlers act first.
                    resolved.reverse();
                }

                let tier = HandlerChain::new();
                for descriptor in &resolved {
                    if processed.contains(descriptor) {
                        continue;
                    }

                    let (outcome, unmuted) = {
                        let mut event =
                            ExceptionEvent::new(cause, &chain, pass, handled, &tier);
                        let outcome = self.invoker.invoke(descriptor, &mut event);
                        (outcome, event.is_unmuted())
                    };
                    if !unmuted {
                        processed.insert(descriptor.clone());
                    }
                    trace!(handle = %descriptor.handle, ?outcome, %pass, "handler returned");

                    match outcome {
                        Outcome::Handled => {
                            debug!(handle = %descriptor.handle, "dispatch suppressed");
                            return Ok(DispatchResult::Suppressed { handled: true });
                        }
                        Outcome::MarkHandled => handled = true,
                        Outcome::Abort => {
                            debug!(handle = %descriptor.handle, "dispatch aborted");
                            return Ok(DispatchResult::Suppressed { handled });
                        }
                        Outcome::DropCause => {
                            handled = true;
                            chain.advance();
                            continue 'causes;
                        }
                        Outcome::Rethrow => intent = Some(RaiseIntent::Rethrow),
                        Outcome::Throw(replacement) => {
                            intent = Some(RaiseIntent::Replace(replacement));
                        }
                    }

                    if tier.is_ended() {
                        trace!(%pass, "tier short-circuited");
                        break;
                    }
                }
            }
            chain.advance();
        }

        let result = match intent {
            None => DispatchResult::Suppressed { handled },
            Some(RaiseIntent::Rethrow) => DispatchResult::RethrowOriginal,
            Some(RaiseIntent::Replace(fault)) => DispatchResult::RaiseReplacement(fault),
        };
        debug!(?result, "dispatch finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::FnInvoker;
    use crate::registry::RegistryBuilder;
    use causeway_core::handler::HandlerDescriptor;
    use causeway_core::types::TypeArena;

    fn single_type() -> (Arc<TypeArena>, causeway_core::TypeKey) {
        let mut arena = TypeArena::new();
        let root = arena.insert("Throwable", &[]).unwrap();
        (Arc::new(arena), root)
    }

    #[test]
    fn empty_registry_suppresses_unhandled() {
        let (arena, root) = single_type();
        let registry = RegistryBuilder::new(arena).seal();
        let engine = DispatchEngine::new(registry, Arc::new(FnInvoker::new())).unwrap();

        let result = engine
            .dispatch(&Fault::new(root, "boom"), &QualifierSet::new())
            .unwrap();
        assert_eq!(result, DispatchResult::Suppressed { handled: false });
    }

    #[test]
    fn missing_invocation_target_is_a_construction_error() {
        let (arena, root) = single_type();
        let mut builder = RegistryBuilder::new(arena);
        builder
            .register(HandlerDescriptor::new(root, Pass::Breadth, "ghost"))
            .unwrap();
        let result = DispatchEngine::new(builder.seal(), Arc::new(FnInvoker::new()));
        assert!(matches!(
            result,
            Err(RegistryError::MissingInvocationTarget { .. })
        ));
    }

    #[test]
    fn foreign_type_key_fails_dispatch() {
        let (arena, _) = single_type();
        let registry = RegistryBuilder::new(arena).seal();
        let engine = DispatchEngine::new(registry, Arc::new(FnInvoker::new())).unwrap();

        let mut other = TypeArena::new();
        for i in 0..5 {
            other.insert(&format!("T{i}"), &[]).unwrap();
        }
        let foreign = other.key("T4").unwrap();
        let result = engine.dispatch(&Fault::new(foreign, "boom"), &QualifierSet::new());
        assert!(matches!(result, Err(TypeGraphError::UnknownKey { .. })));
    }
}

//! The per-invocation view handed to a handler, and the per-tier
//! short-circuit flag.

use std::cell::Cell;

use crate::fault::{CauseChain, Fault};
use crate::handler::Pass;

/// Per-tier stop flag, default "continue".
///
/// One chain exists per (cause, pass) tier; every handler invoked in that
/// tier sees the same one. [`end`](Self::end) is irreversible for the tier:
/// the engine reads it once after each invocation and stops iterating the
/// tier, independent of the invocation's returned outcome. The rest of the
/// dispatch (later passes, later causes) is unaffected.
#[derive(Debug, Default)]
pub struct HandlerChain {
    ended: Cell<bool>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop invoking the remaining handlers of the current tier.
    pub fn end(&self) {
        self.ended.set(true);
    }

    pub fn is_ended(&self) -> bool {
        self.ended.get()
    }
}

/// Everything a handler can see and touch during one invocation.
///
/// Created fresh per handler invocation, owned by the engine for its
/// duration, and discarded after the handler returns.
#[derive(Debug)]
pub struct ExceptionEvent<'a> {
    fault: &'a Fault,
    chain: &'a CauseChain<'a>,
    pass: Pass,
    handled: bool,
    unmute: bool,
    tier: &'a HandlerChain,
}

impl<'a> ExceptionEvent<'a> {
    pub fn new(
        fault: &'a Fault,
        chain: &'a CauseChain<'a>,
        pass: Pass,
        handled: bool,
        tier: &'a HandlerChain,
    ) -> Self {
        Self {
            fault,
            chain,
            pass,
            handled,
            unmute: false,
            tier,
        }
    }

    /// The cause currently under dispatch.
    pub fn fault(&self) -> &'a Fault {
        self.fault
    }

    /// Read access to the full cause chain and its cursor.
    pub fn cause_chain(&self) -> &CauseChain<'a> {
        self.chain
    }

    /// Which tier is invoking this handler.
    pub fn pass(&self) -> Pass {
        self.pass
    }

    pub fn is_breadth(&self) -> bool {
        self.pass == Pass::Breadth
    }

    /// Whether an earlier handler already marked the exception handled.
    pub fn is_marked_handled(&self) -> bool {
        self.handled
    }

    /// Keep this handler eligible for future invocations within the same
    /// dispatch call, instead of being retired after this one.
    pub fn unmute(&mut self) {
        self.unmute = true;
    }

    pub fn is_unmuted(&self) -> bool {
        self.unmute
    }

    /// The current tier's short-circuit flag.
    pub fn handler_chain(&self) -> &HandlerChain {
        self.tier
    }
}

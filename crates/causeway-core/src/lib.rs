//! causeway-core — foundation types for the Causeway exception routing engine.
//!
//! This crate defines:
//! - [`TypeArena`] / [`TypeKey`] — the fault type graph and hierarchy closure
//! - [`Fault`] / [`CauseChain`] — causally-linked errors and the dispatch cursor
//! - [`HandlerDescriptor`] — the immutable record describing one registered handler
//! - [`Outcome`] — the control directives a handler returns
//! - [`ExceptionEvent`] / [`HandlerChain`] — the per-invocation handler view
//! - [`TypeGraphError`] / [`RegistryError`] — the configuration error taxonomy

pub mod error;
pub mod event;
pub mod fault;
pub mod handler;
pub mod types;

pub use error::{RegistryError, TypeGraphError};
pub use event::{ExceptionEvent, HandlerChain};
pub use fault::{CauseChain, Fault};
pub use handler::{
    HandlerDescriptor, HandlerId, Outcome, Pass, Qualifier, QualifierSet, TraversalPath,
};
pub use types::{TypeArena, TypeEntry, TypeKey};

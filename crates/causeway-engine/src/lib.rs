//! causeway-engine — handler resolution, ordering, and dispatch.
//!
//! The pieces, leaf-first:
//! - [`HandlerOrdering`] — total order over matched descriptors
//! - [`RegistryBuilder`] / [`HandlerRegistry`] — two-phase handler registry
//! - [`HandlerInvoker`] / [`FnInvoker`] — the handler-body invocation seam
//! - [`DispatchEngine`] / [`DispatchResult`] — the dispatch state machine
//!
//! # Usage
//! ```rust
//! use std::sync::Arc;
//! use causeway_core::{Fault, HandlerDescriptor, Outcome, Pass, QualifierSet, TypeArena};
//! use causeway_engine::{DispatchEngine, DispatchResult, FnInvoker, RegistryBuilder};
//!
//! let mut arena = TypeArena::new();
//! let throwable = arena.insert("Throwable", &[]).unwrap();
//! let db_error = arena.insert("DatabaseError", &[throwable]).unwrap();
//!
//! let mut registry = RegistryBuilder::new(Arc::new(arena));
//! registry
//!     .register(HandlerDescriptor::new(db_error, Pass::Breadth, "log-db"))
//!     .unwrap();
//!
//! let mut invoker = FnInvoker::new();
//! invoker.register_scripted("log-db", Outcome::Handled).unwrap();
//!
//! let engine = DispatchEngine::new(registry.seal(), Arc::new(invoker)).unwrap();
//! let result = engine
//!     .dispatch(&Fault::new(db_error, "connection refused"), &QualifierSet::new())
//!     .unwrap();
//! assert_eq!(result, DispatchResult::Suppressed { handled: true });
//! ```

pub mod engine;
pub mod invoker;
pub mod ordering;
pub mod registry;

pub use engine::{DispatchEngine, DispatchResult};
pub use invoker::{FnInvoker, HandlerInvoker};
pub use ordering::HandlerOrdering;
pub use registry::{HandlerRegistry, RegistryBuilder};

//! Error types for the Causeway routing core.

use thiserror::Error;

/// Errors from building or querying the fault type graph.
#[derive(Debug, Error)]
pub enum TypeGraphError {
    #[error("Type '{name}' is already registered")]
    DuplicateType { name: String },

    #[error("Type key {key} is not in this arena")]
    UnknownKey { key: u32 },
}

/// Errors surfaced while registering handlers or assembling the engine.
///
/// All of these are configuration errors reported before the first
/// dispatch; the dispatch loop itself never produces them.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Handler '{handle}' is already registered")]
    DuplicateHandler { handle: String },

    #[error("Handler '{handle}' declares exception type key {key} which is not in the arena")]
    UnknownExceptionType { handle: String, key: u32 },

    #[error("Handler '{handle}' has no invocation target in the supplied invoker")]
    MissingInvocationTarget { handle: String },

    #[error("Type graph error: {0}")]
    TypeGraph(#[from] TypeGraphError),
}

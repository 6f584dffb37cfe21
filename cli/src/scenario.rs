//! Declarative JSON scenario: a type graph, a handler table with scripted
//! outcomes, and a raised fault, all referencing types by name.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use causeway_core::{
    Fault, HandlerDescriptor, Outcome, Pass, Qualifier, QualifierSet, TraversalPath, TypeArena,
    TypeKey,
};
use causeway_engine::{DispatchEngine, FnInvoker, RegistryBuilder};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Types in insertion order; parents must be declared first.
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub handlers: Vec<HandlerDef>,
    pub raised: FaultDef,
    /// Caller-supplied qualifier tags for the dispatch request.
    #[serde(default)]
    pub qualifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HandlerDef {
    pub id: String,
    pub exception_type: String,
    #[serde(default)]
    pub qualifiers: Vec<String>,
    #[serde(default)]
    pub precedence: i32,
    pub pass: Pass,
    #[serde(default = "default_path")]
    pub path: TraversalPath,
    pub outcome: OutcomeDef,
}

fn default_path() -> TraversalPath {
    TraversalPath::Ascending
}

/// Scripted outcome, with any replacement fault given by type name.
#[derive(Debug, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum OutcomeDef {
    Handled,
    MarkHandled,
    Abort,
    DropCause,
    Rethrow,
    Throw { fault: FaultDef },
}

#[derive(Debug, Deserialize)]
pub struct FaultDef {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub message: String,
    pub cause: Option<Box<FaultDef>>,
}

/// A scenario wired into a runnable engine.
pub struct Assembled {
    pub arena: Arc<TypeArena>,
    pub engine: DispatchEngine,
    pub raised: Fault,
    pub qualifiers: QualifierSet,
    /// Invocation trace filled during dispatch: "handle (pass)".
    pub trace: Arc<Mutex<Vec<String>>>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid scenario JSON")
    }

    pub fn assemble(&self) -> Result<Assembled> {
        let mut arena = TypeArena::new();
        for def in &self.types {
            let mut parents = Vec::with_capacity(def.parents.len());
            for parent in &def.parents {
                parents.push(lookup(&arena, parent)?);
            }
            arena
                .insert(&def.name, &parents)
                .with_context(|| format!("registering type '{}'", def.name))?;
        }
        let arena = Arc::new(arena);

        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut builder = RegistryBuilder::new(arena.clone());
        let mut invoker = FnInvoker::new();
        for def in &self.handlers {
            let exception_type = lookup(&arena, &def.exception_type)?;
            let descriptor = HandlerDescriptor::new(exception_type, def.pass, def.id.as_str())
                .with_qualifiers(qualifier_set(&def.qualifiers))
                .with_precedence(def.precedence)
                .with_path(def.path);
            builder
                .register(descriptor)
                .with_context(|| format!("registering handler '{}'", def.id))?;

            let outcome = self.outcome(&arena, &def.outcome)?;
            let trace = trace.clone();
            invoker
                .register(def.id.as_str(), move |descriptor, event| {
                    trace
                        .lock()
                        .unwrap()
                        .push(format!("{} ({})", descriptor.handle, event.pass()));
                    outcome.clone()
                })
                .with_context(|| format!("registering handler body '{}'", def.id))?;
        }

        let raised = fault(&arena, &self.raised)?;
        let engine = DispatchEngine::new(builder.seal(), Arc::new(invoker))
            .context("assembling dispatch engine")?;

        Ok(Assembled {
            arena,
            engine,
            raised,
            qualifiers: qualifier_set(&self.qualifiers),
            trace,
        })
    }

    fn outcome(&self, arena: &TypeArena, def: &OutcomeDef) -> Result<Outcome> {
        Ok(match def {
            OutcomeDef::Handled => Outcome::Handled,
            OutcomeDef::MarkHandled => Outcome::MarkHandled,
            OutcomeDef::Abort => Outcome::Abort,
            OutcomeDef::DropCause => Outcome::DropCause,
            OutcomeDef::Rethrow => Outcome::Rethrow,
            OutcomeDef::Throw { fault: def } => Outcome::Throw(fault(arena, def)?),
        })
    }
}

fn lookup(arena: &TypeArena, name: &str) -> Result<TypeKey> {
    match arena.key(name) {
        Some(key) => Ok(key),
        None => bail!("unknown type '{name}' (types must be declared before use)"),
    }
}

fn qualifier_set(tags: &[String]) -> QualifierSet {
    tags.iter().map(|t| Qualifier::new(t.clone())).collect()
}

fn fault(arena: &TypeArena, def: &FaultDef) -> Result<Fault> {
    let mut built = Fault::new(lookup(arena, &def.type_name)?, def.message.clone());
    if let Some(cause) = &def.cause {
        built = built.caused_by(fault(arena, cause)?);
    }
    Ok(built)
}

//! Workflow execution runtime
//!
//! This crate compiles action graphs into plans, resolves join thresholds,
//! and walks the plan with concurrent branches, synchronising them at joins.

pub mod combinators;
mod executor;
mod joins;
mod plan;
mod registry;
mod resolver;
mod runtime;

pub use executor::{ExecutionResult, WorkflowExecutor};
pub use joins::{Arrival, FiredJoin, JoinTable};
pub use plan::{Plan, Step, StepId, StepKind};
pub use registry::{ActionHandler, Cardinality, HandlerMetadata, HandlerRegistry};
pub use resolver::JoinSpec;
pub use runtime::{ExecutionHandle, PdfRuntime, RuntimeConfig};

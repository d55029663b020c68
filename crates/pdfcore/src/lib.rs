//! Core abstractions for the PDF workflow engine
//!
//! This crate provides the action graph model, the artifact type, the error
//! taxonomy, execution events and the provider contract every other crate
//! builds on. It contains no execution logic.

mod branch;
mod error;
mod events;
mod file;
mod operations;
mod values;
mod workflow;

pub use branch::BranchPath;
pub use error::{FlowError, OperationError, WorkflowError};
pub use events::{EventBus, EventEmitter, ExecutionEvent, ExecutionId};
pub use file::{file_names, PdfFile};
pub use operations::{MetadataUpdate, PdfOperations};
pub use values::Values;
pub use workflow::{Action, ActionType, InputMode, Workflow, WorkflowId, WorkflowSettings};

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;

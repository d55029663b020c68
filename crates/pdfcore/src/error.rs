use crate::ActionType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// A provider transform rejected; the provider's error is kept as-is.
    #[error("{action_type} failed: {source}")]
    Operation {
        action_type: ActionType,
        #[source]
        source: OperationError,
    },

    #[error("Joins never fired: {}", .0.join(", "))]
    OrphanedJoins(Vec<String>),

    #[error("Execution cancelled")]
    Cancelled,

    #[error("Execution timed out after {ms}ms")]
    TimedOut { ms: u64 },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("Missing required value: {0}")]
    MissingValue(String),

    #[error("Invalid value for '{field}': expected {expected}, got {actual}")]
    InvalidValue {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Operation failed: {0}")]
    Failed(String),

    #[error("Cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Unrecognized action type: {0}")]
    UnrecognizedActionType(String),

    #[error("No handler registered for action type: {0}")]
    MissingHandler(ActionType),

    #[error("Wait node references join '{0}' but no done node defines it")]
    UnresolvedJoinReference(String),

    #[error("Join '{0}' is defined by more than one done node")]
    DuplicateJoinDefinition(String),

    #[error("Wait node has no join id")]
    MissingJoinId,

    #[error("Invalid values for {action_type}: {source}")]
    InvalidValues {
        action_type: ActionType,
        #[source]
        source: OperationError,
    },

    #[error("Cyclic dependency between joins: {}", .0.join(" -> "))]
    CyclicJoinDependency(Vec<String>),

    #[error("Invalid workflow: {0}")]
    Invalid(String),
}

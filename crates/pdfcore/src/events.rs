use crate::{ActionType, BranchPath, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub type ExecutionId = Uuid;

/// Events emitted during workflow execution.
///
/// Purely observational: nothing in the executor waits on a subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    ExecutionStarted {
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        inputs: usize,
        timestamp: DateTime<Utc>,
    },
    /// Emitted immediately before a node runs
    NodeStarting {
        execution_id: ExecutionId,
        action_type: ActionType,
        branch: BranchPath,
        timestamp: DateTime<Utc>,
    },
    NodeCompleted {
        execution_id: ExecutionId,
        action_type: ActionType,
        branch: BranchPath,
        outputs: Vec<String>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    NodeFailed {
        execution_id: ExecutionId,
        action_type: ActionType,
        branch: BranchPath,
        error: String,
        timestamp: DateTime<Utc>,
    },
    JoinArrived {
        execution_id: ExecutionId,
        join: String,
        branch: BranchPath,
        remaining: usize,
        timestamp: DateTime<Utc>,
    },
    JoinFired {
        execution_id: ExecutionId,
        join: String,
        artifacts: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    ExecutionCompleted {
        execution_id: ExecutionId,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    pub fn execution_id(&self) -> ExecutionId {
        match self {
            ExecutionEvent::ExecutionStarted { execution_id, .. }
            | ExecutionEvent::NodeStarting { execution_id, .. }
            | ExecutionEvent::NodeCompleted { execution_id, .. }
            | ExecutionEvent::NodeFailed { execution_id, .. }
            | ExecutionEvent::JoinArrived { execution_id, .. }
            | ExecutionEvent::JoinFired { execution_id, .. }
            | ExecutionEvent::ExecutionCompleted { execution_id, .. } => *execution_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionEvent::ExecutionCompleted { .. })
    }
}

/// Event emitter bound to a single execution
#[derive(Clone)]
pub struct EventEmitter {
    execution_id: ExecutionId,
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventEmitter {
    pub fn new(execution_id: ExecutionId, sender: broadcast::Sender<ExecutionEvent>) -> Self {
        Self {
            execution_id,
            sender,
        }
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }

    pub fn node_starting(&self, action_type: ActionType, branch: &BranchPath) {
        self.emit(ExecutionEvent::NodeStarting {
            execution_id: self.execution_id,
            action_type,
            branch: branch.clone(),
            timestamp: Utc::now(),
        });
    }

    pub fn node_completed(
        &self,
        action_type: ActionType,
        branch: &BranchPath,
        outputs: Vec<String>,
        duration_ms: u64,
    ) {
        self.emit(ExecutionEvent::NodeCompleted {
            execution_id: self.execution_id,
            action_type,
            branch: branch.clone(),
            outputs,
            duration_ms,
            timestamp: Utc::now(),
        });
    }

    pub fn node_failed(&self, action_type: ActionType, branch: &BranchPath, error: impl Into<String>) {
        self.emit(ExecutionEvent::NodeFailed {
            execution_id: self.execution_id,
            action_type,
            branch: branch.clone(),
            error: error.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn join_arrived(&self, join: &str, branch: &BranchPath, remaining: usize) {
        self.emit(ExecutionEvent::JoinArrived {
            execution_id: self.execution_id,
            join: join.to_string(),
            branch: branch.clone(),
            remaining,
            timestamp: Utc::now(),
        });
    }

    pub fn join_fired(&self, join: &str, artifacts: Vec<String>) {
        self.emit(ExecutionEvent::JoinFired {
            execution_id: self.execution_id,
            join: join.to_string(),
            artifacts,
            timestamp: Utc::now(),
        });
    }
}

/// Global event bus
pub struct EventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }

    pub fn create_emitter(&self, execution_id: ExecutionId) -> EventEmitter {
        EventEmitter::new(execution_id, self.sender.clone())
    }
}

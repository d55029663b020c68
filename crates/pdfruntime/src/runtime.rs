use crate::{registry::HandlerRegistry, ExecutionResult, WorkflowExecutor};
use pdfcore::{EventBus, ExecutionEvent, ExecutionId, FlowError, PdfFile, Workflow};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Main runtime for executing workflows
pub struct PdfRuntime {
    registry: Arc<HandlerRegistry>,
    executor: Arc<WorkflowExecutor>,
    event_bus: Arc<EventBus>,
}

impl PdfRuntime {
    /// Create a runtime with no action handlers registered
    pub fn new() -> Self {
        Self::with_registry(Arc::new(HandlerRegistry::new()), RuntimeConfig::default())
    }

    /// Create a new runtime with a pre-configured registry
    pub fn with_registry(registry: Arc<HandlerRegistry>, config: RuntimeConfig) -> Self {
        let executor = WorkflowExecutor::new(config.max_parallel_branches)
            .with_default_timeout(config.default_timeout_ms.map(Duration::from_millis));
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));

        Self {
            registry,
            executor: Arc::new(executor),
            event_bus,
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Execute a workflow to completion
    pub async fn execute(
        &self,
        workflow: &Workflow,
        inputs: Vec<PdfFile>,
    ) -> Result<ExecutionResult, FlowError> {
        let emitter = self.event_bus.create_emitter(ExecutionId::new_v4());
        self.executor
            .execute(workflow, &self.registry, emitter, CancellationToken::new(), inputs)
            .await
    }

    /// Start a workflow in the background. The returned handle streams that
    /// execution's events and delivers its result separately.
    pub fn spawn(&self, workflow: Workflow, inputs: Vec<PdfFile>) -> ExecutionHandle {
        let execution_id = ExecutionId::new_v4();
        let cancellation = CancellationToken::new();
        // subscribe before starting so no event is missed
        let events = self.event_bus.subscribe();

        let emitter = self.event_bus.create_emitter(execution_id);
        let registry = Arc::clone(&self.registry);
        let executor = Arc::clone(&self.executor);
        let token = cancellation.clone();
        let completion = tokio::spawn(async move {
            executor
                .execute(&workflow, &registry, emitter, token, inputs)
                .await
        });

        ExecutionHandle {
            execution_id,
            events,
            finished: false,
            cancellation,
            completion,
        }
    }

    /// Subscribe to events from every execution
    pub fn subscribe_events(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for PdfRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for monitoring and controlling a spawned execution
pub struct ExecutionHandle {
    pub execution_id: ExecutionId,
    events: broadcast::Receiver<ExecutionEvent>,
    finished: bool,
    cancellation: CancellationToken,
    completion: JoinHandle<Result<ExecutionResult, FlowError>>,
}

impl ExecutionHandle {
    /// Next event of this execution; `None` once `ExecutionCompleted` has
    /// been delivered or the bus is gone
    pub async fn next_event(&mut self) -> Option<ExecutionEvent> {
        if self.finished {
            return None;
        }

        loop {
            match self.events.recv().await {
                Ok(event) if event.execution_id() == self.execution_id => {
                    self.finished = event.is_terminal();
                    return Some(event);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Progress stream lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    /// Stop scheduling new branches and abandon in-flight transforms
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Wait for the execution to finish
    pub async fn wait(self) -> Result<ExecutionResult, FlowError> {
        self.completion
            .await
            .map_err(|e| FlowError::Execution(format!("Execution task failed: {}", e)))?
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub max_parallel_branches: usize,
    pub event_buffer_size: usize,
    /// Used when a workflow sets no `max_execution_time_ms`
    pub default_timeout_ms: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_parallel_branches: 10,
            event_buffer_size: 1000,
            default_timeout_ms: None,
        }
    }
}

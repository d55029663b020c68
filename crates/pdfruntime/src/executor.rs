use crate::joins::{Arrival, JoinTable};
use crate::plan::{Plan, StepId, StepKind};
use crate::registry::{Cardinality, HandlerRegistry};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use pdfcore::{
    file_names, ActionType, BranchPath, EventEmitter, ExecutionEvent, ExecutionId, FlowError,
    InputMode, OperationError, PdfFile, Workflow,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Walks an action graph with an explicit work queue, running sibling
/// branches concurrently
pub struct WorkflowExecutor {
    max_parallel: usize,
    default_timeout: Option<Duration>,
}

/// A batch of artifacts about to enter a step
struct Work {
    step: StepId,
    artifacts: Vec<PdfFile>,
    branch: BranchPath,
}

/// What a finished step hands back to the driver
enum Outcome {
    /// Transform output, to be forwarded to the step's continuation
    Forward {
        step: StepId,
        artifacts: Vec<PdfFile>,
        branch: BranchPath,
    },
    /// Artifacts reached a `done` node
    Terminal(Vec<PdfFile>),
    /// A join fired; its continuation starts from everything accumulated
    Fired {
        join: String,
        artifacts: Vec<PdfFile>,
        branch: BranchPath,
    },
    /// Delivered into a join that is still waiting
    Parked,
    /// Walked into a join definition, which is not a destination
    Absorbed,
}

impl WorkflowExecutor {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            default_timeout: None,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Execute a workflow and return every artifact that reached a terminal
    /// node. Progress goes to `emitter`; the result is only returned once
    /// the traversal has fully drained.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        registry: &HandlerRegistry,
        emitter: EventEmitter,
        cancellation: CancellationToken,
        inputs: Vec<PdfFile>,
    ) -> Result<ExecutionResult, FlowError> {
        let execution_id = emitter.execution_id();
        let start_time = Instant::now();

        emitter.emit(ExecutionEvent::ExecutionStarted {
            execution_id,
            workflow_id: workflow.id,
            inputs: inputs.len(),
            timestamp: Utc::now(),
        });

        tracing::info!(
            "Starting workflow execution {} ({} inputs, {} nodes)",
            execution_id,
            inputs.len(),
            workflow.node_count()
        );

        // execution-scoped, so failures stop our own tasks without
        // cancelling the caller's token
        let token = cancellation.child_token();
        let timeout = workflow
            .settings
            .max_execution_time_ms
            .map(Duration::from_millis)
            .or(self.default_timeout);

        let run = self.run(workflow, registry, &emitter, &token, inputs);
        let result = match timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => Err(FlowError::TimedOut {
                    ms: limit.as_millis() as u64,
                }),
            },
            None => run.await,
        };

        // stop anything still in flight; the join table goes with it
        token.cancel();

        let duration_ms = start_time.elapsed().as_millis() as u64;
        match &result {
            Ok(outcome) => tracing::info!(
                "Workflow execution {} completed in {}ms with {} results",
                execution_id,
                duration_ms,
                outcome.files.len()
            ),
            Err(e) => tracing::error!("Workflow execution {} failed: {}", execution_id, e),
        }

        emitter.emit(ExecutionEvent::ExecutionCompleted {
            execution_id,
            success: result.is_ok(),
            duration_ms,
            timestamp: Utc::now(),
        });

        result.map(|mut outcome| {
            outcome.duration_ms = duration_ms;
            outcome
        })
    }

    async fn run(
        &self,
        workflow: &Workflow,
        registry: &HandlerRegistry,
        emitter: &EventEmitter,
        token: &CancellationToken,
        inputs: Vec<PdfFile>,
    ) -> Result<ExecutionResult, FlowError> {
        let roots: Vec<Vec<PdfFile>> = match workflow.settings.input_mode {
            InputMode::Batch => vec![inputs],
            InputMode::PerArtifact => inputs.into_iter().map(|file| vec![file]).collect(),
        };

        let plan = Arc::new(Plan::compile(&workflow.actions, registry, roots.len())?);
        if roots.is_empty() {
            tracing::info!("No inputs to route; nothing to execute");
            return Ok(ExecutionResult::empty(emitter.execution_id(), plan.len()));
        }

        let joins = Arc::new(JoinTable::new(plan.joins()));
        let max_parallel = workflow
            .settings
            .max_parallel_branches
            .unwrap_or(self.max_parallel)
            .max(1);

        let mut queue = VecDeque::new();
        let mut files = Vec::new();
        let mut running = FuturesUnordered::new();
        let mut steps_run = 0;
        let mut joins_fired = 0;

        for (index, batch) in roots.into_iter().enumerate() {
            forward(
                plan.roots(),
                batch,
                BranchPath::root(index as u32),
                &mut queue,
                &mut files,
            );
        }

        loop {
            // Spawn queued work up to the parallel limit
            while running.len() < max_parallel && !token.is_cancelled() {
                let Some(work) = queue.pop_front() else {
                    break;
                };
                running.push(tokio::spawn(run_step(
                    Arc::clone(&plan),
                    Arc::clone(&joins),
                    emitter.clone(),
                    token.clone(),
                    work,
                )));
            }

            if token.is_cancelled() {
                return Err(FlowError::Cancelled);
            }

            // If nothing is running, the queue is drained too
            let Some(joined) = running.next().await else {
                break;
            };

            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    token.cancel();
                    return Err(e);
                }
                Err(e) => {
                    token.cancel();
                    return Err(FlowError::Execution(format!("Task join error: {}", e)));
                }
            };
            steps_run += 1;

            match outcome {
                Outcome::Forward {
                    step,
                    artifacts,
                    branch,
                } => forward(plan.next(step), artifacts, branch, &mut queue, &mut files),
                Outcome::Fired {
                    join,
                    artifacts,
                    branch,
                } => {
                    joins_fired += 1;
                    forward(plan.continuation(&join), artifacts, branch, &mut queue, &mut files);
                }
                Outcome::Terminal(artifacts) => files.extend(artifacts),
                Outcome::Parked | Outcome::Absorbed => {}
            }
        }

        let orphaned = joins.pending().await;
        if !orphaned.is_empty() {
            tracing::error!("Joins left waiting after traversal drained: {:?}", orphaned);
            return Err(FlowError::OrphanedJoins(orphaned));
        }

        Ok(ExecutionResult {
            execution_id: emitter.execution_id(),
            files,
            steps_run,
            joins_fired,
            total_nodes: plan.len(),
            duration_ms: 0,
        })
    }
}

/// Hand a batch to the next steps. No next steps means the batch is final;
/// several means each sibling gets its own copy.
fn forward(
    next: &[StepId],
    artifacts: Vec<PdfFile>,
    branch: BranchPath,
    queue: &mut VecDeque<Work>,
    files: &mut Vec<PdfFile>,
) {
    let Some((&last, siblings)) = next.split_last() else {
        files.extend(artifacts);
        return;
    };

    for (index, &step) in siblings.iter().enumerate() {
        queue.push_back(Work {
            step,
            artifacts: artifacts.clone(),
            branch: branch.child(index as u32),
        });
    }
    queue.push_back(Work {
        step: last,
        artifacts,
        branch: branch.child(siblings.len() as u32),
    });
}

async fn run_step(
    plan: Arc<Plan>,
    joins: Arc<JoinTable>,
    emitter: EventEmitter,
    token: CancellationToken,
    work: Work,
) -> Result<Outcome, FlowError> {
    if token.is_cancelled() {
        return Err(FlowError::Cancelled);
    }

    let Work {
        step: step_id,
        artifacts,
        branch,
    } = work;
    let step = plan.step(step_id);

    emitter.node_starting(step.action_type, &branch);
    tracing::debug!(
        "Running {} on branch {} with {} artifacts",
        step.action_type,
        branch,
        artifacts.len()
    );

    match &step.kind {
        StepKind::Terminal => Ok(Outcome::Terminal(artifacts)),
        StepKind::Anchor { join, .. } => {
            tracing::debug!("Branch {} reached the definition of join '{}'", branch, join);
            Ok(Outcome::Absorbed)
        }
        StepKind::Wait { join } => match joins.arrive(join, branch.clone(), artifacts).await? {
            Arrival::Pending { remaining } => {
                emitter.join_arrived(join, &branch, remaining);
                Ok(Outcome::Parked)
            }
            Arrival::Fired(fired) => {
                emitter.join_arrived(join, &branch, 0);
                emitter.join_fired(join, file_names(&fired.artifacts));
                tracing::info!(
                    "Join '{}' fired with {} artifacts",
                    join,
                    fired.artifacts.len()
                );
                Ok(Outcome::Fired {
                    join: join.clone(),
                    artifacts: fired.artifacts,
                    branch: fired.branch,
                })
            }
        },
        StepKind::Transform {
            handler, values, ..
        } => {
            let action_type = step.action_type;
            let started = Instant::now();
            let input_count = artifacts.len();

            let result = tokio::select! {
                _ = token.cancelled() => Err(OperationError::Cancelled),
                result = handler.run(artifacts, values) => result,
            };

            match result {
                Ok(outputs) => {
                    check_cardinality(handler.cardinality(), action_type, input_count, outputs.len())?;
                    emitter.node_completed(
                        action_type,
                        &branch,
                        file_names(&outputs),
                        started.elapsed().as_millis() as u64,
                    );
                    Ok(Outcome::Forward {
                        step: step_id,
                        artifacts: outputs,
                        branch,
                    })
                }
                Err(OperationError::Cancelled) if token.is_cancelled() => Err(FlowError::Cancelled),
                Err(source) => {
                    tracing::error!("{} failed on branch {}: {}", action_type, branch, source);
                    emitter.node_failed(action_type, &branch, source.to_string());
                    Err(FlowError::Operation {
                        action_type,
                        source,
                    })
                }
            }
        }
    }
}

fn check_cardinality(
    cardinality: Cardinality,
    action_type: ActionType,
    inputs: usize,
    outputs: usize,
) -> Result<(), FlowError> {
    if cardinality.admits(inputs, outputs) {
        Ok(())
    } else {
        Err(FlowError::Execution(format!(
            "{} handler ({}) produced {} outputs from {} inputs",
            action_type, cardinality, outputs, inputs
        )))
    }
}

/// Result of workflow execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub execution_id: ExecutionId,
    /// Artifacts that reached a terminal node, in completion order
    pub files: Vec<PdfFile>,
    pub steps_run: usize,
    pub joins_fired: usize,
    pub total_nodes: usize,
    pub duration_ms: u64,
}

impl ExecutionResult {
    fn empty(execution_id: ExecutionId, total_nodes: usize) -> Self {
        Self {
            execution_id,
            files: Vec::new(),
            steps_run: 0,
            joins_fired: 0,
            total_nodes,
            duration_ms: 0,
        }
    }

    pub fn names(&self) -> Vec<String> {
        file_names(&self.files)
    }
}

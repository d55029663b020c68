use crate::registry::{ActionHandler, HandlerRegistry};
use crate::resolver::{self, JoinSpec};
use pdfcore::{Action, ActionType, Values, WorkflowError};
use std::collections::HashMap;
use std::sync::Arc;

pub type StepId = usize;

/// An action tree compiled into index-addressed steps, with every handler
/// resolved and every join threshold computed
pub struct Plan {
    steps: Vec<Step>,
    roots: Vec<StepId>,
    joins: HashMap<String, JoinSpec>,
}

pub struct Step {
    pub action_type: ActionType,
    pub kind: StepKind,
    /// Innermost join whose continuation contains this step
    pub enclosing_join: Option<String>,
}

pub enum StepKind {
    /// Plain `done`: the batch is a final result
    Terminal,
    /// `done` carrying a join id: defines that join's continuation
    Anchor { join: String, continuation: Vec<StepId> },
    Wait { join: String },
    Transform {
        handler: Arc<dyn ActionHandler>,
        values: Values,
        next: Vec<StepId>,
    },
}

impl Plan {
    /// Compile `actions` for an execution with `root_branches` root branches.
    ///
    /// Fails before anything runs if a type is unknown or unhandled, a
    /// handler rejects its values, or the joins cannot be satisfied.
    pub fn compile(
        actions: &[Action],
        registry: &HandlerRegistry,
        root_branches: usize,
    ) -> Result<Self, WorkflowError> {
        let mut steps: Vec<Step> = Vec::new();
        let mut roots = Vec::new();

        // (action, parent step, enclosing join); children pushed in reverse
        // so siblings are numbered in authored order
        let mut pending: Vec<(&Action, Option<StepId>, Option<String>)> =
            actions.iter().rev().map(|a| (a, None, None)).collect();

        while let Some((action, parent, enclosing_join)) = pending.pop() {
            let id = steps.len();
            let action_type = ActionType::parse(&action.action_type)
                .ok_or_else(|| WorkflowError::UnrecognizedActionType(action.action_type.clone()))?;

            let (kind, child_scope) = match action_type {
                ActionType::Done => match action.join_id() {
                    Some(join) => (
                        StepKind::Anchor {
                            join: join.clone(),
                            continuation: Vec::new(),
                        },
                        Some(join),
                    ),
                    None if action.children().is_empty() => (StepKind::Terminal, None),
                    None => {
                        return Err(WorkflowError::Invalid(
                            "done node without a join id cannot have actions".to_string(),
                        ))
                    }
                },
                ActionType::Wait => {
                    let join = action.join_id().ok_or(WorkflowError::MissingJoinId)?;
                    if !action.children().is_empty() {
                        tracing::warn!("Actions under wait '{}' are ignored; the join's done node defines its continuation", join);
                    }
                    (StepKind::Wait { join }, None)
                }
                other => {
                    let handler = registry
                        .get(other)
                        .ok_or(WorkflowError::MissingHandler(other))?;
                    handler
                        .validate(&action.values)
                        .map_err(|source| WorkflowError::InvalidValues {
                            action_type: other,
                            source,
                        })?;
                    (
                        StepKind::Transform {
                            handler,
                            values: action.values.clone(),
                            next: Vec::new(),
                        },
                        enclosing_join.clone(),
                    )
                }
            };

            steps.push(Step {
                action_type,
                kind,
                enclosing_join,
            });

            match parent {
                Some(parent) => steps[parent].push_child(id),
                None => roots.push(id),
            }

            if !matches!(steps[id].kind, StepKind::Wait { .. }) {
                for child in action.children().iter().rev() {
                    pending.push((child, Some(id), child_scope.clone()));
                }
            }
        }

        let joins = resolver::resolve(&steps, root_branches)?;

        Ok(Self { steps, roots, joins })
    }

    pub fn step(&self, id: StepId) -> &Step {
        &self.steps[id]
    }

    pub fn roots(&self) -> &[StepId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps that receive a transform's output; empty means terminal
    pub fn next(&self, id: StepId) -> &[StepId] {
        match &self.steps[id].kind {
            StepKind::Transform { next, .. } => next,
            _ => &[],
        }
    }

    pub fn joins(&self) -> &HashMap<String, JoinSpec> {
        &self.joins
    }

    pub fn continuation(&self, join: &str) -> &[StepId] {
        self.joins
            .get(join)
            .map(|spec| spec.continuation.as_slice())
            .unwrap_or(&[])
    }
}

impl Step {
    fn push_child(&mut self, child: StepId) {
        match &mut self.kind {
            StepKind::Transform { next, .. } => next.push(child),
            StepKind::Anchor { continuation, .. } => continuation.push(child),
            StepKind::Terminal | StepKind::Wait { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Cardinality;
    use async_trait::async_trait;
    use pdfcore::{OperationError, PdfFile};

    struct Stub(ActionType);

    #[async_trait]
    impl ActionHandler for Stub {
        fn action_type(&self) -> ActionType {
            self.0
        }

        fn cardinality(&self) -> Cardinality {
            Cardinality::OneToOne
        }

        fn validate(&self, values: &Values) -> Result<(), OperationError> {
            if self.0 == ActionType::Rotate {
                values.require_i64("rotation")?;
            }
            Ok(())
        }

        async fn run(&self, inputs: Vec<PdfFile>, _values: &Values) -> Result<Vec<PdfFile>, OperationError> {
            Ok(inputs)
        }
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(Stub(ActionType::Extract)));
        registry.register(Arc::new(Stub(ActionType::Rotate)));
        registry
    }

    #[test]
    fn steps_are_numbered_depth_first_in_authored_order() {
        let actions = vec![
            Action::new("extract").then(vec![Action::done(), Action::new("extract")]),
            Action::new("extract"),
        ];
        let plan = Plan::compile(&actions, &registry(), 1).unwrap();

        assert_eq!(plan.len(), 4);
        assert_eq!(plan.roots(), &[0, 3]);
        assert_eq!(plan.next(0), &[1, 2]);
        assert!(matches!(plan.step(1).kind, StepKind::Terminal));
        assert!(plan.next(3).is_empty());
    }

    #[test]
    fn unknown_type_is_rejected_before_running() {
        let actions = vec![Action::new("extract").then(vec![Action::new("bogus")])];
        let err = Plan::compile(&actions, &registry(), 1).err().unwrap();
        assert!(matches!(err, WorkflowError::UnrecognizedActionType(t) if t == "bogus"));
    }

    #[test]
    fn known_type_without_handler_is_rejected() {
        let err = Plan::compile(&[Action::new("merge")], &registry(), 1).err().unwrap();
        assert!(matches!(err, WorkflowError::MissingHandler(ActionType::Merge)));
    }

    #[test]
    fn handler_validation_runs_at_compile_time() {
        let err = Plan::compile(&[Action::new("rotate")], &registry(), 1).err().unwrap();
        assert!(matches!(
            err,
            WorkflowError::InvalidValues { action_type: ActionType::Rotate, source: OperationError::MissingValue(_) }
        ));
    }

    #[test]
    fn continuation_steps_record_their_join() {
        let actions = vec![
            Action::new("extract").then(vec![Action::wait("w1")]),
            Action::join("w1", vec![Action::new("extract")]),
        ];
        let plan = Plan::compile(&actions, &registry(), 1).unwrap();

        let continuation = plan.continuation("w1");
        assert_eq!(continuation.len(), 1);
        assert_eq!(plan.step(continuation[0]).enclosing_join.as_deref(), Some("w1"));
        assert_eq!(plan.step(0).enclosing_join, None);
    }

    #[test]
    fn plain_done_with_children_is_invalid() {
        let actions = vec![Action::done().then(vec![Action::new("extract")])];
        assert!(matches!(
            Plan::compile(&actions, &registry(), 1),
            Err(WorkflowError::Invalid(_))
        ));
    }
}

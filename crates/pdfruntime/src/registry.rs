use async_trait::async_trait;
use pdfcore::{ActionType, OperationError, PdfFile, Values};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How a handler maps its input batch to its output batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// One output per input, same order
    OneToOne,
    /// All inputs collapse into exactly one output
    ManyToOne,
    /// Each input expands to zero or more outputs, flattened in input order
    OneToMany,
}

impl Cardinality {
    /// Whether `outputs` is a legal output count for `inputs`
    pub fn admits(&self, inputs: usize, outputs: usize) -> bool {
        match self {
            Cardinality::OneToOne => inputs == outputs,
            Cardinality::ManyToOne => outputs == 1,
            Cardinality::OneToMany => true,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::ManyToOne => "N:1",
            Cardinality::OneToMany => "1:N",
        })
    }
}

/// Uniform contract between the executor and a non-structural action
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn action_type(&self) -> ActionType;

    fn cardinality(&self) -> Cardinality;

    /// Transform a batch of artifacts, applying the action's naming rule
    async fn run(&self, inputs: Vec<PdfFile>, values: &Values) -> Result<Vec<PdfFile>, OperationError>;

    /// Optional: validate values when the plan is compiled
    fn validate(&self, _values: &Values) -> Result<(), OperationError> {
        Ok(())
    }

    /// Optional: describe the handler (description, required values)
    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata::default()
    }
}

/// Metadata about an action handler
#[derive(Debug, Clone, Default)]
pub struct HandlerMetadata {
    pub description: String,
    pub required_values: Vec<&'static str>,
}

/// Capability table: action type to handler, filled once at startup
pub struct HandlerRegistry {
    handlers: HashMap<ActionType, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any previous one for the same type.
    /// Handlers for `done`/`wait` are ignored; the traversal owns those.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        let action_type = handler.action_type();
        if action_type.is_structural() {
            tracing::warn!("Ignoring handler for structural action type: {}", action_type);
            return;
        }
        tracing::debug!("Registering action handler: {}", action_type);
        self.handlers.insert(action_type, handler);
    }

    pub fn get(&self, action_type: ActionType) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&action_type).cloned()
    }

    /// Registered action types, in declaration order
    pub fn list_action_types(&self) -> Vec<ActionType> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort();
        types
    }

    pub fn get_metadata(&self, action_type: ActionType) -> Option<HandlerMetadata> {
        self.handlers.get(&action_type).map(|h| h.metadata())
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop(ActionType);

    #[async_trait]
    impl ActionHandler for Noop {
        fn action_type(&self) -> ActionType {
            self.0
        }

        fn cardinality(&self) -> Cardinality {
            Cardinality::OneToOne
        }

        async fn run(&self, inputs: Vec<PdfFile>, _values: &Values) -> Result<Vec<PdfFile>, OperationError> {
            Ok(inputs)
        }
    }

    #[test]
    fn structural_types_cannot_be_overridden() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(Noop(ActionType::Wait)));
        registry.register(Arc::new(Noop(ActionType::Rotate)));
        registry.register(Arc::new(Noop(ActionType::Extract)));

        assert!(registry.get(ActionType::Wait).is_none());
        assert_eq!(
            registry.list_action_types(),
            vec![ActionType::Extract, ActionType::Rotate]
        );
    }

    #[test]
    fn cardinality_bounds() {
        assert!(Cardinality::OneToOne.admits(3, 3));
        assert!(!Cardinality::OneToOne.admits(3, 2));
        assert!(Cardinality::ManyToOne.admits(4, 1));
        assert!(!Cardinality::ManyToOne.admits(0, 0));
        assert!(Cardinality::OneToMany.admits(1, 0));
    }
}

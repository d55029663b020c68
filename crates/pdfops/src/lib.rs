//! Standard action handlers
//!
//! One handler per non-structural action type. Each binds a cardinality
//! combinator and the action's naming rule to a `PdfOperations` provider.

mod dry_run;
mod merge;
mod metadata;
mod pages;
mod split;

pub use dry_run::DryRunOperations;
pub use merge::{merged_name, MergeHandler};
pub use metadata::UpdateMetadataHandler;
pub use pages::{ExtractHandler, ImposeHandler, RemoveBlankPagesHandler, RotateHandler, SortPagesHandler};
pub use split::{SplitHandler, SplitOnHandler};

use pdfcore::PdfOperations;
use pdfruntime::HandlerRegistry;
use std::sync::Arc;

/// Register a handler for every non-structural action type, all backed by `ops`
pub fn register_all(registry: &mut HandlerRegistry, ops: Arc<dyn PdfOperations>) {
    registry.register(Arc::new(ExtractHandler::new(Arc::clone(&ops))));
    registry.register(Arc::new(ImposeHandler::new(Arc::clone(&ops))));
    registry.register(Arc::new(MergeHandler::new(Arc::clone(&ops))));
    registry.register(Arc::new(RotateHandler::new(Arc::clone(&ops))));
    registry.register(Arc::new(SplitHandler::new(Arc::clone(&ops))));
    registry.register(Arc::new(UpdateMetadataHandler::new(Arc::clone(&ops))));
    registry.register(Arc::new(SortPagesHandler::new(Arc::clone(&ops))));
    registry.register(Arc::new(RemoveBlankPagesHandler::new(Arc::clone(&ops))));
    registry.register(Arc::new(SplitOnHandler::new(ops)));
}

/// A registry with every standard handler, backed by `ops`
pub fn standard_registry(ops: Arc<dyn PdfOperations>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    register_all(&mut registry, ops);
    registry
}

//! Actions that cut one document into several

use async_trait::async_trait;
use pdfcore::{ActionType, OperationError, PdfFile, PdfOperations, Values};
use pdfruntime::combinators::one_to_many;
use pdfruntime::{ActionHandler, Cardinality, HandlerMetadata};
use std::sync::Arc;

const SPLIT_AFTER: &str = "splitAfterPageArray";
const SPLIT_TYPE: &str = "type";
const WHITE_THRESHOLD: &str = "whiteThreashold";

/// Number pieces `_split0`, `_split1`, ... in the order the provider returned them
fn number_pieces(pieces: Vec<PdfFile>) -> Vec<PdfFile> {
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, mut piece)| {
            piece.append_suffix(&format!("_split{}", index));
            piece
        })
        .collect()
}

/// Split after fixed page numbers (`split`)
pub struct SplitHandler {
    ops: Arc<dyn PdfOperations>,
}

impl SplitHandler {
    pub fn new(ops: Arc<dyn PdfOperations>) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl ActionHandler for SplitHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Split
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::OneToMany
    }

    fn validate(&self, values: &Values) -> Result<(), OperationError> {
        values.require_pages(SPLIT_AFTER).map(|_| ())
    }

    async fn run(&self, inputs: Vec<PdfFile>, values: &Values) -> Result<Vec<PdfFile>, OperationError> {
        let split_after = values.require_pages(SPLIT_AFTER)?;
        let (ops, split_after) = (&self.ops, &split_after);

        one_to_many(inputs, move |file| async move {
            Ok(number_pieces(ops.split_pdf(file, split_after).await?))
        })
        .await
    }

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            description: "Split after the listed pages".to_string(),
            required_values: vec![SPLIT_AFTER],
        }
    }
}

/// Split wherever the content says so, e.g. on blank separator pages (`splitOn`)
pub struct SplitOnHandler {
    ops: Arc<dyn PdfOperations>,
}

impl SplitOnHandler {
    pub fn new(ops: Arc<dyn PdfOperations>) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl ActionHandler for SplitOnHandler {
    fn action_type(&self) -> ActionType {
        ActionType::SplitOn
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::OneToMany
    }

    fn validate(&self, values: &Values) -> Result<(), OperationError> {
        values.require_str(SPLIT_TYPE)?;
        values.require_f64(WHITE_THRESHOLD)?;
        Ok(())
    }

    async fn run(&self, inputs: Vec<PdfFile>, values: &Values) -> Result<Vec<PdfFile>, OperationError> {
        let split_type = values.require_str(SPLIT_TYPE)?;
        let threshold = values.require_f64(WHITE_THRESHOLD)?;
        let ops = &self.ops;

        one_to_many(inputs, move |file| async move {
            Ok(number_pieces(ops.split_on(file, split_type, threshold).await?))
        })
        .await
    }

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            description: "Split on pages matching a separator type".to_string(),
            required_values: vec![SPLIT_TYPE, WHITE_THRESHOLD],
        }
    }
}

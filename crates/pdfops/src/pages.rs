//! Page-level actions: one output document per input document

use async_trait::async_trait;
use pdfcore::{ActionType, OperationError, PdfFile, PdfOperations, Values};
use pdfruntime::combinators::one_to_one;
use pdfruntime::{ActionHandler, Cardinality, HandlerMetadata};
use std::sync::Arc;

const PAGES_TO_EXTRACT: &str = "pagesToExtractArray";
const NUP: &str = "nup";
const FORMAT: &str = "format";
const ROTATION: &str = "rotation";
const SORT_PRESET: &str = "sortPreset";
const FANCY_PAGE_SELECTOR: &str = "fancyPageSelector";
const WHITE_THRESHOLD: &str = "whiteThreashold";

/// Keep selected pages (`extract`)
pub struct ExtractHandler {
    ops: Arc<dyn PdfOperations>,
}

impl ExtractHandler {
    pub fn new(ops: Arc<dyn PdfOperations>) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl ActionHandler for ExtractHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Extract
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::OneToOne
    }

    fn validate(&self, values: &Values) -> Result<(), OperationError> {
        values.require_pages(PAGES_TO_EXTRACT).map(|_| ())
    }

    async fn run(&self, inputs: Vec<PdfFile>, values: &Values) -> Result<Vec<PdfFile>, OperationError> {
        let pages = values.require_pages(PAGES_TO_EXTRACT)?;
        let (ops, pages) = (&self.ops, &pages);

        one_to_one(inputs, move |file| async move {
            let mut extracted = ops.select_pages(file, pages).await?;
            extracted.append_suffix("_extractedPages");
            Ok(extracted)
        })
        .await
    }

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            description: "Keep only the selected pages".to_string(),
            required_values: vec![PAGES_TO_EXTRACT],
        }
    }
}

/// Several pages per sheet (`impose`)
pub struct ImposeHandler {
    ops: Arc<dyn PdfOperations>,
}

impl ImposeHandler {
    pub fn new(ops: Arc<dyn PdfOperations>) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl ActionHandler for ImposeHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Impose
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::OneToOne
    }

    fn validate(&self, values: &Values) -> Result<(), OperationError> {
        values.require_u32(NUP)?;
        values.require_str(FORMAT)?;
        Ok(())
    }

    async fn run(&self, inputs: Vec<PdfFile>, values: &Values) -> Result<Vec<PdfFile>, OperationError> {
        let nup = values.require_u32(NUP)?;
        let format = values.require_str(FORMAT)?;
        let ops = &self.ops;

        one_to_one(inputs, move |file| async move {
            let mut imposed = ops.impose(file, nup, format).await?;
            imposed.append_suffix("_imposed");
            Ok(imposed)
        })
        .await
    }

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            description: "Place several pages on each sheet".to_string(),
            required_values: vec![NUP, FORMAT],
        }
    }
}

pub struct RotateHandler {
    ops: Arc<dyn PdfOperations>,
}

impl RotateHandler {
    pub fn new(ops: Arc<dyn PdfOperations>) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl ActionHandler for RotateHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Rotate
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::OneToOne
    }

    fn validate(&self, values: &Values) -> Result<(), OperationError> {
        values.require_i64(ROTATION).map(|_| ())
    }

    async fn run(&self, inputs: Vec<PdfFile>, values: &Values) -> Result<Vec<PdfFile>, OperationError> {
        let rotation = values.require_i64(ROTATION)?;
        let ops = &self.ops;

        one_to_one(inputs, move |file| async move {
            let mut turned = ops.rotate_pages(file, rotation).await?;
            turned.append_suffix("_turned");
            Ok(turned)
        })
        .await
    }

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            description: "Rotate every page by the given angle".to_string(),
            required_values: vec![ROTATION],
        }
    }
}

/// Reorder pages with a named preset (`sortPagesWithPreset`)
pub struct SortPagesHandler {
    ops: Arc<dyn PdfOperations>,
}

impl SortPagesHandler {
    pub fn new(ops: Arc<dyn PdfOperations>) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl ActionHandler for SortPagesHandler {
    fn action_type(&self) -> ActionType {
        ActionType::SortPagesWithPreset
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::OneToOne
    }

    fn validate(&self, values: &Values) -> Result<(), OperationError> {
        values.require_str(SORT_PRESET)?;
        values.require_str(FANCY_PAGE_SELECTOR)?;
        Ok(())
    }

    async fn run(&self, inputs: Vec<PdfFile>, values: &Values) -> Result<Vec<PdfFile>, OperationError> {
        let preset = values.require_str(SORT_PRESET)?;
        let selector = values.require_str(FANCY_PAGE_SELECTOR)?;
        let ops = &self.ops;

        one_to_one(inputs, move |file| async move {
            let mut sorted = ops.sort_pages_with_preset(file, preset, selector).await?;
            sorted.append_suffix("_pagesOrganized");
            Ok(sorted)
        })
        .await
    }

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            description: "Reorder pages using a sort preset".to_string(),
            required_values: vec![SORT_PRESET, FANCY_PAGE_SELECTOR],
        }
    }
}

pub struct RemoveBlankPagesHandler {
    ops: Arc<dyn PdfOperations>,
}

impl RemoveBlankPagesHandler {
    pub fn new(ops: Arc<dyn PdfOperations>) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl ActionHandler for RemoveBlankPagesHandler {
    fn action_type(&self) -> ActionType {
        ActionType::RemoveBlankPages
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::OneToOne
    }

    fn validate(&self, values: &Values) -> Result<(), OperationError> {
        values.require_f64(WHITE_THRESHOLD).map(|_| ())
    }

    async fn run(&self, inputs: Vec<PdfFile>, values: &Values) -> Result<Vec<PdfFile>, OperationError> {
        let threshold = values.require_f64(WHITE_THRESHOLD)?;
        let ops = &self.ops;

        one_to_one(inputs, move |file| async move {
            let mut cleaned = ops.remove_blank_pages(file, threshold).await?;
            cleaned.append_suffix("_removedBlanks");
            Ok(cleaned)
        })
        .await
    }

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            description: "Drop pages that are (almost) entirely white".to_string(),
            required_values: vec![WHITE_THRESHOLD],
        }
    }
}

use async_trait::async_trait;
use pdfcore::{ActionType, OperationError, PdfFile, PdfOperations, Values};
use pdfruntime::combinators::many_to_one;
use pdfruntime::{ActionHandler, Cardinality, HandlerMetadata};
use std::sync::Arc;

/// Concatenate every document in the batch into one (`merge`)
pub struct MergeHandler {
    ops: Arc<dyn PdfOperations>,
}

impl MergeHandler {
    pub fn new(ops: Arc<dyn PdfOperations>) -> Self {
        Self { ops }
    }
}

/// `a.pdf`, `b.pdf` => `a.pdf_and_b.pdf_merged`
pub fn merged_name(files: &[PdfFile]) -> String {
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    format!("{}_merged", names.join("_and_"))
}

#[async_trait]
impl ActionHandler for MergeHandler {
    fn action_type(&self) -> ActionType {
        ActionType::Merge
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::ManyToOne
    }

    async fn run(&self, inputs: Vec<PdfFile>, _values: &Values) -> Result<Vec<PdfFile>, OperationError> {
        let ops = &self.ops;

        many_to_one(inputs, move |files| async move {
            let name = merged_name(&files);
            let merged = ops.merge_pdfs(files).await?;
            Ok(merged.with_name(name))
        })
        .await
    }

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            description: "Merge all current documents into one".to_string(),
            required_values: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_name_keeps_input_order() {
        let files = vec![PdfFile::named("y.pdf"), PdfFile::named("x.pdf")];
        assert_eq!(merged_name(&files), "y.pdf_and_x.pdf_merged");
        assert_eq!(merged_name(&files[..1]), "y.pdf_merged");
    }
}

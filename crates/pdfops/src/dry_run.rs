use async_trait::async_trait;
use pdfcore::{MetadataUpdate, OperationError, PdfFile, PdfOperations};

/// Structural provider that never touches document bytes.
///
/// Every output shares its input's content handle; only the shape of the
/// result is modelled (piece counts for splits, one output for merges).
/// Used by `pdfflow run --dry-run` style executions and in tests.
#[derive(Debug, Clone, Default)]
pub struct DryRunOperations;

#[async_trait]
impl PdfOperations for DryRunOperations {
    async fn select_pages(&self, file: PdfFile, pages: &[u32]) -> Result<PdfFile, OperationError> {
        tracing::debug!("dry run: select {} pages of {}", pages.len(), file.name);
        Ok(file)
    }

    async fn impose(&self, file: PdfFile, nup: u32, format: &str) -> Result<PdfFile, OperationError> {
        if nup == 0 {
            return Err(OperationError::InvalidValue {
                field: "nup".to_string(),
                expected: "at least one page per sheet".to_string(),
                actual: "0".to_string(),
            });
        }
        tracing::debug!("dry run: impose {} {}-up on {}", file.name, nup, format);
        Ok(file)
    }

    async fn merge_pdfs(&self, files: Vec<PdfFile>) -> Result<PdfFile, OperationError> {
        tracing::debug!("dry run: merge {} files", files.len());
        files
            .into_iter()
            .next()
            .ok_or_else(|| OperationError::Failed("nothing to merge".to_string()))
    }

    async fn rotate_pages(&self, file: PdfFile, rotation: i64) -> Result<PdfFile, OperationError> {
        if rotation % 90 != 0 {
            return Err(OperationError::InvalidValue {
                field: "rotation".to_string(),
                expected: "a multiple of 90".to_string(),
                actual: rotation.to_string(),
            });
        }
        Ok(file)
    }

    async fn split_pdf(
        &self,
        file: PdfFile,
        split_after: &[u32],
    ) -> Result<Vec<PdfFile>, OperationError> {
        tracing::debug!("dry run: split {} after {:?}", file.name, split_after);
        Ok(vec![file; split_after.len() + 1])
    }

    async fn update_metadata(
        &self,
        file: PdfFile,
        _metadata: &MetadataUpdate,
    ) -> Result<PdfFile, OperationError> {
        Ok(file)
    }

    async fn sort_pages_with_preset(
        &self,
        file: PdfFile,
        preset: &str,
        _fancy_page_selector: &str,
    ) -> Result<PdfFile, OperationError> {
        tracing::debug!("dry run: sort {} with preset {}", file.name, preset);
        Ok(file)
    }

    async fn remove_blank_pages(
        &self,
        file: PdfFile,
        _white_threshold: f64,
    ) -> Result<PdfFile, OperationError> {
        Ok(file)
    }

    async fn split_on(
        &self,
        file: PdfFile,
        split_type: &str,
        _white_threshold: f64,
    ) -> Result<Vec<PdfFile>, OperationError> {
        // content is opaque here, so no separator is ever found
        tracing::debug!("dry run: split {} on {}", file.name, split_type);
        Ok(vec![file])
    }
}

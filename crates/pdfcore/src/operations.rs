use crate::{OperationError, PdfFile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The document transforms the executor delegates to.
///
/// Implementations only transform content; naming, cardinality and
/// continuation handling belong to the runtime. Errors are surfaced to the
/// caller untouched and never retried.
#[async_trait]
pub trait PdfOperations: Send + Sync {
    /// Keep only the given pages, in the given order
    async fn select_pages(&self, file: PdfFile, pages: &[u32]) -> Result<PdfFile, OperationError>;

    /// Place `nup` pages on each sheet of the given paper format
    async fn impose(&self, file: PdfFile, nup: u32, format: &str) -> Result<PdfFile, OperationError>;

    async fn merge_pdfs(&self, files: Vec<PdfFile>) -> Result<PdfFile, OperationError>;

    async fn rotate_pages(&self, file: PdfFile, rotation: i64) -> Result<PdfFile, OperationError>;

    /// Split after each listed page; yields `split_after.len() + 1` pieces
    async fn split_pdf(
        &self,
        file: PdfFile,
        split_after: &[u32],
    ) -> Result<Vec<PdfFile>, OperationError>;

    async fn update_metadata(
        &self,
        file: PdfFile,
        metadata: &MetadataUpdate,
    ) -> Result<PdfFile, OperationError>;

    async fn sort_pages_with_preset(
        &self,
        file: PdfFile,
        preset: &str,
        fancy_page_selector: &str,
    ) -> Result<PdfFile, OperationError>;

    async fn remove_blank_pages(
        &self,
        file: PdfFile,
        white_threshold: f64,
    ) -> Result<PdfFile, OperationError>;

    /// Split wherever a page matches `split_type` (e.g. blank separator pages)
    async fn split_on(
        &self,
        file: PdfFile,
        split_type: &str,
        white_threshold: f64,
    ) -> Result<Vec<PdfFile>, OperationError>;
}

/// Document info fields for `updateMetadata`; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdate {
    #[serde(default)]
    pub delete_all: bool,
    pub author: Option<String>,
    pub creation_date: Option<String>,
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub modification_date: Option<String>,
    pub producer: Option<String>,
    pub subject: Option<String>,
    pub title: Option<String>,
    pub trapped: Option<String>,
}

use async_trait::async_trait;
use pdfcore::{ActionType, MetadataUpdate, OperationError, PdfFile, PdfOperations, Values};
use pdfruntime::combinators::one_to_one;
use pdfruntime::{ActionHandler, Cardinality, HandlerMetadata};
use std::sync::Arc;

const METADATA: &str = "metadata";

/// Edit document info fields (`updateMetadata`)
pub struct UpdateMetadataHandler {
    ops: Arc<dyn PdfOperations>,
}

impl UpdateMetadataHandler {
    pub fn new(ops: Arc<dyn PdfOperations>) -> Self {
        Self { ops }
    }

    fn parse(values: &Values) -> Result<MetadataUpdate, OperationError> {
        let fields = values.require_object(METADATA)?;
        serde_json::from_value(serde_json::Value::Object(fields.clone())).map_err(|e| {
            OperationError::InvalidValue {
                field: METADATA.to_string(),
                expected: "metadata fields".to_string(),
                actual: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl ActionHandler for UpdateMetadataHandler {
    fn action_type(&self) -> ActionType {
        ActionType::UpdateMetadata
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::OneToOne
    }

    fn validate(&self, values: &Values) -> Result<(), OperationError> {
        Self::parse(values).map(|_| ())
    }

    async fn run(&self, inputs: Vec<PdfFile>, values: &Values) -> Result<Vec<PdfFile>, OperationError> {
        let metadata = Self::parse(values)?;
        let (ops, metadata) = (&self.ops, &metadata);

        one_to_one(inputs, move |file| async move {
            let mut edited = ops.update_metadata(file, metadata).await?;
            edited.append_suffix("_metadataEdited");
            Ok(edited)
        })
        .await
    }

    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            description: "Set or clear document info fields".to_string(),
            required_values: vec![METADATA],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_camel_case_fields() {
        let values = Values::new().with(
            "metadata",
            json!({ "title": "Report", "deleteAll": false, "modificationDate": "2024-01-01" }),
        );
        let update = UpdateMetadataHandler::parse(&values).unwrap();
        assert_eq!(update.title.as_deref(), Some("Report"));
        assert_eq!(update.modification_date.as_deref(), Some("2024-01-01"));
        assert!(!update.delete_all);
    }

    #[test]
    fn rejects_non_object_metadata() {
        let values = Values::new().with("metadata", "title=Report");
        assert!(matches!(
            UpdateMetadataHandler::parse(&values),
            Err(OperationError::InvalidValue { .. })
        ));
    }
}

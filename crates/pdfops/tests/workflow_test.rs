// crates/pdfops/tests/workflow_test.rs

use pdfcore::{
    Action, ActionType, FlowError, OperationError, PdfFile, Workflow, WorkflowError,
};
use pdfops::{standard_registry, DryRunOperations};
use pdfruntime::{PdfRuntime, RuntimeConfig};
use serde_json::json;
use std::sync::Arc;

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_test_writer()
        .try_init();
}

fn dry_runtime() -> PdfRuntime {
    let registry = standard_registry(Arc::new(DryRunOperations));
    PdfRuntime::with_registry(Arc::new(registry), RuntimeConfig::default())
}

fn parse(value: serde_json::Value) -> Workflow {
    serde_json::from_value(value).expect("valid workflow json")
}

async fn run(workflow: Workflow, names: &[&str]) -> Result<Vec<String>, FlowError> {
    let inputs = names.iter().map(|n| PdfFile::named(*n)).collect();
    dry_runtime()
        .execute(&workflow, inputs)
        .await
        .map(|result| result.names())
}

#[tokio::test]
async fn test_no_actions_returns_input_unchanged() {
    init_tracing();
    let names = run(parse(json!({ "actions": [] })), &["a.pdf"]).await.unwrap();
    assert_eq!(names, vec!["a.pdf"]);
}

#[tokio::test]
async fn test_extract_names_output() {
    let workflow = parse(json!({
        "actions": [
            { "type": "extract", "values": { "pagesToExtractArray": [1, 2] }, "actions": [] }
        ]
    }));

    assert_eq!(run(workflow, &["a.pdf"]).await.unwrap(), vec!["a.pdf_extractedPages"]);
}

#[tokio::test]
async fn test_split_numbers_pieces_in_order() {
    let workflow = parse(json!({
        "actions": [
            { "type": "split", "values": { "splitAfterPageArray": [1] }, "actions": [] }
        ]
    }));

    assert_eq!(
        run(workflow, &["a.pdf"]).await.unwrap(),
        vec!["a.pdf_split0", "a.pdf_split1"]
    );
}

#[tokio::test]
async fn test_split_numbering_restarts_per_input() {
    let workflow = parse(json!({
        "actions": [ { "type": "split", "values": { "splitAfterPageArray": [3] } } ]
    }));

    assert_eq!(
        run(workflow, &["a.pdf", "b.pdf"]).await.unwrap(),
        vec!["a.pdf_split0", "a.pdf_split1", "b.pdf_split0", "b.pdf_split1"]
    );
}

#[tokio::test]
async fn test_independent_branches_merge_once() {
    init_tracing();
    let workflow = parse(json!({
        "settings": { "input_mode": "per_artifact" },
        "actions": [
            { "type": "wait", "values": { "id": "w1" } },
            { "type": "done", "values": { "id": "w1" }, "actions": [ { "type": "merge", "actions": [] } ] }
        ]
    }));

    assert_eq!(
        run(workflow, &["x.pdf", "y.pdf"]).await.unwrap(),
        vec!["x.pdf_and_y.pdf_merged"]
    );
}

#[tokio::test]
async fn test_unknown_action_type_fails_before_running() {
    let workflow = parse(json!({ "actions": [ { "type": "rotate", "values": { "rotation": 90 } }, { "type": "bogus" } ] }));

    let err = run(workflow, &["a.pdf"]).await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::Workflow(WorkflowError::UnrecognizedActionType(ref t)) if t == "bogus"
    ));
}

#[tokio::test]
async fn test_every_action_applies_its_suffix() {
    let cases = vec![
        (json!({ "type": "extract", "values": { "pagesToExtractArray": [0] } }), "a.pdf_extractedPages"),
        (json!({ "type": "impose", "values": { "nup": 2, "format": "A4" } }), "a.pdf_imposed"),
        (json!({ "type": "merge" }), "a.pdf_merged"),
        (json!({ "type": "rotate", "values": { "rotation": -90 } }), "a.pdf_turned"),
        (json!({ "type": "updateMetadata", "values": { "metadata": { "title": "T" } } }), "a.pdf_metadataEdited"),
        (
            json!({ "type": "sortPagesWithPreset", "values": { "sortPreset": "REVERSE_ORDER", "fancyPageSelector": "" } }),
            "a.pdf_pagesOrganized",
        ),
        (json!({ "type": "removeBlankPages", "values": { "whiteThreashold": 10 } }), "a.pdf_removedBlanks"),
        (json!({ "type": "splitOn", "values": { "type": "BAR_CODE", "whiteThreashold": 10 } }), "a.pdf_split0"),
    ];

    for (action, expected) in cases {
        let workflow = parse(json!({ "actions": [action.clone()] }));
        let names = run(workflow, &["a.pdf"]).await.unwrap();
        assert_eq!(names, vec![expected], "action {}", action);
    }
}

#[tokio::test]
async fn test_suffixes_accumulate_along_a_chain() {
    let workflow = Workflow::new(
        "chain",
        vec![Action::new("rotate")
            .with_value("rotation", 90)
            .then(vec![Action::new("rotate")
                .with_value("rotation", 90)
                .then(vec![Action::done()])])],
    );

    assert_eq!(run(workflow, &["a.pdf"]).await.unwrap(), vec!["a.pdf_turned_turned"]);
}

#[tokio::test]
async fn test_missing_value_is_rejected_at_compile_time() {
    let workflow = parse(json!({ "actions": [ { "type": "extract" } ] }));

    let err = run(workflow, &["a.pdf"]).await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::Workflow(WorkflowError::InvalidValues {
            action_type: ActionType::Extract,
            source: OperationError::MissingValue(_),
        })
    ));
}

#[tokio::test]
async fn test_provider_failure_surfaces_as_operation_error() {
    let workflow = parse(json!({ "actions": [ { "type": "rotate", "values": { "rotation": 45 } } ] }));

    let err = run(workflow, &["a.pdf"]).await.unwrap_err();
    match err {
        FlowError::Operation {
            action_type: ActionType::Rotate,
            source: OperationError::InvalidValue { field, .. },
        } => assert_eq!(field, "rotation"),
        other => panic!("expected rotate failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_extract_then_join_with_untouched_copy() {
    // numeric join ids are accepted and match their string form
    let workflow = parse(json!({
        "actions": [
            { "type": "extract", "values": { "pagesToExtractArray": [0] }, "actions": [
                { "type": "wait", "values": { "id": 1 } }
            ]},
            { "type": "wait", "id": "1" },
            { "type": "done", "id": 1, "actions": [ { "type": "merge" } ] }
        ]
    }));

    assert_eq!(
        run(workflow, &["a.pdf"]).await.unwrap(),
        vec!["a.pdf_extractedPages_and_a.pdf_merged"]
    );
}

//! Cardinality combinators.
//!
//! Each adapts a single-artifact (or whole-batch) transform to the batch the
//! executor hands a node. Elementwise shapes run their transforms
//! concurrently and keep input order in the output.

use futures::future::try_join_all;
use pdfcore::{OperationError, PdfFile};
use std::future::Future;

/// One output per input
pub async fn one_to_one<F, Fut>(inputs: Vec<PdfFile>, transform: F) -> Result<Vec<PdfFile>, OperationError>
where
    F: Fn(PdfFile) -> Fut,
    Fut: Future<Output = Result<PdfFile, OperationError>>,
{
    try_join_all(inputs.into_iter().map(transform)).await
}

/// The whole batch becomes a single output
pub async fn many_to_one<F, Fut>(inputs: Vec<PdfFile>, transform: F) -> Result<Vec<PdfFile>, OperationError>
where
    F: FnOnce(Vec<PdfFile>) -> Fut,
    Fut: Future<Output = Result<PdfFile, OperationError>>,
{
    Ok(vec![transform(inputs).await?])
}

/// Each input expands to zero or more outputs, flattened in input order
pub async fn one_to_many<F, Fut>(inputs: Vec<PdfFile>, transform: F) -> Result<Vec<PdfFile>, OperationError>
where
    F: Fn(PdfFile) -> Fut,
    Fut: Future<Output = Result<Vec<PdfFile>, OperationError>>,
{
    let pieces = try_join_all(inputs.into_iter().map(transform)).await?;
    Ok(pieces.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn files(names: &[&str]) -> Vec<PdfFile> {
        names.iter().map(|n| PdfFile::named(*n)).collect()
    }

    fn names(files: &[PdfFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[tokio::test]
    async fn one_to_one_preserves_order_under_uneven_latency() {
        let out = one_to_one(files(&["a", "b", "c"]), |mut file| async move {
            // first input finishes last
            let delay = if file.name == "a" { 30 } else { 1 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            file.append_suffix("_x");
            Ok(file)
        })
        .await
        .unwrap();

        assert_eq!(names(&out), vec!["a_x", "b_x", "c_x"]);
    }

    #[tokio::test]
    async fn many_to_one_sees_whole_batch() {
        let out = many_to_one(files(&["a", "b"]), |batch| async move {
            Ok(PdfFile::named(format!("{}+", batch.len())))
        })
        .await
        .unwrap();

        assert_eq!(names(&out), vec!["2+"]);
    }

    #[tokio::test]
    async fn one_to_many_flattens_including_empty_expansions() {
        let out = one_to_many(files(&["a", "b", "c"]), |file| async move {
            let count = match file.name.as_str() {
                "a" => 2,
                "b" => 0,
                _ => 1,
            };
            Ok((0..count)
                .map(|i| file.clone().with_name(format!("{}{}", file.name, i)))
                .collect())
        })
        .await
        .unwrap();

        assert_eq!(names(&out), vec!["a0", "a1", "c0"]);
    }

    #[tokio::test]
    async fn first_error_aborts_the_batch() {
        let err = one_to_one(files(&["a", "bad"]), |file| async move {
            if file.name == "bad" {
                Err(OperationError::Failed("corrupt".into()))
            } else {
                Ok(file)
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err, OperationError::Failed("corrupt".into()));
    }
}

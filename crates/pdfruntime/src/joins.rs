//! Per-execution join state.
//!
//! The table is built from the resolver's thresholds before any branch runs
//! and never grows afterwards, so lookups need no global lock; each join is
//! guarded by its own mutex. An arrival appends, decrements and checks for
//! firing inside one critical section, so racing branches can neither fire a
//! continuation twice nor lose artifacts.

use crate::resolver::JoinSpec;
use pdfcore::{BranchPath, FlowError, PdfFile, WorkflowError};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

/// Result of delivering a batch into a join
#[derive(Debug)]
pub enum Arrival {
    /// Other branches are still expected
    Pending { remaining: usize },
    /// This was the last expected arrival
    Fired(FiredJoin),
}

/// Everything a fired join's continuation starts from
#[derive(Debug)]
pub struct FiredJoin {
    /// All accumulated artifacts, ordered by arriving branch path
    pub artifacts: Vec<PdfFile>,
    /// Path the continuation runs under
    pub branch: BranchPath,
}

#[derive(Debug)]
struct JoinState {
    remaining: usize,
    arrivals: BTreeMap<BranchPath, Vec<PdfFile>>,
}

pub struct JoinTable {
    states: HashMap<String, Mutex<JoinState>>,
}

impl JoinTable {
    pub fn new(specs: &HashMap<String, JoinSpec>) -> Self {
        let states = specs
            .iter()
            .map(|(join, spec)| {
                (
                    join.clone(),
                    Mutex::new(JoinState {
                        remaining: spec.expected,
                        arrivals: BTreeMap::new(),
                    }),
                )
            })
            .collect();
        Self { states }
    }

    /// Deliver `artifacts` from `branch` into `join`
    pub async fn arrive(
        &self,
        join: &str,
        branch: BranchPath,
        artifacts: Vec<PdfFile>,
    ) -> Result<Arrival, FlowError> {
        let state = self
            .states
            .get(join)
            .ok_or_else(|| WorkflowError::UnresolvedJoinReference(join.to_string()))?;

        let mut state = state.lock().await;
        if state.remaining == 0 {
            return Err(FlowError::Execution(format!(
                "join '{}' received an arrival after it fired",
                join
            )));
        }

        state.arrivals.entry(branch).or_default().extend(artifacts);
        state.remaining -= 1;

        if state.remaining > 0 {
            return Ok(Arrival::Pending {
                remaining: state.remaining,
            });
        }

        let arrivals = std::mem::take(&mut state.arrivals);
        let branch = arrivals
            .keys()
            .next()
            .map(BranchPath::continuation)
            .ok_or_else(|| FlowError::Execution(format!("join '{}' fired without arrivals", join)))?;

        Ok(Arrival::Fired(FiredJoin {
            artifacts: arrivals.into_values().flatten().collect(),
            branch,
        }))
    }

    /// Joins still waiting for arrivals, sorted by id
    pub async fn pending(&self) -> Vec<String> {
        let mut pending = Vec::new();
        for (join, state) in &self.states {
            if state.lock().await.remaining > 0 {
                pending.push(join.clone());
            }
        }
        pending.sort();
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn table(expected: &[(&str, usize)]) -> JoinTable {
        let specs = expected
            .iter()
            .map(|(join, count)| {
                (
                    join.to_string(),
                    JoinSpec {
                        expected: *count,
                        continuation: vec![],
                    },
                )
            })
            .collect();
        JoinTable::new(&specs)
    }

    fn names(files: &[PdfFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[tokio::test]
    async fn fires_only_on_last_arrival_in_path_order() {
        let joins = table(&[("w", 3)]);

        let first = joins
            .arrive("w", BranchPath::root(2), vec![PdfFile::named("c")])
            .await
            .unwrap();
        assert!(matches!(first, Arrival::Pending { remaining: 2 }));

        let second = joins
            .arrive("w", BranchPath::root(0), vec![PdfFile::named("a1"), PdfFile::named("a2")])
            .await
            .unwrap();
        assert!(matches!(second, Arrival::Pending { remaining: 1 }));
        assert_eq!(joins.pending().await, vec!["w".to_string()]);

        let Arrival::Fired(fired) = joins
            .arrive("w", BranchPath::root(1), vec![])
            .await
            .unwrap()
        else {
            panic!("join should fire on the third arrival");
        };

        assert_eq!(names(&fired.artifacts), vec!["a1", "a2", "c"]);
        assert_eq!(fired.branch, BranchPath::root(0).continuation());
        assert!(joins.pending().await.is_empty());
    }

    #[tokio::test]
    async fn late_arrival_is_an_error() {
        let joins = table(&[("w", 1)]);
        joins.arrive("w", BranchPath::root(0), vec![]).await.unwrap();
        let err = joins.arrive("w", BranchPath::root(1), vec![]).await.unwrap_err();
        assert!(matches!(err, FlowError::Execution(_)));
    }

    #[tokio::test]
    async fn unknown_join_is_unresolved() {
        let joins = table(&[]);
        let err = joins.arrive("x", BranchPath::root(0), vec![]).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::Workflow(WorkflowError::UnresolvedJoinReference(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_arrivals_fire_exactly_once_and_keep_everything() {
        const BRANCHES: u32 = 64;
        let joins = Arc::new(table(&[("race", BRANCHES as usize)]));

        let tasks: Vec<_> = (0..BRANCHES)
            .map(|i| {
                let joins = Arc::clone(&joins);
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    joins
                        .arrive("race", BranchPath::root(i), vec![PdfFile::named(format!("f{}", i))])
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut fired = Vec::new();
        for task in tasks {
            if let Arrival::Fired(join) = task.await.unwrap() {
                fired.push(join);
            }
        }

        assert_eq!(fired.len(), 1);
        let expected: Vec<String> = (0..BRANCHES).map(|i| format!("f{}", i)).collect();
        assert_eq!(pdfcore::file_names(&fired[0].artifacts), expected);
    }
}

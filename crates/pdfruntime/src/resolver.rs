//! Join threshold resolution.
//!
//! Runs once over a compiled plan and determines, for every join that some
//! `wait` step delivers into, how many arrivals must happen before its
//! continuation may run.
//!
//! Thresholds count branch paths, not artifacts: a batch travels through a
//! node as a unit, so a `wait` downstream of a split still arrives once per
//! path. A `wait` outside every continuation is reached once per root
//! branch; one inside a continuation is reached at most once, because a
//! continuation runs at most once.

use crate::plan::{Step, StepId, StepKind};
use pdfcore::WorkflowError;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap};

/// Expected arrivals and continuation of one join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub expected: usize,
    pub continuation: Vec<StepId>,
}

pub fn resolve(steps: &[Step], root_branches: usize) -> Result<HashMap<String, JoinSpec>, WorkflowError> {
    let mut anchors: HashMap<&str, &[StepId]> = HashMap::new();
    // BTreeMap so the first unresolved reference reported is stable
    let mut expected: BTreeMap<&str, usize> = BTreeMap::new();

    for step in steps {
        match &step.kind {
            StepKind::Anchor { join, continuation } => {
                if anchors.insert(join.as_str(), continuation.as_slice()).is_some() {
                    return Err(WorkflowError::DuplicateJoinDefinition(join.clone()));
                }
            }
            StepKind::Wait { join } => {
                let multiplicity = if step.enclosing_join.is_some() {
                    1
                } else {
                    root_branches
                };
                *expected.entry(join.as_str()).or_insert(0) += multiplicity;
            }
            StepKind::Terminal | StepKind::Transform { .. } => {}
        }
    }

    for join in anchors.keys() {
        if !expected.contains_key(join) {
            tracing::warn!("Join '{}' is defined but no wait node delivers into it", join);
        }
    }

    let mut joins = HashMap::new();
    for (join, count) in expected {
        let continuation = anchors
            .get(join)
            .ok_or_else(|| WorkflowError::UnresolvedJoinReference(join.to_string()))?;

        // no root branches means nothing will ever arrive
        if count == 0 {
            continue;
        }

        joins.insert(
            join.to_string(),
            JoinSpec {
                expected: count,
                continuation: continuation.to_vec(),
            },
        );
    }

    check_join_cycles(steps)?;

    Ok(joins)
}

/// Reject joins that can only fire after themselves: join A depends on join
/// B when a `wait A` sits inside B's continuation
fn check_join_cycles(steps: &[Step]) -> Result<(), WorkflowError> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for step in steps {
        if let (StepKind::Wait { join }, Some(enclosing)) = (&step.kind, &step.enclosing_join) {
            let from = join_node(&mut graph, &mut index, enclosing);
            let to = join_node(&mut graph, &mut index, join);
            graph.update_edge(from, to, ());
        }
    }

    for component in tarjan_scc(&graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.contains_edge(n, n));
        if cyclic {
            let mut names: Vec<String> = component.iter().map(|&n| graph[n].to_string()).collect();
            names.sort();
            return Err(WorkflowError::CyclicJoinDependency(names));
        }
    }

    Ok(())
}

fn join_node<'a>(
    graph: &mut DiGraph<&'a str, ()>,
    index: &mut HashMap<&'a str, NodeIndex>,
    name: &'a str,
) -> NodeIndex {
    *index.entry(name).or_insert_with(|| graph.add_node(name))
}

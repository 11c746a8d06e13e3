//! Float calculation and critical path extraction
//!
//! ```text
//! Total Float = LS - ES = LF - EF   (must agree, must be >= 0)
//! Free Float  = min(ES of successors) - EF, or Total Float for a sink
//! Critical    = Total Float == 0
//! ```
//!
//! Critical paths follow *driving* links only: `p -> s` where both tasks are
//! critical and `ES(s) == EF(p)`. Every maximal chain in that subgraph is
//! reported, so a project with several independent critical paths gets all of
//! them.

use critpath_core::{CpmError, Days, Diagnostic, DiagnosticCode};
use tracing::{debug, warn};

use crate::cpm::{BackwardPass, ForwardPass};
use crate::dag::SchedulingGraph;

/// Float values for every node, indexed like the graph arena
#[derive(Debug, Clone)]
pub struct FloatValues {
    pub total_float: Vec<Days>,
    pub free_float: Vec<Days>,
    pub is_critical: Vec<bool>,
}

/// Critical chains as node indices, plus anything worth reporting about them
#[derive(Debug, Clone, Default)]
pub struct CriticalPaths {
    pub chains: Vec<Vec<usize>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Derive total float, free float and criticality.
///
/// Fails with `InternalInconsistency` if the two passes disagree.
pub fn compute_floats(
    graph: &SchedulingGraph,
    forward: &ForwardPass,
    backward: &BackwardPass,
) -> Result<FloatValues, CpmError> {
    let mut total_float = Vec::with_capacity(graph.len());
    let mut free_float = Vec::with_capacity(graph.len());
    let mut is_critical = Vec::with_capacity(graph.len());

    for task in 0..graph.len() {
        let id = graph.id(task);
        let es = forward.early_start[task];
        let ef = forward.early_finish[task];
        let ls = backward.late_start[task];
        let lf = backward.late_finish[task];

        let total = ls - es;
        if total != lf - ef {
            return Err(CpmError::InternalInconsistency(format!(
                "task '{}' has start float {} but finish float {}",
                id,
                total,
                lf - ef
            )));
        }
        if total < Days::ZERO {
            return Err(CpmError::InternalInconsistency(format!(
                "task '{}' has negative total float ({})",
                id, total
            )));
        }

        let free = if graph.is_sink(task) {
            total
        } else {
            let starts = graph.successors[task]
                .iter()
                .map(|&succ| {
                    forward.early_start.get(succ).copied().ok_or_else(|| {
                        CpmError::InternalInconsistency(format!(
                            "successor of '{}' has no early start",
                            id
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            starts.into_iter().fold(Days::MAX, Days::min) - ef
        };
        if free > total {
            return Err(CpmError::InternalInconsistency(format!(
                "task '{}' has free float {} above total float {}",
                id, free, total
            )));
        }

        total_float.push(total);
        free_float.push(free);
        is_critical.push(total.is_zero());
    }

    debug!(
        critical = is_critical.iter().filter(|&&c| c).count(),
        "float calculation complete"
    );

    Ok(FloatValues {
        total_float,
        free_float,
        is_critical,
    })
}

/// Enumerate every maximal chain of critical tasks joined by driving links.
///
/// Chains are produced in id order of their first task, then depth first
/// through successors in id order. Enumeration stops once `max_chains` chains
/// have been collected.
pub fn extract_critical_paths(
    graph: &SchedulingGraph,
    forward: &ForwardPass,
    floats: &FloatValues,
    max_chains: usize,
) -> CriticalPaths {
    let driving = |pred: usize, succ: usize| {
        floats.is_critical[pred]
            && floats.is_critical[succ]
            && forward.early_start[succ] == forward.early_finish[pred]
    };

    let next: Vec<Vec<usize>> = (0..graph.len())
        .map(|task| {
            graph.successors[task]
                .iter()
                .copied()
                .filter(|&succ| driving(task, succ))
                .collect()
        })
        .collect();

    let heads: Vec<usize> = (0..graph.len())
        .filter(|&task| floats.is_critical[task])
        .filter(|&task| !graph.predecessors[task].iter().any(|&pred| driving(pred, task)))
        .collect();

    let mut result = CriticalPaths::default();
    let mut truncated = false;

    'heads: for head in heads {
        let mut path = vec![head];
        let mut cursor = vec![0usize];

        while let Some(&node) = path.last() {
            let depth = path.len() - 1;

            if next[node].is_empty() {
                if result.chains.len() == max_chains {
                    truncated = true;
                    break 'heads;
                }
                result.chains.push(path.clone());
                path.pop();
                cursor.pop();
                continue;
            }

            let child = cursor[depth];
            if child < next[node].len() {
                cursor[depth] += 1;
                path.push(next[node][child]);
                cursor.push(0);
            } else {
                path.pop();
                cursor.pop();
            }
        }
    }

    if truncated {
        warn!(limit = max_chains, "critical chain enumeration truncated");
        result.diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::W003CriticalChainLimit,
                format!("stopped after {} critical chains; more exist", max_chains),
            )
            .with_hint("raise max_critical_chains to report every chain"),
        );
    }

    for chain in &result.chains {
        let (Some(&first), Some(&last)) = (chain.first(), chain.last()) else {
            continue;
        };
        if graph.is_source(first) && graph.is_sink(last) {
            continue;
        }

        let ids = graph.ids(chain);
        result.diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::W002DisconnectedCriticalChain,
                format!(
                    "critical chain {} -> {} does not connect a source task to a sink task",
                    ids[0],
                    ids[ids.len() - 1]
                ),
            )
            .with_task(ids[0].clone())
            .with_note(format!("chain: {}", ids.join(" -> "))),
        );
    }

    debug!(chains = result.chains.len(), "critical paths extracted");

    result
}

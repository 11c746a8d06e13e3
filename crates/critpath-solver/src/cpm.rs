//! Critical Path Method passes
//!
//! Textbook CPM operating on a [`SchedulingGraph`].
//!
//! References:
//!   - Kelley & Walker (1959) "Critical-Path Planning and Scheduling"
//!   - PMI PMBOK Guide, Chapter 6
//!
//! # Algorithm
//!
//! 1. Topological sort (done in dag.rs)
//! 2. Forward pass: Compute ES (Early Start) and EF (Early Finish)
//! 3. Backward pass: Compute LS (Late Start) and LF (Late Finish)
//! 4. Float and critical paths (critical.rs)
//!
//! All values are day offsets from the project anchor, the earliest planned
//! start in the graph.

use chrono::NaiveDate;
use critpath_core::{CpmError, Days};
use tracing::debug;

use crate::dag::SchedulingGraph;

/// Early dates for every node, indexed like the graph arena
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// Offset 0
    pub anchor: NaiveDate,
    pub early_start: Vec<Days>,
    pub early_finish: Vec<Days>,
}

impl ForwardPass {
    /// Latest early finish across all nodes
    pub fn project_finish(&self) -> Days {
        self.early_finish.iter().copied().max().unwrap_or(Days::ZERO)
    }
}

/// Late dates for every node, indexed like the graph arena
#[derive(Debug, Clone)]
pub struct BackwardPass {
    pub late_start: Vec<Days>,
    pub late_finish: Vec<Days>,
}

// ════════════════════════════════════════════════════════════════════════════
// FORWARD PASS: Compute Early Start (ES) and Early Finish (EF)
// ════════════════════════════════════════════════════════════════════════════
//
// For each task in topological order:
//   ES = planned start if no predecessors, else max(EF of predecessors)
//   EF = ES + duration

/// Compute early start and finish for every node
pub fn forward_pass(graph: &SchedulingGraph) -> Result<ForwardPass, CpmError> {
    let anchor = graph
        .nodes
        .iter()
        .map(|n| n.planned_start)
        .min()
        .ok_or_else(|| CpmError::InternalInconsistency("forward pass on an empty graph".into()))?;

    let mut es: Vec<Option<Days>> = vec![None; graph.len()];
    let mut ef: Vec<Option<Days>> = vec![None; graph.len()];

    for &task in &graph.topo_order {
        let node = &graph.nodes[task];

        let early_start = if graph.is_source(task) {
            Days::from((node.planned_start - anchor).num_days())
        } else {
            let finishes = graph.predecessors[task]
                .iter()
                .map(|&pred| {
                    ef[pred].ok_or_else(|| unresolved("early finish", graph.id(pred), &node.id))
                })
                .collect::<Result<Vec<_>, _>>()?;
            finishes.into_iter().fold(Days::MIN, Days::max)
        };

        let early_finish = early_start
            .checked_add(node.duration)
            .ok_or_else(|| overflow(&node.id))?;

        es[task] = Some(early_start);
        ef[task] = Some(early_finish);
    }

    let early_start = complete(es, "early start")?;
    let early_finish = complete(ef, "early finish")?;

    debug!(%anchor, tasks = graph.len(), "forward pass complete");

    Ok(ForwardPass {
        anchor,
        early_start,
        early_finish,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// BACKWARD PASS: Compute Late Start (LS) and Late Finish (LF)
// ════════════════════════════════════════════════════════════════════════════
//
// For each task in REVERSE topological order:
//   LF = own EF if no successors, else min(LS of successors)
//   LS = LF - duration
//
// Every sink is seeded from its own EF; sinks are not unified to one project
// deadline.

/// Compute late start and finish for every node
pub fn backward_pass(
    graph: &SchedulingGraph,
    forward: &ForwardPass,
) -> Result<BackwardPass, CpmError> {
    if forward.early_finish.len() != graph.len() {
        return Err(CpmError::InternalInconsistency(format!(
            "forward pass covers {} tasks but the graph has {}",
            forward.early_finish.len(),
            graph.len()
        )));
    }

    let mut ls: Vec<Option<Days>> = vec![None; graph.len()];
    let mut lf: Vec<Option<Days>> = vec![None; graph.len()];

    for &task in graph.topo_order.iter().rev() {
        let node = &graph.nodes[task];

        let late_finish = if graph.is_sink(task) {
            forward.early_finish[task]
        } else {
            let starts = graph.successors[task]
                .iter()
                .map(|&succ| {
                    ls[succ].ok_or_else(|| unresolved("late start", graph.id(succ), &node.id))
                })
                .collect::<Result<Vec<_>, _>>()?;
            starts.into_iter().fold(Days::MAX, Days::min)
        };

        let late_start = late_finish
            .checked_sub(node.duration)
            .ok_or_else(|| overflow(&node.id))?;

        lf[task] = Some(late_finish);
        ls[task] = Some(late_start);
    }

    let late_start = complete(ls, "late start")?;
    let late_finish = complete(lf, "late finish")?;

    debug!(tasks = graph.len(), "backward pass complete");

    Ok(BackwardPass {
        late_start,
        late_finish,
    })
}

fn overflow(task: &str) -> CpmError {
    CpmError::DateOverflow {
        task: task.to_string(),
    }
}

fn unresolved(value: &str, dependency: &str, task: &str) -> CpmError {
    CpmError::InternalInconsistency(format!(
        "{} of '{}' is not known when '{}' is visited",
        value, dependency, task
    ))
}

fn complete(values: Vec<Option<Days>>, what: &str) -> Result<Vec<Days>, CpmError> {
    values
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| CpmError::InternalInconsistency(format!("{} left unset for some tasks", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use critpath_core::TaskRecord;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn make_graph(tasks: &[(&str, i64, &[&str])]) -> SchedulingGraph {
        let records: Vec<TaskRecord> = tasks
            .iter()
            .map(|(id, dur, deps)| {
                let mut record = TaskRecord::new(*id, day(6)).duration_days(*dur);
                for dep in *deps {
                    record = record.depends_on(*dep);
                }
                record
            })
            .collect();
        SchedulingGraph::from_records(&records).unwrap()
    }

    fn at(graph: &SchedulingGraph, values: &[Days], id: &str) -> Days {
        values[graph.index[id]]
    }

    #[test]
    fn single_task() {
        let graph = make_graph(&[("a", 5, &[])]);
        let forward = forward_pass(&graph).unwrap();
        let backward = backward_pass(&graph, &forward).unwrap();

        assert_eq!(forward.anchor, day(6));
        assert_eq!(forward.early_start, vec![dec!(0)]);
        assert_eq!(forward.early_finish, vec![dec!(5)]);
        assert_eq!(backward.late_start, vec![dec!(0)]);
        assert_eq!(backward.late_finish, vec![dec!(5)]);
        assert_eq!(forward.project_finish(), dec!(5));
    }

    #[test]
    fn sequential_chain() {
        // A(5) -> B(3) -> C(2) = 10 days total
        let graph = make_graph(&[("a", 5, &[]), ("b", 3, &["a"]), ("c", 2, &["b"])]);
        let forward = forward_pass(&graph).unwrap();

        assert_eq!(at(&graph, &forward.early_start, "b"), dec!(5));
        assert_eq!(at(&graph, &forward.early_finish, "b"), dec!(8));
        assert_eq!(at(&graph, &forward.early_start, "c"), dec!(8));
        assert_eq!(forward.project_finish(), dec!(10));
    }

    #[test]
    fn early_start_takes_latest_predecessor() {
        // "a" sorts first and finishes early; "z" drives "m".
        let graph = make_graph(&[("a", 1, &[]), ("z", 7, &[]), ("m", 2, &["a", "z"])]);
        let forward = forward_pass(&graph).unwrap();

        assert_eq!(at(&graph, &forward.early_start, "m"), dec!(7));
        assert_eq!(at(&graph, &forward.early_finish, "m"), dec!(9));
    }

    #[test]
    fn source_seeded_from_planned_start() {
        let records = vec![
            TaskRecord::new("early", day(6)).duration_days(2),
            TaskRecord::new("late", day(10)).duration_days(1),
            TaskRecord::new("join", day(6)).duration_days(1).depends_on("early").depends_on("late"),
        ];
        let graph = SchedulingGraph::from_records(&records).unwrap();
        let forward = forward_pass(&graph).unwrap();

        // planned_start of a task with predecessors is ignored
        assert_eq!(at(&graph, &forward.early_start, "late"), dec!(4));
        assert_eq!(at(&graph, &forward.early_start, "join"), dec!(5));
    }

    #[test]
    fn late_finish_takes_earliest_successor() {
        //      +-> b(4) -> d(1)
        // a(2) |
        //      +-> c(1) ----^
        let graph = make_graph(&[
            ("a", 2, &[]),
            ("b", 4, &["a"]),
            ("c", 1, &["a"]),
            ("d", 1, &["b", "c"]),
        ]);
        let forward = forward_pass(&graph).unwrap();
        let backward = backward_pass(&graph, &forward).unwrap();

        assert_eq!(at(&graph, &backward.late_finish, "d"), dec!(7));
        assert_eq!(at(&graph, &backward.late_finish, "c"), dec!(6));
        assert_eq!(at(&graph, &backward.late_start, "c"), dec!(5));
        assert_eq!(at(&graph, &backward.late_finish, "a"), dec!(2));
    }

    #[test]
    fn sinks_are_seeded_independently() {
        // Two unrelated chains: the short one is not stretched to the long finish.
        let graph = make_graph(&[("long", 10, &[]), ("short", 3, &[])]);
        let forward = forward_pass(&graph).unwrap();
        let backward = backward_pass(&graph, &forward).unwrap();

        assert_eq!(at(&graph, &backward.late_finish, "short"), dec!(3));
        assert_eq!(at(&graph, &backward.late_start, "short"), dec!(0));
    }

    #[test]
    fn fractional_durations_stay_exact() {
        let records = vec![
            TaskRecord::new("a", day(6)).duration(dec!(0.1)),
            TaskRecord::new("b", day(6)).duration(dec!(0.2)).depends_on("a"),
        ];
        let graph = SchedulingGraph::from_records(&records).unwrap();
        let forward = forward_pass(&graph).unwrap();
        let backward = backward_pass(&graph, &forward).unwrap();

        assert_eq!(at(&graph, &forward.early_finish, "b"), dec!(0.3));
        assert_eq!(at(&graph, &backward.late_start, "a"), dec!(0));
    }

    #[test]
    fn early_finish_overflow_is_reported() {
        let huge = Days::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        let records = vec![
            TaskRecord::new("a", day(6)).duration(huge),
            TaskRecord::new("b", day(6)).duration(huge).depends_on("a"),
        ];
        let graph = SchedulingGraph::from_records(&records).unwrap();

        match forward_pass(&graph) {
            Err(CpmError::DateOverflow { task }) => assert_eq!(task, "b"),
            other => panic!("expected DateOverflow, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_forward_pass_is_inconsistent() {
        let graph = make_graph(&[("a", 1, &[])]);
        let forward = ForwardPass {
            anchor: day(6),
            early_start: Vec::new(),
            early_finish: Vec::new(),
        };
        assert!(matches!(
            backward_pass(&graph, &forward),
            Err(CpmError::InternalInconsistency(_))
        ));
    }
}

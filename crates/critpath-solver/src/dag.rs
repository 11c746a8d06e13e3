//! Dependency graph construction and ordering
//!
//! Task records are copied into a dense arena of nodes sorted by id. Edges are
//! index lists in both directions, so the graph never holds references into
//! itself. The topological order is computed once here and reused by both
//! passes.
//!
//! Sorting the arena and every adjacency list makes the graph, and with it
//! every later pass, independent of the order in which records arrived.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use chrono::NaiveDate;
use critpath_core::{CpmError, Days, Diagnostic, DiagnosticCode, TaskId, TaskRecord};
use tracing::{debug, warn};

/// A task inside the scheduling graph
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: TaskId,
    pub name: String,
    pub planned_start: NaiveDate,
    pub planned_finish: Option<NaiveDate>,
    pub duration: Days,
}

/// A validated, topologically ordered task graph
#[derive(Debug)]
pub struct SchedulingGraph {
    /// Nodes, sorted by id
    pub nodes: Vec<GraphNode>,
    /// Task lookup by ID
    pub index: HashMap<TaskId, usize>,
    /// Resolved predecessor indices per node, ascending
    pub predecessors: Vec<Vec<usize>>,
    /// Successor indices per node, ascending
    pub successors: Vec<Vec<usize>>,
    /// Topological order (computed once, reused)
    pub topo_order: Vec<usize>,
    /// Non-fatal findings from construction
    pub diagnostics: Vec<Diagnostic>,
}

impl SchedulingGraph {
    /// Build the graph from input records.
    ///
    /// Fails on empty input, duplicate ids, negative durations and cycles.
    /// Dangling predecessor references are dropped and reported.
    pub fn from_records(records: &[TaskRecord]) -> Result<Self, CpmError> {
        if records.is_empty() {
            return Err(CpmError::EmptySchedule);
        }

        // 1. Sort and validate
        let mut sorted: Vec<&TaskRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        if let Some(pair) = sorted.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(CpmError::DuplicateTaskId(pair[1].id.clone()));
        }

        if let Some(record) = sorted.iter().find(|r| r.duration < Days::ZERO) {
            return Err(CpmError::NegativeDuration {
                task: record.id.clone(),
                duration: record.duration,
            });
        }

        let index: HashMap<TaskId, usize> = sorted
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        // 2. Resolve edges
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); sorted.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); sorted.len()];
        let mut diagnostics = Vec::new();

        for (task, record) in sorted.iter().enumerate() {
            let mut seen: HashSet<&str> = HashSet::new();

            for pred_id in &record.predecessors {
                if !seen.insert(pred_id.as_str()) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::H001DuplicatePredecessor,
                            format!(
                                "task '{}' lists predecessor '{}' more than once",
                                record.id, pred_id
                            ),
                        )
                        .with_task(record.id.clone()),
                    );
                    continue;
                }

                let Some(&pred) = index.get(pred_id) else {
                    warn!(task = %record.id, predecessor = %pred_id, "dropping dangling predecessor");
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::W001DanglingPredecessor,
                            format!(
                                "task '{}' depends on '{}' which doesn't exist",
                                record.id, pred_id
                            ),
                        )
                        .with_task(record.id.clone())
                        .with_note("the reference was dropped; the task is scheduled without it"),
                    );
                    continue;
                };

                predecessors[task].push(pred);
                successors[pred].push(task);
            }
        }

        for edges in predecessors.iter_mut().chain(successors.iter_mut()) {
            edges.sort_unstable();
        }

        // 3. Order (also validates acyclicity)
        let topo_order = topological_sort(&predecessors, &successors).map_err(|residual| {
            CpmError::CycleDetected {
                tasks: residual.into_iter().map(|i| sorted[i].id.clone()).collect(),
            }
        })?;

        let nodes: Vec<GraphNode> = sorted
            .into_iter()
            .map(|r| GraphNode {
                id: r.id.clone(),
                name: r.display_name().to_string(),
                planned_start: r.planned_start,
                planned_finish: r.planned_finish,
                duration: r.duration,
            })
            .collect();

        debug!(
            tasks = nodes.len(),
            edges = successors.iter().map(Vec::len).sum::<usize>(),
            findings = diagnostics.len(),
            "scheduling graph built"
        );

        Ok(Self {
            nodes,
            index,
            predecessors,
            successors,
            topo_order,
            diagnostics,
        })
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by task ID
    pub fn get(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Task ID of a node index
    pub fn id(&self, node: usize) -> &str {
        &self.nodes[node].id
    }

    /// Node has no predecessors
    pub fn is_source(&self, node: usize) -> bool {
        self.predecessors[node].is_empty()
    }

    /// Node has no successors
    pub fn is_sink(&self, node: usize) -> bool {
        self.successors[node].is_empty()
    }

    /// Task IDs of a list of node indices
    pub fn ids(&self, nodes: &[usize]) -> Vec<TaskId> {
        nodes.iter().map(|&i| self.nodes[i].id.clone()).collect()
    }
}

/// Kahn's algorithm over predecessor in-degree.
///
/// Ready nodes are taken lowest index first. On failure returns the nodes whose
/// in-degree never reached zero, ascending.
fn topological_sort(
    predecessors: &[Vec<usize>],
    successors: &[Vec<usize>],
) -> Result<Vec<usize>, Vec<usize>> {
    let mut in_degree: Vec<usize> = predecessors.iter().map(Vec::len).collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &deg)| deg == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);

        for &succ in &successors[node] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.push(Reverse(succ));
            }
        }
    }

    if order.len() != in_degree.len() {
        let residual = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg > 0)
            .map(|(i, _)| i)
            .collect();
        return Err(residual);
    }

    Ok(order)
}

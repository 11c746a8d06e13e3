//! # critpath-solver
//!
//! Scheduling solver implementing the Critical Path Method (CPM).
//!
//! This crate provides:
//! - Graph construction with dangling-reference repair and cycle detection
//! - Forward/backward pass scheduling
//! - Total and free float calculations
//! - Critical path identification (every maximal chain)
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use critpath_core::{Scheduler, TaskRecord};
//! use critpath_solver::CpmSolver;
//!
//! let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
//! let tasks = vec![
//!     TaskRecord::new("a", start).duration_days(2),
//!     TaskRecord::new("b", start).duration_days(3).depends_on("a"),
//! ];
//!
//! let analysis = CpmSolver::new().analyze(&tasks).unwrap();
//! assert_eq!(analysis.critical_paths, vec![vec!["a".to_string(), "b".to_string()]]);
//! ```

pub mod cpm;
pub mod critical;
pub mod dag;

use critpath_core::{
    sort_diagnostics, CpmAnalysis, CpmError, Diagnostic, DiagnosticCode, DiagnosticEmitter,
    ScheduledTask, Scheduler, TaskRecord,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cpm::{backward_pass, forward_pass, BackwardPass, ForwardPass};
use crate::critical::{compute_floats, extract_critical_paths, CriticalPaths, FloatValues};
use crate::dag::SchedulingGraph;

/// Tunables for an analysis run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Upper bound on enumerated critical chains
    pub max_critical_chains: usize,
    /// Append an I001 summary diagnostic to successful runs
    pub emit_summary: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_critical_chains: 256,
            emit_summary: true,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_critical_chains(mut self, limit: usize) -> Self {
        self.max_critical_chains = limit;
        self
    }

    pub fn without_summary(mut self) -> Self {
        self.emit_summary = false;
        self
    }
}

/// CPM-based scheduler
#[derive(Clone, Debug, Default)]
pub struct CpmSolver {
    config: AnalysisConfig,
}

impl CpmSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

impl Scheduler for CpmSolver {
    fn analyze(&self, tasks: &[TaskRecord]) -> Result<CpmAnalysis, CpmError> {
        let span = tracing::debug_span!("cpm_analysis", records = tasks.len());
        let _guard = span.enter();

        let graph = SchedulingGraph::from_records(tasks)?;
        let forward = forward_pass(&graph)?;
        let backward = backward_pass(&graph, &forward)?;
        let floats = compute_floats(&graph, &forward, &backward)?;
        let critical = extract_critical_paths(
            &graph,
            &forward,
            &floats,
            self.config.max_critical_chains,
        );

        let analysis = assemble(graph, &forward, &backward, &floats, critical, &self.config);

        info!(
            tasks = analysis.tasks.len(),
            critical = analysis.critical_tasks().count(),
            chains = analysis.critical_paths.len(),
            project_finish = %analysis.project_finish,
            "analysis complete"
        );

        Ok(analysis)
    }

    fn validate(&self, tasks: &[TaskRecord]) -> Result<Vec<Diagnostic>, CpmError> {
        let mut diagnostics = SchedulingGraph::from_records(tasks)?.diagnostics;
        sort_diagnostics(&mut diagnostics);
        Ok(diagnostics)
    }
}

/// Analyze a task table and forward every diagnostic to `emitter`.
///
/// On a fatal error the error is also emitted as an error diagnostic before
/// it is returned.
pub fn analyze_schedule(
    tasks: &[TaskRecord],
    config: &AnalysisConfig,
    emitter: &mut dyn DiagnosticEmitter,
) -> Result<CpmAnalysis, CpmError> {
    match CpmSolver::with_config(config.clone()).analyze(tasks) {
        Ok(analysis) => {
            for diagnostic in &analysis.diagnostics {
                emitter.emit(diagnostic.clone());
            }
            Ok(analysis)
        }
        Err(err) => {
            emitter.emit(err.to_diagnostic());
            Err(err)
        }
    }
}

/// Turn the per-node pass arrays into the public results table
fn assemble(
    graph: SchedulingGraph,
    forward: &ForwardPass,
    backward: &BackwardPass,
    floats: &FloatValues,
    critical: CriticalPaths,
    config: &AnalysisConfig,
) -> CpmAnalysis {
    let tasks: Vec<ScheduledTask> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| ScheduledTask {
            task_id: node.id.clone(),
            name: node.name.clone(),
            planned_start: node.planned_start,
            planned_finish: node.planned_finish,
            duration: node.duration,
            predecessors: graph.ids(&graph.predecessors[i]),
            successors: graph.ids(&graph.successors[i]),
            early_start: forward.early_start[i],
            early_finish: forward.early_finish[i],
            late_start: backward.late_start[i],
            late_finish: backward.late_finish[i],
            total_float: floats.total_float[i],
            free_float: floats.free_float[i],
            is_critical: floats.is_critical[i],
        })
        .collect();

    let critical_paths: Vec<Vec<String>> =
        critical.chains.iter().map(|chain| graph.ids(chain)).collect();

    let mut diagnostics = graph.diagnostics;
    diagnostics.extend(critical.diagnostics);

    let project_finish = forward.project_finish();

    if config.emit_summary {
        let critical_count = floats.is_critical.iter().filter(|&&c| c).count();
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::I001AnalysisSummary,
            format!(
                "analyzed {} task(s): {} critical, {} critical path(s), project finishes at day {}",
                tasks.len(),
                critical_count,
                critical_paths.len(),
                project_finish.normalize()
            ),
        ));
    }

    sort_diagnostics(&mut diagnostics);

    CpmAnalysis {
        project_start: forward.anchor,
        project_finish,
        tasks,
        critical_paths,
        diagnostics,
    }
}

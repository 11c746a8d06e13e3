//! # critpath-core
//!
//! Core domain model for the critpath Critical Path Method engine.
//!
//! This crate provides:
//! - Input records: `TaskRecord`
//! - Analysis results: `ScheduledTask`, `CpmAnalysis`
//! - The `Scheduler` trait implemented by solvers
//! - Error types and diagnostics
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use critpath_core::TaskRecord;
//!
//! let kickoff = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
//! let tasks = vec![
//!     TaskRecord::new("design", kickoff).name("Design").duration_days(5),
//!     TaskRecord::new("build", kickoff).duration_days(10).depends_on("design"),
//! ];
//! assert_eq!(tasks[1].predecessors, vec!["design".to_string()]);
//! ```

mod diagnostics;

pub use diagnostics::{
    sort_diagnostics, CollectingEmitter, Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity,
};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a task
pub type TaskId = String;

/// Time in days. Engine offsets are measured from the project anchor.
pub type Days = Decimal;

const SECONDS_PER_DAY: i64 = 86_400;

// ============================================================================
// Input
// ============================================================================

/// One task as handed over by the schedule export
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique identifier
    pub id: TaskId,
    /// Display label, not used in computation
    #[serde(default)]
    pub name: String,
    /// Planned start; seeds the early start of tasks without predecessors
    pub planned_start: NaiveDate,
    /// Planned finish, carried through for display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_finish: Option<NaiveDate>,
    /// Duration in days, already converted to working time
    pub duration: Days,
    /// Predecessor ids
    #[serde(default, deserialize_with = "deserialize_predecessors")]
    pub predecessors: Vec<TaskId>,
}

impl TaskRecord {
    /// Create a zero-duration record with the given ID
    pub fn new(id: impl Into<String>, planned_start: NaiveDate) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            planned_start,
            planned_finish: None,
            duration: Decimal::ZERO,
            predecessors: Vec::new(),
        }
    }

    /// Set the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the duration (fractional days allowed)
    pub fn duration(mut self, duration: Days) -> Self {
        self.duration = duration;
        self
    }

    /// Set the duration in whole days
    pub fn duration_days(mut self, days: i64) -> Self {
        self.duration = Decimal::from(days);
        self
    }

    /// Set the planned finish
    pub fn planned_finish(mut self, date: NaiveDate) -> Self {
        self.planned_finish = Some(date);
        self
    }

    /// Add a predecessor
    pub fn depends_on(mut self, predecessor: impl Into<String>) -> Self {
        self.predecessors.push(predecessor.into());
        self
    }

    /// Label for output: the name, or the id when the export had no name
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Split a comma-separated predecessor cell (`"A, B,C"`) into ids.
///
/// Blank entries are skipped.
pub fn parse_predecessor_list(raw: &str) -> Vec<TaskId> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredecessorField {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_predecessors<'de, D>(deserializer: D) -> Result<Vec<TaskId>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = match Option::<PredecessorField>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(PredecessorField::Joined(raw)) => parse_predecessor_list(&raw),
        Some(PredecessorField::List(ids)) => ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect(),
    };
    Ok(ids)
}

// ============================================================================
// Results
// ============================================================================

/// A task with its computed CPM values.
///
/// All time values are day offsets from [`CpmAnalysis::project_start`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task_id: TaskId,
    pub name: String,
    pub planned_start: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_finish: Option<NaiveDate>,
    pub duration: Days,
    /// Resolved predecessors (dangling references removed), sorted
    pub predecessors: Vec<TaskId>,
    /// Derived successors, sorted
    pub successors: Vec<TaskId>,
    pub early_start: Days,
    pub early_finish: Days,
    pub late_start: Days,
    pub late_finish: Days,
    /// Delay allowed without moving this task's chain end
    pub total_float: Days,
    /// Delay allowed without moving any successor
    pub free_float: Days,
    /// `total_float == 0`
    pub is_critical: bool,
}

impl ScheduledTask {
    pub fn is_source(&self) -> bool {
        self.predecessors.is_empty()
    }

    pub fn is_sink(&self) -> bool {
        self.successors.is_empty()
    }
}

/// Complete result of one CPM run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CpmAnalysis {
    /// Project anchor: the earliest planned start; offset 0
    pub project_start: NaiveDate,
    /// Latest early finish across all tasks (offset)
    pub project_finish: Days,
    /// One entry per input record, ordered by task id
    pub tasks: Vec<ScheduledTask>,
    /// Every maximal chain of critical tasks, each ordered source to sink
    pub critical_paths: Vec<Vec<TaskId>>,
    /// Non-fatal findings
    pub diagnostics: Vec<Diagnostic>,
}

impl CpmAnalysis {
    /// Look up a task by ID
    pub fn task(&self, id: &str) -> Option<&ScheduledTask> {
        self.tasks
            .binary_search_by(|t| t.task_id.as_str().cmp(id))
            .ok()
            .map(|i| &self.tasks[i])
    }

    /// All tasks with zero total float
    pub fn critical_tasks(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.tasks.iter().filter(|t| t.is_critical)
    }

    /// Whether the task appears in any reported critical path
    pub fn is_on_critical_path(&self, id: &str) -> bool {
        self.critical_paths
            .iter()
            .any(|path| path.iter().any(|t| t == id))
    }

    /// Convert an engine offset into a calendar timestamp.
    ///
    /// Returns `None` if the value does not fit chrono's range.
    pub fn date_at(&self, offset: Days) -> Option<NaiveDateTime> {
        let seconds = offset
            .checked_mul(Decimal::from(SECONDS_PER_DAY))?
            .round()
            .to_i64()?;
        let delta = TimeDelta::try_seconds(seconds)?;
        self.project_start
            .and_hms_opt(0, 0, 0)?
            .checked_add_signed(delta)
    }

    /// Calendar timestamp of the project finish
    pub fn project_finish_date(&self) -> Option<NaiveDateTime> {
        self.date_at(self.project_finish)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Core scheduling abstraction
pub trait Scheduler: Send + Sync {
    /// Run the full analysis: graph, forward pass, backward pass, floats, critical paths
    fn analyze(&self, tasks: &[TaskRecord]) -> Result<CpmAnalysis, CpmError>;

    /// Build the graph and order it without computing dates.
    ///
    /// Returns the diagnostics the graph builder produced.
    fn validate(&self, tasks: &[TaskRecord]) -> Result<Vec<Diagnostic>, CpmError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal analysis error. No partial results accompany it.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CpmError {
    #[error("Duplicate task id: '{0}'")]
    DuplicateTaskId(TaskId),

    #[error("Cycle detected involving tasks: {}", .tasks.join(", "))]
    CycleDetected { tasks: Vec<TaskId> },

    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("Task '{task}' has negative duration ({duration})")]
    NegativeDuration { task: TaskId, duration: Days },

    #[error("Cannot analyze an empty schedule")]
    EmptySchedule,

    #[error("Dates of task '{task}' overflow the day range")]
    DateOverflow { task: TaskId },
}

impl CpmError {
    /// Diagnostic code for this error
    pub fn code(&self) -> DiagnosticCode {
        match self {
            CpmError::DuplicateTaskId(_) => DiagnosticCode::E001DuplicateTaskId,
            CpmError::CycleDetected { .. } => DiagnosticCode::E002CycleDetected,
            CpmError::InternalInconsistency(_) => DiagnosticCode::E003InternalInconsistency,
            CpmError::NegativeDuration { .. } => DiagnosticCode::E004NegativeDuration,
            CpmError::EmptySchedule => DiagnosticCode::E005EmptySchedule,
            CpmError::DateOverflow { .. } => DiagnosticCode::E006DateOverflow,
        }
    }

    /// Render the error as an error-severity diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.code(), self.to_string());
        match self {
            CpmError::DuplicateTaskId(id) => diagnostic
                .with_task(id.clone())
                .with_hint("task ids must be unique; rename or remove one of the records"),
            CpmError::CycleDetected { tasks } => diagnostic
                .with_note(format!("{} task(s) could not be ordered", tasks.len()))
                .with_hint("remove one dependency from the loop and re-run"),
            CpmError::InternalInconsistency(_) => {
                diagnostic.with_note("this indicates an engine bug, not a data problem")
            }
            CpmError::NegativeDuration { task, .. } => diagnostic.with_task(task.clone()),
            CpmError::EmptySchedule => diagnostic,
            CpmError::DateOverflow { task } => diagnostic
                .with_task(task.clone())
                .with_hint("check the duration and planned start of this task and its predecessors"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

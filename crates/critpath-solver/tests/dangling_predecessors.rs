//! Exports are often incomplete: a predecessor id that names no task is
//! dropped with a W001 warning and the task is scheduled as if the reference
//! were absent.

use chrono::NaiveDate;
use critpath_core::{DiagnosticCode, Scheduler, Severity, TaskRecord};
use critpath_solver::CpmSolver;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

#[test]
fn dangling_reference_is_reported_and_ignored() {
    let tasks = vec![
        TaskRecord::new("a", start()).duration_days(2),
        TaskRecord::new("b", start()).duration_days(3).depends_on("a").depends_on("A9999"),
    ];
    let analysis = CpmSolver::new().analyze(&tasks).unwrap();

    let w001: Vec<_> = analysis
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::W001DanglingPredecessor)
        .collect();
    assert_eq!(w001.len(), 1);
    assert_eq!(w001[0].severity, Severity::Warning);
    assert_eq!(w001[0].task.as_deref(), Some("b"));
    assert!(w001[0].message.contains("A9999"));

    let b = analysis.task("b").unwrap();
    assert_eq!(b.predecessors, vec!["a"]);
    assert_eq!(b.early_start, dec!(2));
}

#[test]
fn task_with_only_dangling_predecessors_becomes_a_source() {
    let later = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
    let tasks = vec![
        TaskRecord::new("a", start()).duration_days(1),
        TaskRecord::new("orphan", later).duration_days(1).depends_on("gone"),
    ];
    let analysis = CpmSolver::new().analyze(&tasks).unwrap();

    let orphan = analysis.task("orphan").unwrap();
    assert!(orphan.is_source());
    assert_eq!(orphan.early_start, dec!(3));
}

#[test]
fn each_dangling_reference_gets_its_own_diagnostic() {
    let tasks = vec![
        TaskRecord::new("a", start()).depends_on("x").depends_on("y"),
        TaskRecord::new("b", start()).depends_on("x"),
    ];
    let analysis = CpmSolver::new().analyze(&tasks).unwrap();

    let count = analysis
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::W001DanglingPredecessor)
        .count();
    assert_eq!(count, 3);
}

#[test]
fn repeated_predecessor_is_a_hint() {
    let tasks = vec![
        TaskRecord::new("a", start()).duration_days(1),
        TaskRecord::new("b", start()).duration_days(1).depends_on("a").depends_on("a"),
    ];
    let analysis = CpmSolver::new().analyze(&tasks).unwrap();

    let hint = analysis
        .diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::H001DuplicatePredecessor)
        .expect("hint expected");
    assert_eq!(hint.severity, Severity::Hint);
    assert_eq!(analysis.task("a").unwrap().successors, vec!["b"]);
}

//! Analysis output rendering

use std::fmt::Write;

use critpath_core::{CpmAnalysis, Days};
use serde::Serialize;
use serde_json::Value;

const NAME_WIDTH: usize = 24;
const COLUMNS: [&str; 6] = ["ES", "EF", "LS", "LF", "TF", "FF"];

/// Document written by `--format json`
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// `null` when the analysis failed
    pub analysis: Option<&'a CpmAnalysis>,
    pub diagnostics: Value,
}

/// Render the results table followed by the critical paths
pub fn render_text(analysis: &CpmAnalysis) -> String {
    let mut out = String::new();

    let finish = analysis
        .project_finish_date()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "out of range".to_string());
    let _ = writeln!(
        out,
        "Project start: {}  finish: day {} ({})",
        analysis.project_start,
        fmt_days(analysis.project_finish),
        finish
    );
    let _ = writeln!(out);

    let id_width = analysis
        .tasks
        .iter()
        .map(|t| t.task_id.chars().count())
        .max()
        .unwrap_or(0)
        .max(2);

    let rows: Vec<[String; 6]> = analysis
        .tasks
        .iter()
        .map(|t| {
            [
                t.early_start,
                t.early_finish,
                t.late_start,
                t.late_finish,
                t.total_float,
                t.free_float,
            ]
            .map(fmt_days)
        })
        .collect();

    let num_width = rows
        .iter()
        .flatten()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(4);

    let name_width = NAME_WIDTH;
    let _ = write!(out, "{:<id_width$}  {:<name_width$}", "ID", "Name");
    for col in COLUMNS {
        let _ = write!(out, " {:>num_width$}", col);
    }
    let _ = writeln!(out, "  Crit");

    for (task, values) in analysis.tasks.iter().zip(&rows) {
        let _ = write!(
            out,
            "{:<id_width$}  {:<name_width$}",
            task.task_id,
            truncate(&task.name, NAME_WIDTH)
        );
        for value in values {
            let _ = write!(out, " {:>num_width$}", value);
        }
        let _ = writeln!(out, "  {}", if task.is_critical { "*" } else { "" });
    }

    let _ = writeln!(out);
    if analysis.critical_paths.is_empty() {
        let _ = writeln!(out, "No critical path.");
    }
    for (i, path) in analysis.critical_paths.iter().enumerate() {
        let _ = writeln!(out, "Critical path {}: {}", i + 1, path.join(" -> "));
    }

    out
}

/// Day offsets without trailing zeros
fn fmt_days(value: Days) -> String {
    value.normalize().to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(3)).collect();
        t.push_str("...");
        t
    }
}

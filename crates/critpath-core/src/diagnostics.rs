//! Diagnostics produced while analysing a schedule
//!
//! Fatal problems are reported through [`crate::CpmError`]. Everything the
//! engine can work around (a dangling predecessor, a duplicated reference, a
//! truncated chain enumeration) is recorded as a [`Diagnostic`] and returned
//! alongside the results.
//!
//! ## Code ranges
//!
//! | Prefix | Severity | Meaning |
//! |--------|----------|---------|
//! | `E` | error | fatal input or engine problem, no results |
//! | `W` | warning | input was repaired or output is incomplete |
//! | `H` | hint | harmless input oddity |
//! | `I` | info | run summary |

use serde::{Deserialize, Serialize};

use crate::TaskId;

// ============================================================================
// Severity
// ============================================================================

/// Diagnostic severity, ordered from most to least severe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Hint,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Hint => "hint",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Codes
// ============================================================================

/// Stable diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Two input records share an id
    E001DuplicateTaskId,
    /// Dependency ordering could not be resolved
    E002CycleDetected,
    /// An engine invariant was violated
    E003InternalInconsistency,
    /// A record has a negative duration
    E004NegativeDuration,
    /// No records were supplied
    E005EmptySchedule,
    /// A computed date offset does not fit the day representation
    E006DateOverflow,
    /// A predecessor id does not name any task; the reference was dropped
    W001DanglingPredecessor,
    /// A critical chain does not run from a source task to a sink task
    W002DisconnectedCriticalChain,
    /// Critical chain enumeration stopped at the configured limit
    W003CriticalChainLimit,
    /// A predecessor was listed more than once for the same task
    H001DuplicatePredecessor,
    /// Summary of a successful analysis
    I001AnalysisSummary,
}

impl DiagnosticCode {
    /// Short code as printed in output, e.g. `W001`
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::E001DuplicateTaskId => "E001",
            DiagnosticCode::E002CycleDetected => "E002",
            DiagnosticCode::E003InternalInconsistency => "E003",
            DiagnosticCode::E004NegativeDuration => "E004",
            DiagnosticCode::E005EmptySchedule => "E005",
            DiagnosticCode::E006DateOverflow => "E006",
            DiagnosticCode::W001DanglingPredecessor => "W001",
            DiagnosticCode::W002DisconnectedCriticalChain => "W002",
            DiagnosticCode::W003CriticalChainLimit => "W003",
            DiagnosticCode::H001DuplicatePredecessor => "H001",
            DiagnosticCode::I001AnalysisSummary => "I001",
        }
    }

    /// Severity a diagnostic with this code carries before any policy is applied
    pub fn default_severity(self) -> Severity {
        match self.as_str().as_bytes()[0] {
            b'E' => Severity::Error,
            b'W' => Severity::Warning,
            b'H' => Severity::Hint,
            _ => Severity::Info,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Diagnostic
// ============================================================================

/// A single finding about the analysed schedule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Task the diagnostic is about, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            task: None,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Create an error-severity diagnostic regardless of the code's default
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::new(code, message)
        }
    }

    pub fn with_task(mut self, task: impl Into<TaskId>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Sort diagnostics into their canonical order (task, code, message)
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.task
            .cmp(&b.task)
            .then(a.code.cmp(&b.code))
            .then_with(|| a.message.cmp(&b.message))
    });
}

// ============================================================================
// Emitters
// ============================================================================

/// Sink for diagnostics
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Emitter that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any diagnostic with this code was emitted
    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    /// Number of diagnostics with this code
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

impl DiagnosticEmitter for CollectingEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_severity_follows_code_prefix() {
        assert_eq!(DiagnosticCode::E002CycleDetected.default_severity(), Severity::Error);
        assert_eq!(
            DiagnosticCode::W001DanglingPredecessor.default_severity(),
            Severity::Warning
        );
        assert_eq!(DiagnosticCode::H001DuplicatePredecessor.default_severity(), Severity::Hint);
        assert_eq!(DiagnosticCode::I001AnalysisSummary.default_severity(), Severity::Info);
    }

    #[test]
    fn builder_collects_notes_and_hints() {
        let diag = Diagnostic::new(DiagnosticCode::W001DanglingPredecessor, "missing 'x'")
            .with_task("b")
            .with_note("reference dropped")
            .with_hint("check the export");

        assert_eq!(diag.task.as_deref(), Some("b"));
        assert_eq!(diag.notes, vec!["reference dropped".to_string()]);
        assert_eq!(diag.hints, vec!["check the export".to_string()]);
        assert!(!diag.is_error());
    }

    #[test]
    fn error_constructor_overrides_severity() {
        let diag = Diagnostic::error(DiagnosticCode::W002DisconnectedCriticalChain, "broken");
        assert!(diag.is_error());
    }

    #[test]
    fn sort_orders_by_task_then_code() {
        let mut diags = vec![
            Diagnostic::new(DiagnosticCode::W001DanglingPredecessor, "z").with_task("b"),
            Diagnostic::new(DiagnosticCode::H001DuplicatePredecessor, "y").with_task("a"),
            Diagnostic::new(DiagnosticCode::W001DanglingPredecessor, "x").with_task("a"),
            Diagnostic::new(DiagnosticCode::I001AnalysisSummary, "summary"),
        ];
        sort_diagnostics(&mut diags);

        let order: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(order, vec!["summary", "x", "y", "z"]);
    }

    #[test]
    fn collecting_emitter_counts() {
        let mut emitter = CollectingEmitter::new();
        emitter.emit(Diagnostic::new(DiagnosticCode::W001DanglingPredecessor, "a"));
        emitter.emit(Diagnostic::new(DiagnosticCode::W001DanglingPredecessor, "b"));
        emitter.emit(Diagnostic::new(DiagnosticCode::I001AnalysisSummary, "done"));

        assert!(emitter.has(DiagnosticCode::W001DanglingPredecessor));
        assert_eq!(emitter.count(DiagnosticCode::W001DanglingPredecessor), 2);
        assert!(!emitter.has(DiagnosticCode::E002CycleDetected));
        assert!(!emitter.has_errors());
    }
}

//! Diagnostic output for the `critpath` binary
//!
//! Engine findings reach the user through one of two emitters:
//! `TerminalEmitter` writes rustc-style blocks to stderr, `JsonEmitter`
//! buffers them for the `diagnostics` array of `--format json`.
//!
//! Both apply the same [`DiagnosticConfig`] policy. `strict` raises warnings
//! to errors and hints to warnings. `quiet` hides everything below error.
//!
//! The process exits with 1 when at least one diagnostic ends up as an error
//! after policy, otherwise 0. Hidden diagnostics still count.

use std::io::Write;
use std::process;

use critpath_core::{Diagnostic, DiagnosticEmitter, Severity};
use serde::Serialize;

// ============================================================================
// Exit status
// ============================================================================

/// Process exit status of a `critpath` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Nothing reached error severity
    Success = 0,
    /// At least one error after policy
    Failure = 1,
}

impl ExitCode {
    pub fn from_error_count(errors: usize) -> Self {
        if errors == 0 {
            Self::Success
        } else {
            Self::Failure
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Severity policy selected by `--strict` / `--quiet` and the config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticConfig {
    pub strict: bool,
    pub quiet: bool,
}

impl DiagnosticConfig {
    /// Severity after `strict` escalation
    pub fn effective_severity(&self, severity: Severity) -> Severity {
        match (self.strict, severity) {
            (true, Severity::Warning) => Severity::Error,
            (true, Severity::Hint) => Severity::Warning,
            (_, other) => other,
        }
    }

    /// Whether a diagnostic of this effective severity is printed
    pub fn is_visible(&self, effective: Severity) -> bool {
        !self.quiet || effective == Severity::Error
    }
}

/// Running error/warning counts after policy
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    errors: usize,
    warnings: usize,
}

impl Tally {
    fn record(&mut self, effective: Severity) {
        match effective {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Hint | Severity::Info => {}
        }
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Writes diagnostics as
///
/// ```text
/// warning[W001]: task 'B' depends on 'Z' which doesn't exist
///   --> task 'B'
///    |
///    = the reference was dropped; the task is scheduled without it
/// ```
pub struct TerminalEmitter<W: Write> {
    writer: W,
    config: DiagnosticConfig,
    tally: Tally,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, config: DiagnosticConfig) -> Self {
        Self {
            writer,
            config,
            tally: Tally::default(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.tally.errors
    }

    pub fn warning_count(&self) -> usize {
        self.tally.warnings
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.tally.errors)
    }

    fn render(&mut self, diagnostic: &Diagnostic, severity: Severity) -> std::io::Result<()> {
        let out = &mut self.writer;
        writeln!(
            out,
            "{}[{}]: {}",
            severity,
            diagnostic.code.as_str(),
            diagnostic.message
        )?;
        if let Some(task) = &diagnostic.task {
            writeln!(out, "  --> task '{task}'")?;
        }
        if !diagnostic.notes.is_empty() {
            writeln!(out, "   |")?;
        }
        for note in &diagnostic.notes {
            writeln!(out, "   = {note}")?;
        }
        for hint in &diagnostic.hints {
            writeln!(out, "   = hint: {hint}")?;
        }
        writeln!(out)
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let severity = self.config.effective_severity(diagnostic.severity);
        self.tally.record(severity);

        if self.config.is_visible(severity) {
            let _ = self.render(&diagnostic, severity);
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

/// One entry of the `diagnostics` array in JSON output
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: &'static str,
    pub severity: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

/// Buffers visible diagnostics for the JSON document
pub struct JsonEmitter {
    config: DiagnosticConfig,
    entries: Vec<JsonDiagnostic>,
    tally: Tally,
}

impl JsonEmitter {
    pub fn new(config: DiagnosticConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            tally: Tally::default(),
        }
    }

    pub fn entries(&self) -> &[JsonDiagnostic] {
        &self.entries
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.tally.errors)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(&self.entries).unwrap_or(serde_json::Value::Null)
    }
}

impl DiagnosticEmitter for JsonEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let severity = self.config.effective_severity(diagnostic.severity);
        self.tally.record(severity);

        if !self.config.is_visible(severity) {
            return;
        }

        self.entries.push(JsonDiagnostic {
            code: diagnostic.code.as_str(),
            severity: severity.as_str(),
            message: diagnostic.message,
            task: diagnostic.task,
            notes: diagnostic.notes,
            hints: diagnostic.hints,
        });
    }
}

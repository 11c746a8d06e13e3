//! TOML configuration for the CLI
//!
//! ```toml
//! [analysis]
//! max_critical_chains = 64
//! emit_summary = false
//!
//! [diagnostics]
//! strict = true
//! quiet = false
//! ```
//!
//! Every key is optional. Command-line flags can switch `strict` and `quiet`
//! on but never off.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use critpath_solver::AnalysisConfig;
use serde::Deserialize;

use crate::diagnostics::DiagnosticConfig;

/// Contents of a `critpath.toml` file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub analysis: AnalysisConfig,
    pub diagnostics: DiagnosticSettings,
}

/// The `[diagnostics]` table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticSettings {
    pub strict: bool,
    pub quiet: bool,
}

impl Settings {
    /// Load settings from `path`, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let settings = Self::from_toml(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?settings, "loaded config");
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Merge the `[diagnostics]` table with command-line flags
    pub fn diagnostic_config(&self, strict: bool, quiet: bool) -> DiagnosticConfig {
        DiagnosticConfig {
            strict: strict || self.diagnostics.strict,
            quiet: quiet || self.diagnostics.quiet,
        }
    }
}

//! critpath CLI - Critical Path Method engine
//!
//! Command-line interface for checking and analyzing exported task tables.

mod config;
mod diagnostics;
mod input;
mod report;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use critpath_core::{DiagnosticEmitter, Scheduler};
use critpath_solver::{analyze_schedule, CpmSolver};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Settings;
use crate::diagnostics::{DiagnosticConfig, ExitCode, JsonEmitter, TerminalEmitter};
use crate::report::JsonReport;

#[derive(Parser)]
#[command(name = "critpath")]
#[command(author, version, about = "Critical path analysis for exported schedules", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH", global = true, env = "CRITPATH_CONFIG")]
    config: Option<PathBuf>,

    /// Treat warnings as errors
    #[arg(long, global = true)]
    strict: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a task table without computing dates
    Check {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Run the critical path analysis
    Analyze {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<process::ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;
    let diagnostics = settings.diagnostic_config(cli.strict, cli.quiet);

    let code = match cli.command {
        Commands::Check { file } => cmd_check(&file, &settings, diagnostics)?,
        Commands::Analyze {
            file,
            format,
            output,
        } => cmd_analyze(&file, format, output.as_deref(), &settings, diagnostics)?,
    };

    Ok(code.into())
}

/// Logs go to stderr so JSON on stdout stays parseable.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn cmd_check(file: &Path, settings: &Settings, config: DiagnosticConfig) -> Result<ExitCode> {
    let tasks = input::load_tasks(file)?;
    let mut emitter = TerminalEmitter::new(io::stderr(), config);

    let solver = CpmSolver::with_config(settings.analysis.clone());
    match solver.validate(&tasks) {
        Ok(found) => {
            for diagnostic in found {
                emitter.emit(diagnostic);
            }
        }
        Err(err) => emitter.emit(err.to_diagnostic()),
    }

    let code = emitter.exit_code();
    if code.is_success() && !config.quiet {
        println!(
            "{}: {} task(s), {} warning(s)",
            file.display(),
            tasks.len(),
            emitter.warning_count()
        );
    }
    Ok(code)
}

fn cmd_analyze(
    file: &Path,
    format: OutputFormat,
    output: Option<&Path>,
    settings: &Settings,
    config: DiagnosticConfig,
) -> Result<ExitCode> {
    let tasks = input::load_tasks(file)?;

    match format {
        OutputFormat::Text => {
            let mut emitter = TerminalEmitter::new(io::stderr(), config);
            if let Ok(analysis) = analyze_schedule(&tasks, &settings.analysis, &mut emitter) {
                write_output(output, &report::render_text(&analysis))?;
            }
            Ok(emitter.exit_code())
        }
        OutputFormat::Json => {
            let mut emitter = JsonEmitter::new(config);
            let analysis = analyze_schedule(&tasks, &settings.analysis, &mut emitter).ok();
            let report = JsonReport {
                analysis: analysis.as_ref(),
                diagnostics: emitter.to_json_value(),
            };
            let mut rendered = serde_json::to_string_pretty(&report)?;
            rendered.push('\n');
            write_output(output, &rendered)?;
            Ok(emitter.exit_code())
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

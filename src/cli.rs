//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::docker_engine::DockerEngine;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::terminal::{heading, tagged, Tone};
use crate::domain::algorithm::AlgorithmLanguage;
use crate::domain::error::LeanboxError;
use crate::domain::generated::{self, list_generated};
use crate::domain::invocation::{self, RunOutcome};
use crate::domain::menu::{Menu, MenuAction};
use crate::domain::results::{tail_lines, RunDetail, RunIndex};
use crate::domain::strategy_check::check_source;
use crate::domain::workspace::{Workspace, RUN_LOG_FILE};
use crate::ports::config_port::ConfigPort;
use crate::ports::engine_port::EnginePort;

pub const DEFAULT_CONFIG_FILE: &str = "leanbox.ini";
pub const LOG_ENV_VAR: &str = "LEANBOX_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "leanbox",
    about = "Run algorithms in a Lean engine container and collect the results"
)]
pub struct Cli {
    /// INI configuration file (default: ./leanbox.ini when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an algorithm in the engine and harvest its artifacts
    #[command(name = "run_backtest", alias = "run-backtest")]
    RunBacktest { algorithm: Option<String> },
    /// List all results, or show one algorithm's results in detail
    #[command(name = "view_results", alias = "view-results")]
    ViewResults { algorithm: Option<String> },
    /// Pick a demo backtest from a menu
    #[command(name = "backtest_menu", alias = "backtest-menu")]
    BacktestMenu,
    /// Check a strategy source file for the structure the engine expects
    Validate { file: PathBuf },
    /// Write a strategy from the built-in template into the generated directory
    Generate {
        /// Class name of the new strategy
        name: String,
        /// What the strategy should do; stored in its metadata
        #[arg(short, long)]
        description: String,
        /// python or csharp
        #[arg(short, long, default_value = "python")]
        language: AlgorithmLanguage,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_tracing(&config);
    if !config.get_bool("display", "color", true) {
        colored::control::set_override(false);
    }

    let workspace = match Workspace::from_config(&config) {
        Ok(w) => w,
        Err(e) => return finish(Err(e), &mut io::stderr()),
    };
    let engine = DockerEngine::from_config(&config);
    tracing::debug!(?workspace, ?engine, "configuration resolved");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();
    dispatch(
        cli.command,
        &engine,
        &workspace,
        &mut stdin.lock(),
        &mut stdout.lock(),
        &mut stderr.lock(),
    )
}

/// Run one subcommand against `engine` and `workspace`. Errors are reported
/// on `err` and mapped to the process exit status.
pub fn dispatch(
    command: Command,
    engine: &dyn EnginePort,
    workspace: &Workspace,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> ExitCode {
    let result = match command {
        Command::RunBacktest { algorithm } => {
            backtest_command(engine, workspace, algorithm.as_deref(), out)
        }
        Command::ViewResults { algorithm } => {
            view_results_command(workspace, algorithm.as_deref(), out)
        }
        Command::BacktestMenu => menu_command(&Menu::standard(), input, engine, workspace, out),
        Command::Validate { file } => validate_command(&file, out),
        Command::Generate {
            name,
            description,
            language,
        } => generate_command(workspace, &name, &description, language, out),
    };
    finish(result, err)
}

/// Load an explicit config file, or `leanbox.ini` if it exists, or nothing.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ExitCode> {
    let path = match path {
        Some(p) => p,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
        None => return Ok(FileConfigAdapter::empty()),
    };
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = LeanboxError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        finish(Err(err), &mut io::stderr())
    })
}

fn init_tracing(config: &dyn ConfigPort) {
    let directive = std::env::var(LOG_ENV_VAR)
        .unwrap_or_else(|_| config.get_string_or("logging", "level", "warn"));
    let filter = tracing_subscriber::EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("{}", tagged(Tone::Warn, &format!("invalid log filter '{directive}': {e}")));
        tracing_subscriber::EnvFilter::new("warn")
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn finish(result: Result<(), LeanboxError>, err: &mut dyn Write) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Err(write_err) = report_error(&e, err) {
                tracing::warn!(error = %write_err, "could not report error");
            }
            (&e).into()
        }
    }
}

fn report_error(error: &LeanboxError, err: &mut dyn Write) -> io::Result<()> {
    writeln!(err, "{}", tagged(Tone::Error, &error.to_string()))?;
    if let LeanboxError::MissingAlgorithm { .. } = error {
        writeln!(err, "Usage: leanbox run_backtest <algorithm-name>")?;
    }
    if let Some(available) = error.alternatives() {
        writeln!(err, "Available algorithms:")?;
        if available.is_empty() {
            writeln!(err, "  (none)")?;
        }
        for name in available {
            writeln!(err, "  - {name}")?;
        }
    }
    err.flush()
}

/// Inject, run and harvest one algorithm, then echo the tail of its log.
pub fn backtest_command(
    engine: &dyn EnginePort,
    workspace: &Workspace,
    name: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), LeanboxError> {
    let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
        return Err(LeanboxError::MissingAlgorithm {
            available: workspace.store().list(),
        });
    };

    writeln!(out, "{}", tagged(Tone::Info, &format!("Running backtest: {name}")))?;
    out.flush()?;
    let outcome = invocation::run_backtest(engine, workspace, name)?;
    write_run_outcome(&outcome, workspace, out)
}

fn write_run_outcome(
    outcome: &RunOutcome,
    workspace: &Workspace,
    out: &mut dyn Write,
) -> Result<(), LeanboxError> {
    let report = &outcome.harvest;
    writeln!(
        out,
        "{}",
        tagged(
            Tone::Success,
            &format!("Backtest complete, results in {}", outcome.run_dir.display())
        )
    )?;

    for path in report.harvested() {
        if let Some(file) = path.file_name() {
            writeln!(out, "  + {}", file.to_string_lossy())?;
        }
    }
    for failed in report.failures() {
        if let Err(e) = &failed.result {
            writeln!(
                out,
                "{}",
                tagged(Tone::Warn, &format!("could not copy {}: {e}", failed.source))
            )?;
        }
    }
    if let Some(e) = &report.search_failure {
        writeln!(out, "{}", tagged(Tone::Warn, &format!("artifact search failed: {e}")))?;
    }

    if !report.log_harvested() {
        writeln!(
            out,
            "{}",
            tagged(
                Tone::Info,
                &format!("no engine log found at {}", report.log.source)
            )
        )?;
        return Ok(());
    }

    let bytes = fs::read(outcome.run_dir.join(RUN_LOG_FILE))?;
    let log = String::from_utf8_lossy(&bytes);
    writeln!(
        out,
        "\n{}",
        heading(&format!("Last {} lines of {RUN_LOG_FILE}", workspace.tail_lines))
    )?;
    for line in tail_lines(&log, workspace.tail_lines) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Listing mode without a name, detail mode with one.
pub fn view_results_command(
    workspace: &Workspace,
    name: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), LeanboxError> {
    match name {
        None => write_listing(workspace, out),
        Some(name) => {
            let detail = RunDetail::load(&workspace.results, name)?;
            write_detail(&detail, out)
        }
    }
}

fn write_listing(workspace: &Workspace, out: &mut dyn Write) -> Result<(), LeanboxError> {
    writeln!(out, "{}", heading("Backtest Results"))?;
    let mut count = 0;
    for entry in RunIndex::new(&workspace.results).entries() {
        count += 1;
        writeln!(out, "  {}", entry.name)?;
        if let Some(summary) = entry.summary {
            writeln!(out, "      {summary}")?;
        }
    }
    if count == 0 {
        writeln!(
            out,
            "{}",
            tagged(
                Tone::Info,
                &format!(
                    "no results in {}; run `leanbox run_backtest <name>` first",
                    workspace.results.display()
                )
            )
        )?;
    }
    Ok(())
}

fn write_detail(detail: &RunDetail, out: &mut dyn Write) -> Result<(), LeanboxError> {
    writeln!(out, "{}", heading(&format!("Results: {}", detail.name)))?;
    writeln!(out, "Directory: {}\n", detail.dir.display())?;
    for file in &detail.files {
        let modified = file
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(out, "  {:<40} {:>12} bytes  {}", file.name, file.size, modified)?;
    }

    if let Some(log) = &detail.log {
        writeln!(out, "\n{}", heading(RUN_LOG_FILE))?;
        out.write_all(log)?;
        if !log.ends_with(b"\n") {
            writeln!(out)?;
        }
    }

    for (name, view) in &detail.json {
        writeln!(out, "\n{}", heading(name))?;
        writeln!(out, "{}", view.text())?;
    }

    if !detail.csv.is_empty() {
        writeln!(out)?;
        for (name, summary) in &detail.csv {
            writeln!(
                out,
                "  {name}: {} rows, columns: {}",
                summary.records,
                summary.columns.join(", ")
            )?;
        }
    }
    Ok(())
}

/// Show `menu`, read one choice from `input` and carry it out.
pub fn menu_command(
    menu: &Menu,
    input: &mut dyn BufRead,
    engine: &dyn EnginePort,
    workspace: &Workspace,
    out: &mut dyn Write,
) -> Result<(), LeanboxError> {
    writeln!(out, "{}", heading("Lean Backtest Menu"))?;
    for entry in menu.entries() {
        writeln!(out, "  {}) {}", entry.key, entry.label)?;
    }
    write!(out, "\nEnter choice: ")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    writeln!(out)?;

    match menu.select(&line)? {
        MenuAction::RunBacktest(name) => {
            backtest_command(engine, workspace, Some(name.as_str()), out)
        }
        MenuAction::ListGenerated => generated_command(workspace, out),
        MenuAction::Exit => {
            writeln!(out, "Goodbye!")?;
            Ok(())
        }
    }
}

pub fn generated_command(workspace: &Workspace, out: &mut dyn Write) -> Result<(), LeanboxError> {
    let strategies = list_generated(&workspace.generated)?;
    writeln!(out, "{}", heading("Generated Strategies"))?;
    if strategies.is_empty() {
        writeln!(
            out,
            "{}",
            tagged(
                Tone::Info,
                &format!("no generated strategies in {}", workspace.generated.display())
            )
        )?;
        return Ok(());
    }
    for strategy in &strategies {
        writeln!(
            out,
            "  {}.{} ({})",
            strategy.name,
            strategy.language.extension(),
            strategy.language
        )?;
        if let Some(meta) = &strategy.meta {
            writeln!(out, "      {} [{}]", meta.description, meta.timestamp)?;
        }
    }
    Ok(())
}

pub fn validate_command(path: &Path, out: &mut dyn Write) -> Result<(), LeanboxError> {
    let file = path.display().to_string();
    let language = AlgorithmLanguage::from_path(path)
        .ok_or_else(|| LeanboxError::UnsupportedLanguage { file: file.clone() })?;
    let code = fs::read_to_string(path)?;
    let report = check_source(&code, language);

    writeln!(out, "Validating {file} ({language})")?;
    for error in &report.errors {
        writeln!(out, "{}", tagged(Tone::Error, error))?;
    }
    for warning in &report.warnings {
        writeln!(out, "{}", tagged(Tone::Warn, warning))?;
    }
    if !report.valid {
        return Err(LeanboxError::StrategyInvalid {
            file,
            errors: report.errors.len(),
        });
    }
    writeln!(
        out,
        "{}",
        tagged(Tone::Success, &format!("valid, score {}/100", report.score))
    )?;
    Ok(())
}

/// Render, check and save a strategy, then show where it went.
pub fn generate_command(
    workspace: &Workspace,
    name: &str,
    description: &str,
    language: AlgorithmLanguage,
    out: &mut dyn Write,
) -> Result<(), LeanboxError> {
    let saved = generated::generate(&workspace.generated, name, description, language)?;
    for warning in &saved.check.warnings {
        writeln!(out, "{}", tagged(Tone::Warn, warning))?;
    }
    writeln!(
        out,
        "{}",
        tagged(
            Tone::Success,
            &format!("saved {} (score {}/100)", saved.source.display(), saved.check.score)
        )
    )?;
    writeln!(out, "  metadata: {}", saved.meta_path.display())?;
    Ok(())
}

mod common;
mod format;
mod logic;
mod storage;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::split_csv;
use infracraft_game::{
    CompletionStore, MemoryCompletionStore, PlayerLayout, PuzzleEngine, ScenarioCatalog,
    Submission,
};
use logic::{LogicTester, PlanResult, expand_plan_keys, find_plan};
use storage::JsonFileCompletionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Validate a layout file against one scenario
    Validate,
    /// Run the built-in playthrough plans against the catalog
    Playthrough,
    /// Show recorded completions for a scenario
    History,
}

#[derive(Debug, Parser)]
#[command(name = "infracraft-tester", version = "0.1.0")]
#[command(about = "Layout validation and playthrough checks for Infracraft puzzle scenarios")]
struct Args {
    /// What to run: validate a layout, run playthrough plans, or show history
    #[arg(long, value_enum, default_value_t = Mode::Playthrough)]
    mode: Mode,

    /// Scenario id (validate and history modes)
    #[arg(long)]
    scenario: Option<String>,

    /// Layout JSON file (validate mode)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Scenario catalog JSON file replacing the embedded fixtures
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Playthrough plans to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    plans: String,

    /// Number of iterations per plan (playthrough mode only)
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// List all catalog scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Completion history file; successful validations are appended to it
    #[arg(long)]
    history: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let catalog = load_catalog(args.catalog.as_deref())?;

    if maybe_list_scenarios(&args, &catalog)? {
        return Ok(());
    }

    announce_banner();

    let passed = match args.mode {
        Mode::Validate => run_validate(&args, catalog)?,
        Mode::Playthrough => run_playthrough(&args, &catalog)?,
        Mode::History => run_history(&args, catalog)?,
    };

    if !passed {
        std::process::exit(1);
    }

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<ScenarioCatalog> {
    let Some(path) = path else {
        return Ok(ScenarioCatalog::default_catalog().clone());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    let catalog = ScenarioCatalog::from_json(&raw)
        .with_context(|| format!("invalid catalog {}", path.display()))?;
    log::info!("loaded {} scenarios from {}", catalog.len(), path.display());
    Ok(catalog)
}

fn read_layout(path: &Path) -> Result<PlayerLayout> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read layout {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid layout {}", path.display()))
}

fn maybe_list_scenarios(args: &Args, catalog: &ScenarioCatalog) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for scenario in catalog {
        writeln!(
            output_target.writer(),
            "  {:20} - {} [{}]",
            scenario.id,
            scenario.name,
            scenario.bottleneck
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🏗️  Infracraft Tester".bright_cyan().bold());
    println!("{}", "=====================".cyan());
}

fn required<'a, T: ?Sized>(value: Option<&'a T>, flag: &str, mode: &str) -> Result<&'a T> {
    value.with_context(|| format!("{flag} is required in {mode} mode"))
}

fn run_validate(args: &Args, catalog: ScenarioCatalog) -> Result<bool> {
    let scenario_id = required(args.scenario.as_deref(), "--scenario", "validate")?;
    let layout_path = required(args.layout.as_deref(), "--layout", "validate")?;
    let layout = read_layout(layout_path)?;

    if let Some(history) = &args.history {
        let engine = PuzzleEngine::new(catalog, JsonFileCompletionStore::new(history));
        let submission = engine
            .submit(scenario_id, &layout, Utc::now().timestamp_millis())
            .context("failed to submit layout")?;
        if submission.recorded {
            println!("📝 Completion recorded in {}", history.display());
        }
        report_validation(args, &engine, scenario_id, &submission)
    } else {
        let engine = PuzzleEngine::new(catalog, MemoryCompletionStore::new());
        let validation = engine
            .validate(scenario_id, &layout)
            .context("failed to validate layout")?;
        let submission = Submission {
            validation,
            recorded: false,
        };
        report_validation(args, &engine, scenario_id, &submission)
    }
}

fn report_validation<S: CompletionStore>(
    args: &Args,
    engine: &PuzzleEngine<S>,
    scenario_id: &str,
    submission: &Submission,
) -> Result<bool> {
    let scenario = engine
        .scenario(scenario_id)
        .with_context(|| format!("unknown scenario '{scenario_id}'"))?;
    let validation = &submission.validation;
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            writeln!(
                &mut output_target,
                "{}",
                serde_json::to_string_pretty(validation)?
            )?;
        }
        "markdown" => {
            logic::reports::generate_validation_markdown(&mut output_target, scenario, validation)?;
        }
        _ => {
            logic::reports::generate_validation_console(&mut output_target, scenario, validation)?;
        }
    }

    output_target.flush_inner()?;
    Ok(validation.is_successful())
}

fn run_playthrough(args: &Args, catalog: &ScenarioCatalog) -> Result<bool> {
    let start_time = Instant::now();
    let keys = expand_plan_keys(&split_csv(&args.plans));

    println!("{}", "🧪 Running Playthrough Plans".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(catalog, args.verbose);
    let mut results = Vec::new();
    for key in &keys {
        let Some(plan) = find_plan(key) else {
            eprintln!("⚠️  Unknown plan: {}", key.yellow());
            continue;
        };
        if args.verbose {
            println!("   {}", plan.description.dimmed());
        }
        results.push(tester.run_plan(&plan, args.iterations));
    }

    write_reports(args, &results, start_time)?;
    Ok(results.iter().all(|r| r.passed))
}

fn write_reports(args: &Args, results: &[PlanResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Infracraft Playthrough Results\n\n_No plans executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No playthrough plans executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

fn run_history(args: &Args, catalog: ScenarioCatalog) -> Result<bool> {
    let scenario_id = required(args.scenario.as_deref(), "--scenario", "history")?;
    let history = required(args.history.as_deref(), "--history", "history")?;
    if catalog.get(scenario_id).is_none() {
        eprintln!("⚠️  Scenario {} is not in the catalog", scenario_id.yellow());
    }

    let engine = PuzzleEngine::new(catalog, JsonFileCompletionStore::new(history));
    let completions = engine
        .completions(scenario_id)
        .context("failed to load completion history")?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    if args.report == "json" {
        writeln!(
            &mut output_target,
            "{}",
            serde_json::to_string_pretty(&completions)?
        )?;
    } else {
        logic::reports::generate_history_report(&mut output_target, scenario_id, &completions)?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

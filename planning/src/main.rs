//! Planning helpers that sit next to `wtprep`.
//!
//! `planning new` scaffolds an implementation plan; `planning audit` refuses
//! a plan whose code changes have no tests yet.

mod audit;
mod template;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use wtprep::exit_codes;
use wtprep::logging;
use wtprep::report::{ConsoleProgress, Progress};

use crate::audit::{audit, parse_plan};
use crate::template::{DEFAULT_COMPONENT, PLAN_FILE, create_plan};

#[derive(Parser)]
#[command(name = "planning", version, about = "Scaffold and audit implementation plans")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a plan skeleton for a goal.
    New {
        /// What the change should achieve.
        goal: String,
        /// Component heading in the plan.
        #[arg(long, default_value = DEFAULT_COMPONENT)]
        component: String,
    },
    /// Check that every planned code file has a test.
    Audit {
        #[arg(long, default_value = PLAN_FILE)]
        plan: PathBuf,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    logging::init();
    let cwd = match std::env::current_dir().context("resolve current directory") {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    };
    match run(cli, &cwd, &ConsoleProgress) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run<P: Progress + ?Sized>(cli: Cli, cwd: &Path, progress: &P) -> Result<i32> {
    match cli.command {
        Command::New { goal, component } => cmd_new(cwd, &goal, &component, progress),
        Command::Audit { plan } => cmd_audit(cwd, &cwd.join(plan), progress),
    }
}

fn cmd_new<P: Progress + ?Sized>(
    cwd: &Path,
    goal: &str,
    component: &str,
    progress: &P,
) -> Result<i32> {
    let created = create_plan(cwd, goal, component, Utc::now().timestamp())?;
    let name = created
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if created.displaced {
        progress.warning(&format!("{PLAN_FILE} already exists. Writing {name} instead."));
    }
    info!(path = %created.path.display(), "plan created");
    progress.success(&format!("Created {name}"));
    progress.info("Action: Fill this file with concrete steps now.");
    Ok(exit_codes::OK)
}

fn cmd_audit<P: Progress + ?Sized>(cwd: &Path, plan: &Path, progress: &P) -> Result<i32> {
    if !plan.exists() {
        progress.failure(&format!("{} not found.", plan.display()));
        return Ok(exit_codes::INVALID);
    }
    let contents =
        fs::read_to_string(plan).with_context(|| format!("read {}", plan.display()))?;
    let changes = parse_plan(&contents);
    if changes.is_empty() {
        progress.failure("No files found in plan.");
        return Ok(exit_codes::INVALID);
    }

    progress.info(&format!("Checking {} files from plan...", changes.len()));
    let report = audit(cwd, &changes);
    if report.passed() {
        progress.success("Test check passed: all planned code files have corresponding tests.");
        return Ok(exit_codes::OK);
    }

    progress.failure("VIOLATION: these files require tests before implementation:");
    for path in &report.missing {
        progress.failure(&format!("  - {path}"));
    }
    progress.info("Action: Create the test file first (e.g. tests/test_feature.py).");
    Ok(exit_codes::INVALID)
}

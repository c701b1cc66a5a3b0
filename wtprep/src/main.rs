//! Provision an isolated git worktree with dependencies installed and a
//! verified test baseline.
//!
//! Run from the repository root: `wtprep <branch-name> <directory-preference>`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use wtprep::core::request::WorktreeRequest;
use wtprep::exit_codes;
use wtprep::io::config::{CONFIG_FILE, load_config};
use wtprep::io::process::SystemExecutor;
use wtprep::logging;
use wtprep::provision::provision;
use wtprep::report::ConsoleProgress;

#[derive(Parser, Debug)]
#[command(
    name = "wtprep",
    version,
    about = "Create an isolated git worktree and verify its baseline"
)]
struct Cli {
    /// Branch to create; also names the worktree directory.
    branch_name: String,
    /// Parent directory for worktrees (`.worktrees`, `worktrees`, or anything
    /// else to auto-detect).
    directory_preference: String,
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
            // Printing help or usage to a closed pipe is not worth reporting.
            let _ = err.print();
            std::process::exit(code);
        }
    };

    logging::init();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_codes::INVALID);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = std::env::current_dir().context("resolve current directory")?;
    let config = load_config(&root.join(CONFIG_FILE))?;
    debug!(?config, "loaded config");

    let request = WorktreeRequest::new(cli.branch_name, cli.directory_preference)?;
    let executor = SystemExecutor::from_config(&config);
    provision(&root, &request, &executor, &ConsoleProgress)?;
    Ok(())
}

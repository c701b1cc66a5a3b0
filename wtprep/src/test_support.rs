//! Test-only helpers: throwaway repositories, scripted commands, captured output.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use tempfile::TempDir;

use crate::core::types::{CommandOutcome, ShellCommand};
use crate::io::process::{Executor, SystemExecutor};
use crate::report::{Progress, Status, format_line};

/// A git repository with one commit, deleted on drop.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Repository whose initial commit contains only `README.md`.
    pub fn new() -> Result<Self> {
        Self::with_files(&[])
    }

    /// Repository whose initial commit contains `README.md` plus `files`.
    pub fn with_files(files: &[(&str, &str)]) -> Result<Self> {
        let dir = tempfile::tempdir().context("tempdir")?;
        let repo = Self { dir };
        repo.git(&["init", "-q"])?;
        repo.git(&["config", "user.email", "test@test.com"])?;
        repo.git(&["config", "user.name", "Test"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        repo.write("README.md", "# Test\n")?;
        for (name, contents) in files {
            repo.write(name, contents)?;
        }
        repo.git(&["add", "."])?;
        repo.git(&["commit", "-q", "-m", "Initial commit"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the repository root (not committed).
    pub fn write(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Current branch of the checkout at `dir`.
    pub fn branch_of(&self, dir: &Path) -> Result<String> {
        let out = run_git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(out.trim().to_string())
    }

    /// Contents of the root `.gitignore`, or empty if absent.
    pub fn gitignore(&self) -> String {
        fs::read_to_string(self.path().join(".gitignore")).unwrap_or_default()
    }

    pub fn git(&self, args: &[&str]) -> Result<String> {
        run_git(self.path(), args)
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("run git {}", args.join(" ")))?;
    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

type Reply = Box<dyn Fn(&Path) -> Result<CommandOutcome>>;

struct ScriptedResponse {
    program: String,
    args: Vec<String>,
    reply: Reply,
}

/// Executor that answers chosen commands from a script and runs the rest for real.
///
/// Responses are consumed in the order they were queued for a given command,
/// so the same command can be scripted to fail and then succeed. Unscripted
/// commands (typically `git`) are delegated to a [`SystemExecutor`].
#[derive(Default)]
pub struct ScriptedExecutor {
    script: RefCell<VecDeque<ScriptedResponse>>,
    calls: RefCell<Vec<ShellCommand>>,
    system: SystemExecutor,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `outcome` for the next invocation of `program args`.
    pub fn respond(&self, program: &str, args: &[&str], outcome: CommandOutcome) {
        self.respond_with(program, args, move |_| Ok(outcome.clone()));
    }

    /// Queue `reply` for the next invocation of `program args`.
    ///
    /// `reply` receives the working directory, so it can leave files behind
    /// the way a real tool would.
    pub fn respond_with<F>(&self, program: &str, args: &[&str], reply: F)
    where
        F: Fn(&Path) -> Result<CommandOutcome> + 'static,
    {
        self.script.borrow_mut().push_back(ScriptedResponse {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            reply: Box::new(reply),
        });
    }

    /// Every command executed, scripted or not, in order.
    pub fn calls(&self) -> Vec<ShellCommand> {
        self.calls.borrow().clone()
    }

    /// Scripted commands only (anything but `git`).
    pub fn tool_calls(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|cmd| cmd.program != "git")
            .map(ToString::to_string)
            .collect()
    }

    /// Fail if queued responses were never used.
    pub fn assert_drained(&self) -> Result<()> {
        let script = self.script.borrow();
        if script.is_empty() {
            return Ok(());
        }
        let pending: Vec<String> = script
            .iter()
            .map(|r| ShellCommand::new(r.program.clone(), r.args.clone()).to_string())
            .collect();
        Err(anyhow!("unused scripted responses: {}", pending.join(", ")))
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, command: &ShellCommand, workdir: &Path) -> Result<CommandOutcome> {
        self.calls.borrow_mut().push(command.clone());
        let scripted = {
            let mut script = self.script.borrow_mut();
            let position = script.iter().position(|r| {
                let args: Vec<&str> = r.args.iter().map(String::as_str).collect();
                command.matches(&r.program, &args)
            });
            position.and_then(|idx| script.remove(idx))
        };
        match scripted {
            Some(response) => (response.reply)(workdir),
            None if command.program == "git" => self.system.execute(command, workdir),
            None => Err(anyhow!("unscripted command: {command}")),
        }
    }
}

/// Progress sink that keeps every line for assertions.
#[derive(Default)]
pub struct RecordingProgress {
    lines: RefCell<Vec<String>>,
}

impl RecordingProgress {
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// True if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|line| line.contains(needle))
    }

    /// Index of the first line containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lines.borrow().iter().position(|line| line.contains(needle))
    }
}

impl Progress for RecordingProgress {
    fn emit(&self, status: Status, message: &str) {
        self.lines.borrow_mut().push(format_line(status, message));
    }
}

//! Shared types for the provisioning workflow.
//!
//! These types are the contracts between the runner, the installer, the
//! verifier and the provisioner. They carry no I/O handles, so every step's
//! result can be pattern-matched and asserted on in tests.

use std::fmt;
use std::path::PathBuf;

use super::ecosystem::ProjectEcosystem;
use super::parent_dir::ResolvedParentDirectory;

/// An external command in argv form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from a static argv slice (first element is the program).
    ///
    /// Returns `None` for an empty slice.
    pub fn from_argv(argv: &[&str]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(*program, args.iter().copied()))
    }

    /// True if this command is `program` invoked with exactly `args`.
    pub fn matches(&self, program: &str, args: &[&str]) -> bool {
        self.program == program
            && self.args.len() == args.len()
            && self.args.iter().zip(args).all(|(a, b)| a == b)
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of one external command invocation. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
    /// Process exit code, or `-1` when the process produced none
    /// (spawn failure, signal, timeout).
    pub exit_code: i32,
}

impl CommandOutcome {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }
}

/// How the runner treats a non-zero exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// Return an error; the provisioner aborts the run.
    FailFast,
    /// Return the failed outcome to the caller.
    Continue,
}

/// Result of the dependency install step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// An install command was run (successfully or not).
    Ran(CommandOutcome),
    /// No install command is known for the detected ecosystem.
    NoOp,
}

impl InstallOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Ran(outcome) if outcome.succeeded)
    }
}

/// Result of baseline verification.
///
/// A `Failed` baseline is information for the operator, not a reason to
/// discard the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    Failed { exit_code: i32 },
    Skipped(String),
}

/// State of the ignore rules for the worktree parent after the guard ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreStatus {
    /// Git (or an existing rule) already covers the path.
    AlreadyIgnored,
    /// A rule was appended to the ignore file.
    RuleAppended { rule: String },
    /// The path is not covered and the repair could not be applied.
    Unprotected { reason: String },
}

/// Whether step 3 created the worktree or found it already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeState {
    Created,
    Reused,
}

/// Everything a `Ready` run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub parent: ResolvedParentDirectory,
    /// `<parent>/<branch>`, relative to the repository root.
    pub relative_path: PathBuf,
    /// Absolute path of the prepared workspace.
    pub worktree_path: PathBuf,
    pub ignore: IgnoreStatus,
    pub worktree: WorktreeState,
    /// Ecosystem detected before installing.
    pub install_ecosystem: ProjectEcosystem,
    pub install: InstallOutcome,
    /// Ecosystem detected again before verifying.
    pub verify_ecosystem: ProjectEcosystem,
    pub verification: VerificationOutcome,
}

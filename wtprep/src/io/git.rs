//! Git adapter for the provisioning workflow.
//!
//! Queries (`check-ignore`, `rev-parse`) call `git` directly because a
//! non-zero exit is an answer, not a failure. Worktree creation goes through
//! the shell runner so its failure is reported and aborts the run.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::types::{CommandOutcome, FailMode, ShellCommand};
use crate::io::process::{Executor, run};

/// Wrapper for executing git commands in a repository root.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// True if `path` is matched by the repository's ignore rules.
    ///
    /// `git check-ignore -q` exits 0 when ignored and 1 when not; any other
    /// status (e.g. not a repository) is logged and treated as "not ignored".
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn is_ignored(&self, path: &Path) -> Result<bool> {
        let path_arg = path
            .to_str()
            .ok_or_else(|| anyhow!("path is not valid UTF-8: {}", path.display()))?;
        let output = self.run(&["check-ignore", "-q", path_arg])?;
        match output.status.code() {
            Some(0) => {
                debug!("path is ignored");
                Ok(true)
            }
            Some(1) => {
                debug!("path is not ignored");
                Ok(false)
            }
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(?code, stderr = %stderr.trim(), "git check-ignore failed");
                Ok(false)
            }
        }
    }

    /// True if the working directory is inside a git work tree.
    pub fn is_work_tree(&self) -> Result<bool> {
        let output = self.run(&["rev-parse", "--is-inside-work-tree"])?;
        Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    /// Command that creates `path` as a new worktree on a new branch `branch`.
    pub fn worktree_add_command(path: &Path, branch: &str) -> ShellCommand {
        ShellCommand::new(
            "git",
            [
                "worktree".to_string(),
                "add".to_string(),
                path.display().to_string(),
                "-b".to_string(),
                branch.to_string(),
            ],
        )
    }

    /// Create `path` as a worktree bound to a new branch `branch`.
    ///
    /// Runs fail-fast: an error here means no workspace exists.
    #[instrument(skip_all, fields(path = %path.display(), branch))]
    pub fn worktree_add<E: Executor + ?Sized>(
        &self,
        executor: &E,
        path: &Path,
        branch: &str,
    ) -> Result<CommandOutcome> {
        debug!("creating worktree");
        let command = Self::worktree_add_command(path, branch);
        run(executor, &command, &self.workdir, FailMode::FailFast)
            .with_context(|| format!("create worktree {} for branch {branch}", path.display()))
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

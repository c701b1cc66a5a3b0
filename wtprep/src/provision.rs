//! Orchestration for provisioning one worktree.
//!
//! A run moves through fixed steps: resolve the parent directory, guard the
//! ignore rules, create (or reuse) the worktree, install dependencies, verify
//! the baseline, report. Only steps 1 and 3 can abort; every other failure is
//! recorded in the returned [`ProvisionOutcome`] and the run still ends
//! `Ready`.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::parent_dir::resolve_parent_dir;
use crate::core::request::WorktreeRequest;
use crate::core::types::{IgnoreStatus, ProvisionOutcome, WorktreeState};
use crate::detect::detect;
use crate::install::install;
use crate::io::git::Git;
use crate::io::ignore::{IGNORE_FILE, ensure_ignored};
use crate::io::process::Executor;
use crate::report::Progress;
use crate::verify::verify;

/// Provision `request` inside the repository at `root`.
///
/// Returns `Err` only for the fatal conditions (not a git work tree,
/// worktree creation failure); the caller maps that to a non-zero exit.
#[instrument(skip_all, fields(root = %root.display(), branch = %request.branch_name))]
pub fn provision<E, P>(
    root: &Path,
    request: &WorktreeRequest,
    executor: &E,
    progress: &P,
) -> Result<ProvisionOutcome>
where
    E: Executor + ?Sized,
    P: Progress + ?Sized,
{
    let git = Git::new(root);

    // 1. Resolve the parent directory.
    if !git.is_work_tree()? {
        progress.failure(&format!("{} is not inside a git work tree.", root.display()));
        return Err(anyhow!("{} is not inside a git work tree", root.display()));
    }
    let parent = resolve_parent_dir(&request.directory_preference, |name| {
        root.join(name).exists()
    });
    debug!(parent = %parent, source = ?parent.source, "resolved parent directory");
    progress.info(&format!("Target parent directory: {parent}"));

    // 2. Guard the ignore rules; never fatal.
    let ignore = guard_ignore(&git, &parent.name, progress);

    // 3. Create or reuse the worktree.
    let relative_path = parent.as_path().join(&request.branch_name);
    let target = root.join(&relative_path);
    let worktree = if target.exists() {
        warn!(path = %target.display(), "worktree path already exists, reusing");
        progress.warning(&format!(
            "Worktree already exists at {}; reusing it.",
            relative_path.display()
        ));
        WorktreeState::Reused
    } else {
        progress.info(&format!(
            "Creating worktree for branch '{}'...",
            request.branch_name
        ));
        if let Err(err) = git.worktree_add(executor, &relative_path, &request.branch_name) {
            progress.failure(&format!(
                "Could not create worktree at {}.",
                relative_path.display()
            ));
            return Err(err);
        }
        info!(path = %target.display(), "worktree created");
        WorktreeState::Created
    };

    // 4. Install dependencies.
    progress.info("Detecting project type and installing dependencies...");
    let install_ecosystem = detect(&target);
    let install_outcome = install(executor, progress, install_ecosystem, &target)?;

    // 5. Verify the baseline. Detection runs again: the install may have
    // produced marker files.
    progress.info("Verifying clean baseline (running tests)...");
    let verify_ecosystem = detect(&target);
    let verification = verify(executor, progress, verify_ecosystem, &target)?;

    // 6. Report.
    let worktree_path = std::path::absolute(&target)
        .with_context(|| format!("resolve absolute path of {}", target.display()))?;
    progress.success(&format!("Worktree ready: {}", worktree_path.display()));
    progress.info(&format!("To switch: cd {}", relative_path.display()));

    Ok(ProvisionOutcome {
        parent,
        relative_path,
        worktree_path,
        ignore,
        worktree,
        install_ecosystem,
        install: install_outcome,
        verify_ecosystem,
        verification,
    })
}

fn guard_ignore<P: Progress + ?Sized>(git: &Git, parent: &str, progress: &P) -> IgnoreStatus {
    let status = ensure_ignored(git, Path::new(parent));
    match &status {
        IgnoreStatus::AlreadyIgnored => {
            progress.success(&format!("{parent} is ignored by git."));
        }
        IgnoreStatus::RuleAppended { rule } => {
            progress.failure(&format!("VIOLATION: {parent} is NOT ignored by git."));
            progress.success(&format!("Auto-fixed: added {rule} to {IGNORE_FILE}"));
        }
        IgnoreStatus::Unprotected { reason } => {
            progress.failure(&format!("VIOLATION: {parent} is NOT ignored by git."));
            progress.failure(&format!(
                "Could not add {parent}/ to {IGNORE_FILE}: {reason}. Add it manually."
            ));
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ecosystem::ProjectEcosystem;
    use crate::core::types::{InstallOutcome, VerificationOutcome};
    use crate::test_support::{RecordingProgress, ScriptedExecutor, TestRepo};

    fn request(branch: &str, pref: &str) -> WorktreeRequest {
        WorktreeRequest::new(branch, pref).expect("request")
    }

    #[test]
    fn aborts_outside_a_work_tree() {
        let temp = tempfile::tempdir().expect("tempdir");
        let progress = RecordingProgress::default();

        let err = provision(
            temp.path(),
            &request("feature-x", ".worktrees"),
            &ScriptedExecutor::new(),
            &progress,
        )
        .unwrap_err();

        assert!(err.to_string().contains("not inside a git work tree"));
        assert!(!temp.path().join(".gitignore").exists());
    }

    #[test]
    fn aborts_when_worktree_creation_fails() {
        let repo = TestRepo::new().expect("repo");
        let current = repo.branch_of(repo.path()).expect("branch");
        let progress = RecordingProgress::default();

        // The branch already exists, so `git worktree add -b` refuses.
        let err = provision(
            repo.path(),
            &request(&current, "worktrees"),
            &ScriptedExecutor::new(),
            &progress,
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("create worktree"));
        assert!(progress.contains("Could not create worktree"));
        assert!(!progress.contains("Worktree ready"));
    }

    #[test]
    fn unrepairable_ignore_file_is_reported_not_fatal() {
        let repo = TestRepo::new().expect("repo");
        std::fs::create_dir(repo.path().join(IGNORE_FILE)).expect("mkdir .gitignore");
        let progress = RecordingProgress::default();

        let outcome = provision(
            repo.path(),
            &request("feature-x", ".worktrees"),
            &ScriptedExecutor::new(),
            &progress,
        )
        .expect("provision");

        assert!(matches!(outcome.ignore, IgnoreStatus::Unprotected { .. }));
        assert!(progress.contains("✗ VIOLATION: .worktrees is NOT ignored by git."));
        assert!(progress.contains("Add it manually."));
        assert!(progress.contains("Worktree ready"));
    }

    #[test]
    fn unknown_project_reaches_ready() {
        let repo = TestRepo::new().expect("repo");
        let executor = ScriptedExecutor::new();
        let progress = RecordingProgress::default();

        let outcome = provision(
            repo.path(),
            &request("feature-x", "auto"),
            &executor,
            &progress,
        )
        .expect("provision");

        assert_eq!(outcome.parent.name, ".worktrees");
        assert_eq!(outcome.worktree, WorktreeState::Created);
        assert_eq!(outcome.install_ecosystem, ProjectEcosystem::Unknown);
        assert_eq!(outcome.install, InstallOutcome::NoOp);
        assert!(matches!(
            outcome.verification,
            VerificationOutcome::Skipped(_)
        ));
        assert!(outcome.worktree_path.is_absolute());
        assert!(outcome.worktree_path.ends_with(".worktrees/feature-x"));
        let last = progress.lines().last().cloned().expect("lines");
        assert_eq!(last, "ℹ To switch: cd .worktrees/feature-x");
    }
}

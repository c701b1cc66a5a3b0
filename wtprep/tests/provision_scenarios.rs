//! End-to-end provisioning runs against throwaway repositories.
//!
//! Git runs for real; ecosystem tools (`npm`, `cargo`, `pip`, ...) are
//! scripted so the tests do not depend on what is installed.

use std::fs;

use wtprep::core::ecosystem::ProjectEcosystem;
use wtprep::core::parent_dir::ParentSource;
use wtprep::core::request::WorktreeRequest;
use wtprep::core::types::{
    CommandOutcome, IgnoreStatus, InstallOutcome, VerificationOutcome, WorktreeState,
};
use wtprep::provision::provision;
use wtprep::test_support::{RecordingProgress, ScriptedExecutor, TestRepo};

fn request(branch: &str, pref: &str) -> WorktreeRequest {
    WorktreeRequest::new(branch, pref).expect("request")
}

/// Node project, parent already ignored: install then test, ready.
#[test]
fn node_project_installs_and_verifies() {
    let repo = TestRepo::with_files(&[
        ("package.json", "{\"name\":\"demo\"}\n"),
        (".gitignore", ".worktrees/\n"),
    ])
    .expect("repo");
    let executor = ScriptedExecutor::new();
    executor.respond("npm", &["install"], CommandOutcome::success("added 0 packages"));
    executor.respond("npm", &["test"], CommandOutcome::success("all passing"));
    let progress = RecordingProgress::default();

    let outcome = provision(
        repo.path(),
        &request("feature-auth", ".worktrees"),
        &executor,
        &progress,
    )
    .expect("provision");

    assert_eq!(outcome.ignore, IgnoreStatus::AlreadyIgnored);
    assert_eq!(outcome.worktree, WorktreeState::Created);
    assert_eq!(outcome.install_ecosystem, ProjectEcosystem::Node);
    assert!(outcome.install.succeeded());
    assert_eq!(outcome.verification, VerificationOutcome::Verified);
    assert_eq!(executor.tool_calls(), vec!["npm install", "npm test"]);
    executor.assert_drained().expect("all scripted commands ran");

    assert_eq!(
        repo.branch_of(&outcome.worktree_path).expect("branch"),
        "feature-auth"
    );
    assert_eq!(repo.gitignore(), ".worktrees/\n");
    assert!(progress.contains("✓ .worktrees is ignored by git."));
    assert!(progress.contains("✓ Baseline tests passed."));

    let ready = progress.position("Worktree ready").expect("ready line");
    let install = progress.position("Running npm install").expect("install line");
    let verify = progress.position("Running: npm test").expect("verify line");
    assert!(install < verify && verify < ready);
}

/// Parent missing from `.gitignore`: the rule is appended once, and a second
/// run finds it.
#[test]
fn unignored_parent_is_fixed_once() {
    let repo = TestRepo::new().expect("repo");
    let progress = RecordingProgress::default();

    let first = provision(
        repo.path(),
        &request("feature-x", ".worktrees"),
        &ScriptedExecutor::new(),
        &progress,
    )
    .expect("first provision");

    assert_eq!(
        first.ignore,
        IgnoreStatus::RuleAppended {
            rule: ".worktrees/".to_string()
        }
    );
    assert_eq!(repo.gitignore(), ".worktrees/\n");
    assert!(progress.contains("✗ VIOLATION: .worktrees is NOT ignored by git."));
    assert!(progress.contains("✓ Auto-fixed: added .worktrees/ to .gitignore"));
    assert!(progress.contains("Worktree ready"));

    let second = provision(
        repo.path(),
        &request("feature-y", ".worktrees"),
        &ScriptedExecutor::new(),
        &RecordingProgress::default(),
    )
    .expect("second provision");

    assert_eq!(second.ignore, IgnoreStatus::AlreadyIgnored);
    assert_eq!(repo.gitignore().matches(".worktrees/").count(), 1);
}

/// Existing `.gitignore` content is preserved, even without a final newline.
#[test]
fn appended_rule_keeps_existing_content() {
    let repo = TestRepo::with_files(&[(".gitignore", "target")]).expect("repo");

    provision(
        repo.path(),
        &request("feature-x", "worktrees"),
        &ScriptedExecutor::new(),
        &RecordingProgress::default(),
    )
    .expect("provision");

    assert_eq!(repo.gitignore(), "target\nworktrees/\n");
}

/// No recognised markers: install and verification are skipped, still ready.
#[test]
fn unknown_project_skips_install_and_verification() {
    let repo = TestRepo::new().expect("repo");
    let executor = ScriptedExecutor::new();
    let progress = RecordingProgress::default();

    let outcome = provision(
        repo.path(),
        &request("feature-x", ".worktrees"),
        &executor,
        &progress,
    )
    .expect("provision");

    assert_eq!(outcome.install, InstallOutcome::NoOp);
    assert!(matches!(
        outcome.verification,
        VerificationOutcome::Skipped(_)
    ));
    assert!(executor.tool_calls().is_empty());
    assert!(progress.contains("Skipping install"));
    assert!(progress.contains("Skipping baseline verification"));
    assert!(progress.contains("Worktree ready"));
}

/// Running twice for the same branch reuses the worktree instead of failing.
#[test]
fn second_run_reuses_existing_worktree() {
    let repo = TestRepo::new().expect("repo");
    provision(
        repo.path(),
        &request("feature-x", ".worktrees"),
        &ScriptedExecutor::new(),
        &RecordingProgress::default(),
    )
    .expect("first provision");

    let executor = ScriptedExecutor::new();
    let progress = RecordingProgress::default();
    let outcome = provision(
        repo.path(),
        &request("feature-x", ".worktrees"),
        &executor,
        &progress,
    )
    .expect("second provision");

    assert_eq!(outcome.worktree, WorktreeState::Reused);
    assert!(
        !executor
            .calls()
            .iter()
            .any(|cmd| cmd.program == "git" && cmd.args.first().is_some_and(|a| a == "worktree"))
    );
    assert!(progress.contains("⚠ Worktree already exists at .worktrees/feature-x"));
    assert!(progress.contains("Worktree ready"));
}

/// Failing install and failing tests are warnings; the run still completes.
#[test]
fn failures_after_creation_are_not_fatal() {
    let repo = TestRepo::with_files(&[("Cargo.toml", "[package]\nname = \"demo\"\n")])
        .expect("repo");
    let executor = ScriptedExecutor::new();
    executor.respond("cargo", &["build"], CommandOutcome::failure(101, "error[E0432]"));
    executor.respond("cargo", &["test"], CommandOutcome::failure(101, "test failed"));
    let progress = RecordingProgress::default();

    let outcome = provision(
        repo.path(),
        &request("fix-build", ".worktrees"),
        &executor,
        &progress,
    )
    .expect("provision");

    assert_eq!(outcome.install_ecosystem, ProjectEcosystem::Rust);
    assert!(!outcome.install.succeeded());
    assert_eq!(
        outcome.verification,
        VerificationOutcome::Failed { exit_code: 101 }
    );
    assert!(progress.contains("Dependency install failed (exit code 101)"));
    assert!(progress.contains("⚠ Baseline tests FAILED. Review output above."));
    assert!(progress.contains("Worktree ready"));
}

/// Node wins over Go when both markers are present.
#[test]
fn first_matching_ecosystem_wins() {
    let repo = TestRepo::with_files(&[
        ("package.json", "{}\n"),
        ("go.mod", "module example.com/demo\n"),
    ])
    .expect("repo");
    let executor = ScriptedExecutor::new();
    executor.respond("npm", &["install"], CommandOutcome::success(""));
    executor.respond("npm", &["test"], CommandOutcome::success(""));

    let outcome = provision(
        repo.path(),
        &request("feature-x", ".worktrees"),
        &executor,
        &RecordingProgress::default(),
    )
    .expect("provision");

    assert_eq!(outcome.install_ecosystem, ProjectEcosystem::Node);
    assert!(!executor.tool_calls().iter().any(|call| call.starts_with("go")));
}

/// Detection runs again before verification and sees markers the install wrote.
#[test]
fn verification_redetects_after_install() {
    let repo = TestRepo::with_files(&[("go.mod", "module example.com/demo\n")]).expect("repo");
    let executor = ScriptedExecutor::new();
    executor.respond_with("go", &["mod", "download"], |dir| {
        fs::write(dir.join("package.json"), "{}\n")?;
        Ok(CommandOutcome::success(""))
    });
    executor.respond("npm", &["test"], CommandOutcome::success("all passing"));

    let outcome = provision(
        repo.path(),
        &request("feature-x", ".worktrees"),
        &executor,
        &RecordingProgress::default(),
    )
    .expect("provision");

    assert_eq!(outcome.install_ecosystem, ProjectEcosystem::Go);
    assert_eq!(outcome.verify_ecosystem, ProjectEcosystem::Node);
    assert_eq!(outcome.verification, VerificationOutcome::Verified);
    assert_eq!(executor.tool_calls(), vec!["go mod download", "npm test"]);
    executor.assert_drained().expect("all scripted commands ran");
}

/// Python projects are verified with pytest only when a pytest marker exists.
#[test]
fn python_project_uses_pytest_marker() {
    let repo = TestRepo::with_files(&[
        ("requirements.txt", "requests\n"),
        ("conftest.py", ""),
    ])
    .expect("repo");
    let executor = ScriptedExecutor::new();
    executor.respond(
        "pip",
        &["install", "-r", "requirements.txt"],
        CommandOutcome::success(""),
    );
    executor.respond("pytest", &[], CommandOutcome::success("1 passed"));

    let outcome = provision(
        repo.path(),
        &request("feature-x", ".worktrees"),
        &executor,
        &RecordingProgress::default(),
    )
    .expect("provision");

    assert_eq!(outcome.verify_ecosystem, ProjectEcosystem::PythonRequirements);
    assert_eq!(outcome.verification, VerificationOutcome::Verified);
    assert_eq!(
        executor.tool_calls(),
        vec!["pip install -r requirements.txt", "pytest"]
    );
}

/// An unrecognised preference falls back to an existing `worktrees/`.
#[test]
fn fallback_prefers_existing_parent() {
    let repo = TestRepo::new().expect("repo");
    fs::create_dir(repo.path().join("worktrees")).expect("mkdir worktrees");

    let outcome = provision(
        repo.path(),
        &request("feature-x", "auto"),
        &ScriptedExecutor::new(),
        &RecordingProgress::default(),
    )
    .expect("provision");

    assert_eq!(outcome.parent.name, "worktrees");
    assert_eq!(outcome.parent.source, ParentSource::Existing);
    assert!(repo.path().join("worktrees/feature-x/README.md").is_file());
    assert_eq!(repo.gitignore(), "worktrees/\n");
}

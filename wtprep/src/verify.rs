//! Baseline verification: run the workspace's tests once before work starts.

use std::path::Path;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::core::ecosystem::{ProjectEcosystem, resolve_test_command};
use crate::core::types::{FailMode, ShellCommand, VerificationOutcome};
use crate::detect::has_marker;
use crate::io::process::{Executor, run};
use crate::report::Progress;

/// Reason recorded when no test command applies.
pub const NO_TEST_COMMAND: &str = "no test command detected";

/// Run the baseline test command for `ecosystem` in `dir`.
///
/// A failing baseline is a warning: the outcome is `Failed` and the caller
/// keeps going.
#[instrument(skip_all, fields(ecosystem = %ecosystem, dir = %dir.display()))]
pub fn verify<E, P>(
    executor: &E,
    progress: &P,
    ecosystem: ProjectEcosystem,
    dir: &Path,
) -> Result<VerificationOutcome>
where
    E: Executor + ?Sized,
    P: Progress + ?Sized,
{
    let Some(command) = resolve_test_command(ecosystem, |marker| has_marker(dir, marker))
        .and_then(ShellCommand::from_argv)
    else {
        progress.info("No test command detected. Skipping baseline verification.");
        return Ok(VerificationOutcome::Skipped(NO_TEST_COMMAND.to_string()));
    };

    progress.info(&format!("Running: {command}"));
    let outcome = run(executor, &command, dir, FailMode::Continue)?;

    if outcome.succeeded {
        info!("baseline verified");
        progress.success("Baseline tests passed.");
        Ok(VerificationOutcome::Verified)
    } else {
        warn!(exit_code = outcome.exit_code, "baseline tests failed");
        progress.warning("Baseline tests FAILED. Review output above.");
        Ok(VerificationOutcome::Failed {
            exit_code: outcome.exit_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CommandOutcome;
    use crate::test_support::{RecordingProgress, ScriptedExecutor};
    use std::fs;

    #[test]
    fn passing_tests_verify() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = ScriptedExecutor::new();
        executor.respond("cargo", &["test"], CommandOutcome::success("ok"));
        let progress = RecordingProgress::default();

        let outcome =
            verify(&executor, &progress, ProjectEcosystem::Rust, temp.path()).expect("verify");

        assert_eq!(outcome, VerificationOutcome::Verified);
        assert!(progress.contains("Baseline tests passed"));
    }

    #[test]
    fn failing_tests_warn() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = ScriptedExecutor::new();
        executor.respond("npm", &["test"], CommandOutcome::failure(2, "1 failing"));
        let progress = RecordingProgress::default();

        let outcome =
            verify(&executor, &progress, ProjectEcosystem::Node, temp.path()).expect("verify");

        assert_eq!(outcome, VerificationOutcome::Failed { exit_code: 2 });
        assert!(progress.lines().iter().any(|line| line.starts_with("⚠")
            && line.contains("Baseline tests FAILED")));
    }

    #[test]
    fn skipped_without_test_command() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = ScriptedExecutor::new();
        let progress = RecordingProgress::default();

        let outcome =
            verify(&executor, &progress, ProjectEcosystem::Go, temp.path()).expect("verify");

        assert_eq!(outcome, VerificationOutcome::Skipped(NO_TEST_COMMAND.to_string()));
        assert!(executor.calls().is_empty());
        assert!(progress.contains("No test command detected"));
    }

    #[test]
    fn pytest_marker_enables_verification() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("conftest.py"), "").expect("write conftest");
        let executor = ScriptedExecutor::new();
        executor.respond("pytest", &[], CommandOutcome::success("1 passed"));
        let progress = RecordingProgress::default();

        let outcome = verify(
            &executor,
            &progress,
            ProjectEcosystem::PythonPoetry,
            temp.path(),
        )
        .expect("verify");

        assert_eq!(outcome, VerificationOutcome::Verified);
        assert!(executor.calls()[0].matches("pytest", &[]));
    }
}

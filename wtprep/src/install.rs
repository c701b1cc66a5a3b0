//! Dependency install step.

use std::path::Path;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::core::ecosystem::ProjectEcosystem;
use crate::core::types::{FailMode, InstallOutcome, ShellCommand};
use crate::io::process::{Executor, run};
use crate::report::Progress;

/// Run the install command for `ecosystem` in `dir`.
///
/// Failures are reported and returned, never raised: a broken install still
/// leaves a workspace worth inspecting.
#[instrument(skip_all, fields(ecosystem = %ecosystem, dir = %dir.display()))]
pub fn install<E, P>(
    executor: &E,
    progress: &P,
    ecosystem: ProjectEcosystem,
    dir: &Path,
) -> Result<InstallOutcome>
where
    E: Executor + ?Sized,
    P: Progress + ?Sized,
{
    let Some(command) = ecosystem.install_command().and_then(ShellCommand::from_argv) else {
        progress.info("No specific project type detected. Skipping install.");
        return Ok(InstallOutcome::NoOp);
    };

    progress.info(&format!("{} detected. Running {command}...", ecosystem.label()));
    let outcome = run(executor, &command, dir, FailMode::Continue)?;

    if outcome.succeeded {
        info!("dependencies installed");
        progress.success("Dependencies installed.");
    } else {
        warn!(exit_code = outcome.exit_code, "dependency install failed");
        progress.warning(&format!(
            "Dependency install failed (exit code {}). Continuing; fix it inside the worktree.",
            outcome.exit_code
        ));
    }
    Ok(InstallOutcome::Ran(outcome))
}

//! Implementation plan scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use minijinja::{Environment, context};
use tracing::{debug, instrument};

const PLAN_TEMPLATE: &str = include_str!("templates/implementation_plan.md");

/// Plan file written by `planning new` and read by `planning audit`.
pub const PLAN_FILE: &str = "implementation_plan.md";

/// Component heading used when none is given.
pub const DEFAULT_COMPONENT: &str = "Core";

/// Render the plan skeleton for `goal`.
pub fn render_plan(goal: &str, component: &str) -> Result<String> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_template("plan.md", PLAN_TEMPLATE)
        .context("parse plan template")?;
    let template = env.get_template("plan.md")?;
    let rendered = template
        .render(context! {
            goal => goal.trim(),
            component => component.trim(),
        })
        .context("render plan template")?;
    Ok(rendered)
}

/// A plan file that was just written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPlan {
    pub path: PathBuf,
    /// `PLAN_FILE` already existed, so a timestamped name was used.
    pub displaced: bool,
}

/// Write a new plan for `goal` into `dir`.
///
/// An existing `implementation_plan.md` is never overwritten; the new plan
/// goes to `implementation_plan_<unix_secs>.md` instead.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn create_plan(
    dir: &Path,
    goal: &str,
    component: &str,
    unix_secs: i64,
) -> Result<CreatedPlan> {
    if goal.trim().is_empty() {
        bail!("goal must not be empty");
    }
    let content = render_plan(goal, component)?;

    let default_path = dir.join(PLAN_FILE);
    let displaced = default_path.exists();
    let path = if displaced {
        dir.join(format!("implementation_plan_{unix_secs}.md"))
    } else {
        default_path
    };
    debug!(path = %path.display(), displaced, "writing plan");

    fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
    Ok(CreatedPlan { path, displaced })
}

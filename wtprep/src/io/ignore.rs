//! Ignore-rule guard: keep the worktree parent out of the parent repository.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::types::IgnoreStatus;
use crate::io::git::Git;

/// Ignore file the guard repairs, relative to the repository root.
pub const IGNORE_FILE: &str = ".gitignore";

/// Ensure `path` (relative to the git workdir) is ignored, appending a rule if not.
///
/// Git is asked first. A directory-only rule cannot match a directory that
/// does not exist yet, so before appending the ignore file is also scanned for
/// a rule naming the path. The rule is appended without re-querying git.
///
/// Never fails: anything that prevents the check or the repair is returned
/// as [`IgnoreStatus::Unprotected`].
#[instrument(skip_all, fields(path = %path.display()))]
pub fn ensure_ignored(git: &Git, path: &Path) -> IgnoreStatus {
    match repair(git, path) {
        Ok(status) => status,
        Err(err) => {
            let reason = format!("{err:#}");
            warn!(%reason, "ignore guard failed");
            IgnoreStatus::Unprotected { reason }
        }
    }
}

fn repair(git: &Git, path: &Path) -> Result<IgnoreStatus> {
    if git.is_ignored(path)? {
        return Ok(IgnoreStatus::AlreadyIgnored);
    }

    let ignore_path = git.workdir().join(IGNORE_FILE);
    let name = normalize(path);
    let existing = if ignore_path.exists() {
        fs::read_to_string(&ignore_path)
            .with_context(|| format!("read {}", ignore_path.display()))?
    } else {
        String::new()
    };

    if has_rule_for(&existing, &name) {
        debug!("rule already present in ignore file");
        return Ok(IgnoreStatus::AlreadyIgnored);
    }

    let rule = format!("{name}/");
    let mut addition = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        addition.push('\n');
    }
    addition.push_str(&rule);
    addition.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&ignore_path)
        .with_context(|| format!("open {}", ignore_path.display()))?;
    file.write_all(addition.as_bytes())
        .with_context(|| format!("append to {}", ignore_path.display()))?;

    info!(rule = %rule, "appended ignore rule");
    Ok(IgnoreStatus::RuleAppended { rule })
}

fn normalize(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim_end_matches('/');
    trimmed.strip_prefix("./").unwrap_or(trimmed).to_string()
}

/// True if `contents` has a line that ignores exactly `name` (as file or directory).
///
/// Only `name`, `name/`, `/name` and `/name/` are recognised. Globs such as
/// `name/*` or `name/**` are not, so a file that relies on one gets a second,
/// equivalent rule appended.
fn has_rule_for(contents: &str, name: &str) -> bool {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(|line| {
            let line = line.strip_prefix('/').unwrap_or(line);
            let line = line.strip_suffix('/').unwrap_or(line);
            line == name
        })
}

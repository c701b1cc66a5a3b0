//! Resolution of the directory that holds all worktrees.

use std::fmt;
use std::path::Path;

/// Canonical parent names, in fallback priority order.
pub const CANONICAL_PARENTS: [&str; 2] = [".worktrees", "worktrees"];

/// Parent used when neither the preference nor the disk picks one.
pub const DEFAULT_PARENT: &str = ".worktrees";

/// Which rule selected the parent directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentSource {
    /// The caller named a canonical directory.
    Preferred,
    /// A canonical directory already existed on disk.
    Existing,
    /// Nothing matched; the hard-coded default was used.
    Default,
}

/// The directory (relative to the repository root) that will hold worktrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParentDirectory {
    pub name: String,
    pub source: ParentSource,
}

impl ResolvedParentDirectory {
    pub fn as_path(&self) -> &Path {
        Path::new(&self.name)
    }
}

impl fmt::Display for ResolvedParentDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolve the worktree parent for `preference`.
///
/// A canonical preference is taken verbatim. Anything else (e.g. `auto`)
/// falls back to the first canonical directory that `exists`, then to
/// [`DEFAULT_PARENT`].
pub fn resolve_parent_dir(
    preference: &str,
    exists: impl Fn(&str) -> bool,
) -> ResolvedParentDirectory {
    if CANONICAL_PARENTS.contains(&preference) {
        return ResolvedParentDirectory {
            name: preference.to_string(),
            source: ParentSource::Preferred,
        };
    }
    if let Some(found) = CANONICAL_PARENTS.iter().find(|name| exists(name)) {
        return ResolvedParentDirectory {
            name: (*found).to_string(),
            source: ParentSource::Existing,
        };
    }
    ResolvedParentDirectory {
        name: DEFAULT_PARENT.to_string(),
        source: ParentSource::Default,
    }
}

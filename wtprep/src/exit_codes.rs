//! Stable exit codes for the `wtprep` CLI.

/// The worktree is ready (install or baseline failures included).
pub const OK: i32 = 0;
/// Bad arguments, not a git work tree, or the worktree could not be created.
pub const INVALID: i32 = 1;

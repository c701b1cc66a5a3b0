//! Isolated git worktree provisioning.
//!
//! Given a branch name, creates a worktree under a parent directory that is
//! guaranteed to be ignored by git, installs the project's dependencies and
//! runs its test suite once so work starts from a known baseline.
//!
//! - **[`core`]**: Pure decisions (parent directory resolution, ecosystem
//!   classification, request validation). No I/O.
//! - **[`io`]**: Side effects (child processes, git, `.gitignore`, config).
//!
//! Step modules ([`detect`], [`install`], [`verify`]) combine the two, and
//! [`provision`] runs them in order.

pub mod core;
pub mod detect;
pub mod exit_codes;
pub mod install;
pub mod io;
pub mod logging;
pub mod provision;
pub mod report;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod verify;

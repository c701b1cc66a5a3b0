//! Side-effecting adapters: processes, git, the ignore file, configuration.

pub mod config;
pub mod git;
pub mod ignore;
pub mod process;

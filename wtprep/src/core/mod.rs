//! Deterministic, pure logic for the provisioning workflow.
//!
//! Core modules must be free of I/O side effects. Filesystem state reaches
//! them only through `exists` predicates supplied by the caller.

pub mod ecosystem;
pub mod parent_dir;
pub mod request;
pub mod types;

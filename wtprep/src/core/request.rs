//! Validated provisioning request.

use anyhow::{Result, anyhow};

/// Input for one provisioning run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeRequest {
    pub branch_name: String,
    pub directory_preference: String,
}

impl WorktreeRequest {
    /// Build a request, rejecting values that cannot name a branch or a directory.
    pub fn new(
        branch_name: impl Into<String>,
        directory_preference: impl Into<String>,
    ) -> Result<Self> {
        let branch_name = branch_name.into();
        let directory_preference = directory_preference.into();
        validate_branch_name(&branch_name)?;
        if directory_preference.trim().is_empty() {
            return Err(anyhow!("directory preference must not be empty"));
        }
        Ok(Self {
            branch_name,
            directory_preference,
        })
    }
}

/// Reject branch names git would refuse or that would escape the parent directory.
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow!("branch name must not be empty"));
    }
    if name.starts_with('-') {
        return Err(anyhow!("branch name must not start with '-' (got '{name}')"));
    }
    if name.contains("..") {
        return Err(anyhow!("branch name must not contain '..' (got '{name}')"));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(anyhow!("branch name must not contain whitespace (got '{name}')"));
    }
    Ok(())
}

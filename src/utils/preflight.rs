//! Preflight validation checks for early failure detection
//!
//! Commands call these before doing any work so that a bad repository state
//! fails fast with a message naming the missing precondition.

use anyhow::Result;

use crate::error::ToolError;
use crate::git::GitRepository;

/// Validate that a path is currently unresolved
///
/// Returns the path normalized relative to the working tree.
pub fn check_unresolved_path(repo: &GitRepository, path: &str) -> Result<String> {
    let relative = repo.relative_path(path);
    if relative.is_empty() {
        return Err(ToolError::Usage("a file path is required".to_string()).into());
    }
    repo.require_unresolved(&relative)?;
    Ok(relative)
}

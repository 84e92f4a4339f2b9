//! Single entry point over an opened repository and its policy.
//!
//! Every command goes through [`Facade`]; results are plain data types that
//! serialize to the fixed JSON schema.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::config::Policy;
use crate::conflict::{self, Extractor};
use crate::data::{
    BackupRecord, ConflictCategory, ConflictContext, ConflictedFile, ResolveOutcome,
    ThreeWaySnapshot, ValidationResult,
};
use crate::error::ToolError;
use crate::git::{create_backup, GitRepository, RepoLock};
use crate::language::Language;
use crate::utils::general::{restore_file, write_atomically};
use crate::utils::preflight::check_unresolved_path;
use crate::validate::Validator;

/// Repository plus the policy loaded for its working tree.
pub struct Facade {
    repo: GitRepository,
    policy: Policy,
}

impl Facade {
    /// Opens the repository containing `repo_path` and loads its policy.
    pub fn open<P: AsRef<Path>>(repo_path: P) -> Result<Self> {
        let repo = GitRepository::open_at(repo_path)?;
        let policy = Policy::load_for_workdir(repo.workdir())?;
        Ok(Self::with_policy(repo, policy))
    }

    /// Uses an explicit policy instead of loading one.
    pub fn with_policy(repo: GitRepository, policy: Policy) -> Self {
        Self { repo, policy }
    }

    /// The opened repository.
    pub fn repository(&self) -> &GitRepository {
        &self.repo
    }

    /// The active policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Unresolved paths with their stage status, sorted by path.
    pub fn list(&self) -> Result<Vec<ConflictedFile>> {
        self.repo.list_conflicts()
    }

    /// Full three-way snapshot of one path.
    pub fn extract(&self, path: &str, with_context: bool) -> Result<ThreeWaySnapshot> {
        Extractor::new(&self.repo, &self.policy.extractor).extract(path, with_context)
    }

    /// History and dependency context of one path.
    pub fn context(&self, path: &str) -> Result<ConflictContext> {
        Extractor::new(&self.repo, &self.policy.extractor).context(path)
    }

    /// Classifies every conflict region of one path.
    pub fn categorize(&self, path: &str) -> Result<ConflictCategory> {
        let snapshot = self.extract(path, false)?;
        Ok(conflict::categorize(&snapshot, &self.policy.classifier))
    }

    /// Checks proposed content without touching the repository.
    pub fn validate(
        &self,
        path: &str,
        content: &str,
        language: Option<Language>,
    ) -> Result<ValidationResult> {
        let path = self.repo.relative_path(path);
        let validator = Validator::new(&self.policy.validator)?;
        Ok(validator.validate(&path, content, language))
    }

    /// Working-tree content of a path, for validating it in place.
    pub fn worktree_content(&self, path: &str) -> Result<String> {
        let relative = self.repo.relative_path(path);
        let bytes = self.repo.read_worktree(&relative)?.ok_or_else(|| {
            ToolError::state(format!("path '{relative}' is not in the working tree"))
        })?;
        String::from_utf8(bytes).map_err(|_| {
            ToolError::Usage(format!("working-tree file '{relative}' is not valid UTF-8")).into()
        })
    }

    /// Creates (or reuses) the safety branch for the current merge.
    pub fn backup(&self, name: Option<&str>) -> Result<BackupRecord> {
        create_backup(&self.repo, &self.policy.backup, name, Utc::now())
    }

    /// Validates, writes and stages a resolution.
    ///
    /// Invalid content is rejected before anything is written. When staging
    /// fails the working-tree file is put back as it was.
    pub fn resolve(&self, path: &str, content: &str) -> Result<ResolveOutcome> {
        let _lock = RepoLock::acquire(
            self.repo.git_dir(),
            Duration::from_millis(self.policy.backup.lock_timeout_ms),
        )?;
        let path = check_unresolved_path(&self.repo, path)?;

        let validation = self.validate(&path, content, None)?;
        if !validation.is_valid() {
            let detail = validation.message.as_deref().unwrap_or("invalid content");
            let location = validation
                .line
                .map(|line| format!(" (line {line})"))
                .unwrap_or_default();
            return Err(ToolError::Validation(format!(
                "refusing to write '{path}': {detail}{location}"
            ))
            .into());
        }

        let target = self.repo.worktree_path(&path);
        let previous = self.repo.read_worktree(&path)?;
        write_atomically(&target, content.as_bytes())?;

        if let Err(stage_err) = self.repo.stage_path(&path) {
            warn!(path = %path, error = %format!("{stage_err:#}"), "staging failed; restoring file");
            restore_file(&target, previous.as_deref())?;
            return Err(ToolError::Internal(format!(
                "failed to stage '{path}': {stage_err:#}; working tree restored"
            ))
            .into());
        }

        info!(path = %path, "resolution written and staged");
        Ok(ResolveOutcome {
            path,
            staged: true,
            validation,
        })
    }
}

//! Git repository operations

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{Oid, Repository};
use tracing::debug;

use crate::data::{ConflictedFile, UnmergedStatus};
use crate::error::ToolError;

/// Index stage of an unmerged entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Common ancestor (stage 1).
    Base = 1,
    /// Receiving branch (stage 2).
    Ours = 2,
    /// Incoming branch (stage 3).
    Theirs = 3,
}

/// Raw content of one index stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageBlob {
    /// The stage exists with these bytes.
    Present(Vec<u8>),
    /// The index has no entry at this stage.
    Absent,
}

impl StageBlob {
    /// Bytes, or `None` when absent.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Present(bytes) => Some(bytes),
            Self::Absent => None,
        }
    }
}

/// Files naming the incoming tip, in lookup order.
const INCOMING_HEAD_FILES: [&str; 3] = ["MERGE_HEAD", "CHERRY_PICK_HEAD", "REVERT_HEAD"];

/// The two tips being merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeHeads {
    /// `HEAD`.
    pub ours: Oid,
    /// `MERGE_HEAD` or its cherry-pick/revert counterpart.
    pub theirs: Oid,
}

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open repository at specified path
    ///
    /// Bare repositories and paths outside any repository are
    /// repository-state errors.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| {
            debug!(error = %e, "repository open failed");
            ToolError::state(format!("{} is not a git working tree", path.display()))
        })?;

        if repo.is_bare() {
            return Err(ToolError::state(format!(
                "{} is a bare repository; a working tree is required",
                path.display()
            ))
            .into());
        }

        Ok(Self { repo })
    }

    /// Get access to the underlying git2::Repository
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Get the `.git` directory
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Get workdir path
    pub fn workdir(&self) -> &Path {
        // `open_at` rejects bare repositories.
        self.repo.workdir().unwrap_or_else(|| self.repo.path())
    }

    /// Normalizes a user-supplied path to one relative to the working tree.
    pub fn relative_path(&self, path: &str) -> String {
        let candidate = Path::new(path);
        let relative = if candidate.is_absolute() {
            let workdir = self.workdir();
            let canonical = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
            candidate
                .strip_prefix(workdir)
                .or_else(|_| candidate.strip_prefix(&canonical))
                .unwrap_or(candidate)
        } else {
            candidate
        };

        let text = relative.to_string_lossy().replace('\\', "/");
        let mut trimmed = text.as_str();
        while let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        }
        trimmed.to_string()
    }

    fn fresh_index(&self) -> Result<git2::Index> {
        let mut index = self.repo.index().context("Failed to open repository index")?;
        index
            .read(false)
            .context("Failed to reload repository index")?;
        Ok(index)
    }

    /// Lists every path with unmerged index entries, sorted by path.
    pub fn list_conflicts(&self) -> Result<Vec<ConflictedFile>> {
        let index = self.fresh_index()?;
        let mut files = Vec::new();

        for conflict in index.conflicts().context("Failed to read index conflicts")? {
            let conflict = conflict.context("Failed to read index conflict entry")?;
            let path = [&conflict.our, &conflict.their, &conflict.ancestor]
                .into_iter()
                .flatten()
                .next()
                .map(|entry| String::from_utf8_lossy(&entry.path).into_owned());

            if let Some(path) = path {
                files.push(ConflictedFile {
                    path,
                    status: UnmergedStatus::from_stages(
                        conflict.ancestor.is_some(),
                        conflict.our.is_some(),
                        conflict.their.is_some(),
                    ),
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        debug!(count = files.len(), "listed unresolved paths");
        Ok(files)
    }

    /// Whether a path currently has unmerged index entries.
    pub fn is_unresolved(&self, path: &str) -> Result<bool> {
        Ok(self.list_conflicts()?.iter().any(|f| f.path == path))
    }

    /// Fails unless the path is currently unresolved.
    pub fn require_unresolved(&self, path: &str) -> Result<()> {
        if self.is_unresolved(path)? {
            return Ok(());
        }
        let message = if self.workdir().join(path).exists() {
            format!("path '{path}' is not unresolved")
        } else {
            format!("path '{path}' is not in the working tree or index")
        };
        Err(ToolError::state(message).into())
    }

    /// Reads the blob recorded at an index stage.
    pub fn get_stage(&self, path: &str, stage: Stage) -> Result<StageBlob> {
        let index = self.fresh_index()?;
        let Some(entry) = index.get_path(Path::new(path), stage as i32) else {
            return Ok(StageBlob::Absent);
        };

        let blob = self
            .repo
            .find_blob(entry.id)
            .with_context(|| format!("Failed to read stage {} blob for {path}", stage as i32))?;
        Ok(StageBlob::Present(blob.content().to_vec()))
    }

    /// Working-tree bytes, or `None` when the file does not exist.
    pub fn read_worktree(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.worktree_path(path);
        match fs::read(&full) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read working-tree file {}", full.display()))
            }
        }
    }

    /// Absolute working-tree location of a relative path.
    pub fn worktree_path(&self, path: &str) -> PathBuf {
        self.workdir().join(path)
    }

    /// Stages the working-tree file, clearing its unmerged entries.
    pub fn stage_path(&self, path: &str) -> Result<()> {
        let mut index = self.fresh_index()?;
        index
            .add_path(Path::new(path))
            .with_context(|| format!("Failed to stage {path}"))?;
        index.write().context("Failed to write repository index")?;
        debug!(path, "staged resolution");
        Ok(())
    }

    /// Finds the two tips of the operation in progress, if any.
    pub fn merge_heads(&self) -> Result<Option<MergeHeads>> {
        let mut incoming = None;
        for name in INCOMING_HEAD_FILES {
            if let Some(oid) = self.read_head_file(name)? {
                debug!(file = name, %oid, "incoming tip found");
                incoming = Some(oid);
                break;
            }
        }
        let Some(theirs) = incoming else {
            return Ok(None);
        };

        let ours = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|_| ToolError::state("HEAD does not point at a commit"))?
            .id();

        Ok(Some(MergeHeads { ours, theirs }))
    }

    /// Like [`merge_heads`](Self::merge_heads) but fails when nothing is in progress.
    pub fn require_merge_heads(&self) -> Result<MergeHeads> {
        self.merge_heads()?
            .ok_or_else(|| ToolError::state("no merge in progress").into())
    }

    fn read_head_file(&self, name: &str) -> Result<Option<Oid>> {
        let path = self.git_dir().join(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };

        // Octopus merges list several heads; the first is the one merged against.
        let Some(first) = content.lines().map(str::trim).find(|l| !l.is_empty()) else {
            return Ok(None);
        };
        let oid = Oid::from_str(first)
            .map_err(|_| ToolError::state(format!("{name} does not hold a commit id")))?;
        Ok(Some(oid))
    }
}

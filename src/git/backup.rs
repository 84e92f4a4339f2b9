//! Safety branches protecting the two tips of an in-progress merge.
//!
//! A backup is three refs written together: the branch itself (at the ours
//! tip), a hidden ref keeping the theirs tip reachable, and a hidden ref
//! pointing at a JSON blob of the [`BackupRecord`].

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use git2::{BranchType, Oid, Repository};
use tracing::{debug, info, warn};

use crate::config::BackupPolicy;
use crate::data::{from_json_slice, BackupRecord};
use crate::error::ToolError;
use crate::git::lock::RepoLock;
use crate::git::GitRepository;

/// Namespace of the hidden backup refs.
pub const BACKUP_REF_ROOT: &str = "refs/conflict-lens/backups";

const RECORD_SUFFIX: &str = "/record";

fn theirs_ref(branch: &str) -> String {
    format!("{BACKUP_REF_ROOT}/{branch}/theirs")
}

fn record_ref(branch: &str) -> String {
    format!("{BACKUP_REF_ROOT}/{branch}{RECORD_SUFFIX}")
}

/// Creates, or returns the existing, backup for the current tip pair.
///
/// Runs under the repository lock. `name` replaces the generated
/// `<prefix><%Y%m%d-%H%M%S>` branch name.
pub fn create_backup(
    repo: &GitRepository,
    policy: &BackupPolicy,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<BackupRecord> {
    let heads = repo.require_merge_heads()?;
    let _lock = RepoLock::acquire(
        repo.git_dir(),
        Duration::from_millis(policy.lock_timeout_ms),
    )?;
    let git = repo.repository();

    if let Some(existing) = find_existing(git, heads.ours, heads.theirs)? {
        info!(branch = %existing.backup_branch, "reusing backup for this tip pair");
        return Ok(existing);
    }

    let branch = match name {
        Some(name) => explicit_name(git, name)?,
        None => generated_name(git, &policy.prefix, now),
    };

    let record = BackupRecord {
        backup_branch: branch.clone(),
        created_at: DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now),
        ours_tip: heads.ours.to_string(),
        theirs_tip: heads.theirs.to_string(),
    };
    let payload = serde_json::to_vec(&record).context("Failed to serialize backup record")?;
    let record_blob = git.blob(&payload).context("Failed to store backup record")?;

    write_refs(
        git,
        &branch,
        &[
            (format!("refs/heads/{branch}"), heads.ours),
            (theirs_ref(&branch), heads.theirs),
            (record_ref(&branch), record_blob),
        ],
    )?;

    info!(branch = %branch, ours = %heads.ours, theirs = %heads.theirs, "backup created");
    Ok(record)
}

/// Writes every ref or none of them.
fn write_refs(git: &Repository, branch: &str, refs: &[(String, Oid)]) -> Result<()> {
    let message = format!("conflict-lens: backup {branch}");
    let mut written: Vec<&str> = Vec::new();

    for (name, target) in refs {
        if let Err(e) = git.reference(name, *target, false, &message) {
            warn!(reference = %name, error = %e, "backup ref write failed; rolling back");
            let mut leftovers = Vec::new();
            for done in written.iter().rev() {
                let removed = git
                    .find_reference(done)
                    .and_then(|mut reference| reference.delete());
                if removed.is_err() {
                    leftovers.push(*done);
                }
            }
            let outcome = if leftovers.is_empty() {
                "repository restored to its previous state".to_string()
            } else {
                format!("could not remove {}", leftovers.join(", "))
            };
            return Err(ToolError::Internal(format!(
                "backup {branch} failed writing {name}: {}; {outcome}",
                e.message()
            ))
            .into());
        }
        written.push(name);
    }
    Ok(())
}

fn branch_exists(git: &Repository, name: &str) -> bool {
    git.find_branch(name, BranchType::Local).is_ok()
}

fn explicit_name(git: &Repository, name: &str) -> Result<String> {
    if !git2::Branch::name_is_valid(name).unwrap_or(false) {
        return Err(ToolError::Usage(format!("'{name}' is not a valid branch name")).into());
    }
    if branch_exists(git, name) {
        return Err(ToolError::state(format!(
            "branch '{name}' already exists and does not protect the current merge"
        ))
        .into());
    }
    Ok(name.to_string())
}

fn generated_name(git: &Repository, prefix: &str, now: DateTime<Utc>) -> String {
    let stem = format!("{prefix}{}", now.format("%Y%m%d-%H%M%S"));
    let taken = |candidate: &str| {
        branch_exists(git, candidate) || git.find_reference(&record_ref(candidate)).is_ok()
    };
    if !taken(&stem) {
        return stem;
    }
    (1..)
        .map(|n| format!("{stem}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or(stem)
}

/// Looks for a live backup of exactly this tip pair.
///
/// Records whose branch was deleted or moved no longer protect anything and
/// are skipped. With several matches the oldest wins.
pub fn find_existing(git: &Repository, ours: Oid, theirs: Oid) -> Result<Option<BackupRecord>> {
    let mut matches: Vec<BackupRecord> = Vec::new();

    for reference in git.references().context("Failed to list references")? {
        let reference = reference.context("Failed to read reference")?;
        let Some(name) = reference.name() else {
            continue;
        };
        if !name.starts_with(BACKUP_REF_ROOT) || !name.ends_with(RECORD_SUFFIX) {
            continue;
        }
        let Some(target) = reference.target() else {
            continue;
        };
        let record = match git
            .find_blob(target)
            .ok()
            .and_then(|blob| from_json_slice::<BackupRecord>(blob.content()).ok())
        {
            Some(record) => record,
            None => {
                debug!(reference = name, "skipping unreadable backup record");
                continue;
            }
        };

        if record.ours_tip != ours.to_string() || record.theirs_tip != theirs.to_string() {
            continue;
        }
        let live = git
            .find_branch(&record.backup_branch, BranchType::Local)
            .ok()
            .and_then(|branch| branch.get().target())
            == Some(ours);
        if live {
            matches.push(record);
        }
    }

    matches.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.backup_branch.cmp(&b.backup_branch))
    });
    Ok(matches.into_iter().next())
}

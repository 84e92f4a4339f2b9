//! Per-side commit logs between the merge base and each tip.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::{Commit, Oid, Repository, Sort};
use serde::{Deserialize, Serialize};

use crate::git::SHORT_HASH_LEN;

/// One commit in a side's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Full SHA-1 hash of the commit
    pub id: String,
    /// Abbreviated hash
    pub short_id: String,
    /// First line of the commit message
    pub summary: String,
    /// Commit author name and email address
    pub author: String,
    /// Author date with the author's timezone
    pub date: DateTime<FixedOffset>,
    /// Whether this commit changed the conflicted file
    pub touches_path: bool,
}

impl CommitSummary {
    /// Create a summary from a git2::Commit
    pub fn from_git_commit(commit: &Commit, path: Option<&Path>) -> Result<Self> {
        let id = commit.id().to_string();
        let short_id = id.chars().take(SHORT_HASH_LEN).collect();

        let author = format!(
            "{} <{}>",
            commit.author().name().unwrap_or("Unknown"),
            commit.author().email().unwrap_or("unknown@example.com")
        );

        let timestamp = commit.author().when();
        let offset = FixedOffset::east_opt(timestamp.offset_minutes() * 60)
            .or_else(|| FixedOffset::east_opt(0))
            .context("Invalid commit timezone offset")?;
        let date = DateTime::from_timestamp(timestamp.seconds(), 0)
            .context("Invalid commit timestamp")?
            .with_timezone(&offset);

        let touches_path = match path {
            Some(path) => touches(commit, path)?,
            None => false,
        };

        Ok(Self {
            id,
            short_id,
            summary: commit.summary().unwrap_or("").to_string(),
            author,
            date,
            touches_path,
        })
    }
}

/// Whether the commit's entry for `path` differs from its first parent's.
fn touches(commit: &Commit, path: &Path) -> Result<bool> {
    let entry_id = |c: &Commit| -> Result<Option<Oid>> {
        let tree = c.tree().context("Failed to read commit tree")?;
        Ok(tree.get_path(path).ok().map(|entry| entry.id()))
    };

    let mine = entry_id(commit)?;
    match commit.parents().next() {
        Some(parent) => Ok(entry_id(&parent)? != mine),
        None => Ok(mine.is_some()),
    }
}

/// Commits reachable from `tip` but not from any of `hide`, oldest first.
pub fn commit_log(
    repo: &Repository,
    tip: Oid,
    hide: &[Oid],
    path: Option<&Path>,
) -> Result<Vec<CommitSummary>> {
    let mut walker = repo.revwalk().context("Failed to create revwalk")?;
    walker
        .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
        .context("Failed to set revwalk order")?;
    walker.push(tip).context("Failed to push tip commit")?;
    for oid in hide {
        walker
            .hide(*oid)
            .with_context(|| format!("Failed to hide commit {oid}"))?;
    }

    let mut commits = Vec::new();
    for oid in walker {
        let oid = oid.context("Failed to get commit OID from walker")?;
        let commit = repo.find_commit(oid).context("Failed to find commit")?;
        commits.push(CommitSummary::from_git_commit(&commit, path)?);
    }
    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    fn commit(repo: &Repository, parent: Option<Oid>, files: &[(&str, &str)], msg: &str) -> Oid {
        let sig = Signature::now("Ada", "ada@example.com").unwrap();
        let parent = parent.map(|p| repo.find_commit(p).unwrap());
        let base_tree = parent.as_ref().map(|p| p.tree().unwrap());
        let mut builder = repo.treebuilder(base_tree.as_ref()).unwrap();
        for (name, content) in files {
            let blob = repo.blob(content.as_bytes()).unwrap();
            builder.insert(name, blob, 0o100644).unwrap();
        }
        let tree = repo.find_tree(builder.write().unwrap()).unwrap();
        let parents: Vec<&Commit> = parent.iter().collect();
        repo.commit(None, &sig, &sig, msg, &tree, &parents).unwrap()
    }

    #[test]
    fn log_is_oldest_first_and_excludes_base() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let base = commit(&repo, None, &[("a.py", "x = 1\n")], "base");
        let first = commit(&repo, Some(base), &[("a.py", "x = 2\n")], "change a\n\nbody");
        let second = commit(&repo, Some(first), &[("b.py", "y = 1\n")], "add b");

        let log = commit_log(&repo, second, &[base], Some(Path::new("a.py"))).unwrap();
        let ids: Vec<&str> = log.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![first.to_string(), second.to_string()]);
        assert_eq!(log[0].summary, "change a");
        assert_eq!(log[0].short_id.len(), SHORT_HASH_LEN);
        assert_eq!(log[0].author, "Ada <ada@example.com>");
        assert!(log[0].touches_path);
        assert!(!log[1].touches_path);
    }

    #[test]
    fn tip_equal_to_base_gives_empty_log() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let base = commit(&repo, None, &[("a.py", "x\n")], "base");
        assert!(commit_log(&repo, base, &[base], None).unwrap().is_empty());
    }
}

//! Lowest-common-ancestor search over commit parent links.
//!
//! Both tips are painted breadth-first from a single FIFO worklist, ours
//! first. A commit painted from both sides is a candidate; everything below
//! a candidate is painted stale so that only the lowest ones survive.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use git2::{Oid, Repository};
use tracing::{debug, warn};

use crate::error::ToolError;

const OURS: u8 = 1;
const THEIRS: u8 = 2;
const BOTH: u8 = OURS | THEIRS;
const STALE: u8 = 4;

/// Result of a merge-base search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeBase {
    /// The selected ancestor; `None` for unrelated histories.
    pub chosen: Option<Oid>,
    /// Other lowest common ancestors tied with `chosen` on combined depth,
    /// in discovery order.
    pub alternates: Vec<Oid>,
}

impl MergeBase {
    /// The ambiguity warning, when there are alternates.
    pub fn ambiguity(&self) -> Option<ToolError> {
        let chosen = self.chosen?;
        if self.alternates.is_empty() {
            return None;
        }
        Some(ToolError::AmbiguousMergeBase {
            chosen: chosen.to_string(),
            alternates: self.alternates.iter().map(Oid::to_string).collect(),
        })
    }
}

#[derive(Default)]
struct Paint {
    flags: u8,
    ours_depth: Option<usize>,
    theirs_depth: Option<usize>,
}

/// Finds the lowest common ancestors of two commits.
///
/// Candidates are ranked by combined distance from both tips; only those at
/// the minimal distance are kept, in discovery order. Exceeding `timeout` is a [`ToolError::Timeout`].
pub fn find_merge_base(
    repo: &Repository,
    ours: Oid,
    theirs: Oid,
    timeout: Duration,
) -> Result<MergeBase> {
    if ours == theirs {
        return Ok(MergeBase {
            chosen: Some(ours),
            alternates: Vec::new(),
        });
    }

    let deadline = Instant::now() + timeout;
    let mut paint: HashMap<Oid, Paint> = HashMap::new();
    let mut candidates: Vec<Oid> = Vec::new();
    let mut queue: VecDeque<(Oid, u8, usize)> = VecDeque::from([(ours, OURS, 0), (theirs, THEIRS, 0)]);
    let mut visited = 0usize;

    while let Some((oid, incoming, depth)) = queue.pop_front() {
        if Instant::now() >= deadline {
            warn!(visited, "merge-base search exceeded its deadline");
            return Err(ToolError::Timeout {
                operation: "merge-base discovery".to_string(),
                millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }
            .into());
        }

        let entry = paint.entry(oid).or_default();
        let before = entry.flags;
        let after = before | incoming;
        if after == before {
            continue;
        }
        entry.flags = after;
        if after & OURS != 0 && entry.ours_depth.is_none() {
            entry.ours_depth = Some(depth);
        }
        if after & THEIRS != 0 && entry.theirs_depth.is_none() {
            entry.theirs_depth = Some(depth);
        }
        if after & BOTH == BOTH && before & BOTH != BOTH && after & STALE == 0 {
            candidates.push(oid);
        }
        visited += 1;

        let inherited = if after & BOTH == BOTH { after | STALE } else { after };
        let commit = repo
            .find_commit(oid)
            .with_context(|| format!("Failed to load commit {oid}"))?;
        for parent in commit.parent_ids() {
            queue.push_back((parent, inherited, depth + 1));
        }
    }

    let mut lowest: Vec<(usize, Oid)> = candidates
        .into_iter()
        .filter_map(|oid| {
            let p = &paint[&oid];
            if p.flags & STALE != 0 {
                return None;
            }
            let combined = p.ours_depth.unwrap_or(0) + p.theirs_depth.unwrap_or(0);
            Some((combined, oid))
        })
        .collect();
    // Stable, so equal depths keep discovery order.
    lowest.sort_by_key(|(combined, _)| *combined);
    if let Some(&(minimal, _)) = lowest.first() {
        lowest.retain(|(combined, _)| *combined == minimal);
    }

    let mut ranked = lowest.into_iter().map(|(_, oid)| oid);
    let result = MergeBase {
        chosen: ranked.next(),
        alternates: ranked.collect(),
    };
    debug!(
        visited,
        chosen = ?result.chosen,
        alternates = result.alternates.len(),
        "merge-base search finished"
    );
    Ok(result)
}

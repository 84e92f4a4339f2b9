//! Three-way snapshot assembly for one conflicted path.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use git2::Oid;
use tracing::{debug, warn};

use super::align::{infer_base_spans, span_text, AlignLimits};
use super::dependencies;
use super::markers::scan;
use crate::config::ExtractorPolicy;
use crate::data::{
    ConflictContext, ConflictMarker, StageContent, StageStates, ThreeWaySnapshot,
};
use crate::git::{commit_log, find_merge_base, CommitSummary, GitRepository, Stage};

/// Merge base and per-side logs for the current merge.
#[derive(Debug, Clone, Default)]
struct History {
    merge_base: Option<String>,
    merge_base_alternates: Vec<String>,
    ours_commits: Vec<CommitSummary>,
    theirs_commits: Vec<CommitSummary>,
    warnings: Vec<String>,
}

/// Builds snapshots from repository state.
pub struct Extractor<'a> {
    repo: &'a GitRepository,
    policy: &'a ExtractorPolicy,
}

impl<'a> Extractor<'a> {
    /// Creates an extractor over an opened repository.
    pub fn new(repo: &'a GitRepository, policy: &'a ExtractorPolicy) -> Self {
        Self { repo, policy }
    }

    /// Builds the full snapshot for an unresolved path.
    pub fn extract(&self, path: &str, with_context: bool) -> Result<ThreeWaySnapshot> {
        let path = self.repo.relative_path(path);
        self.repo.require_unresolved(&path)?;

        let base = self.stage(&path, Stage::Base)?;
        let ours = self.stage(&path, Stage::Ours)?;
        let theirs = self.stage(&path, Stage::Theirs)?;
        let history = self.history(&path)?;
        let mut warnings = history.warnings;

        let markers = match self.repo.read_worktree(&path)? {
            None => Vec::new(),
            Some(bytes) => match String::from_utf8(bytes) {
                Ok(text) => {
                    let (markers, notes) = locate_markers(&text, base.text(), self.limits());
                    warnings.extend(notes);
                    markers
                }
                Err(_) => {
                    warnings.push("working-tree file is not UTF-8; conflict regions not located".to_string());
                    Vec::new()
                }
            },
        };

        let dependencies = with_context.then(|| {
            dependencies::scan(
                Path::new(&path),
                ours.text(),
                theirs.text(),
                self.policy.max_dependencies,
            )
        });

        debug!(path = %path, markers = markers.len(), "snapshot built");
        Ok(ThreeWaySnapshot {
            stages: StageStates {
                base: base.state(),
                ours: ours.state(),
                theirs: theirs.state(),
            },
            filepath: path,
            base,
            ours,
            theirs,
            merge_base: history.merge_base,
            merge_base_alternates: history.merge_base_alternates,
            ours_commits: history.ours_commits,
            theirs_commits: history.theirs_commits,
            markers,
            dependencies,
            warnings,
        })
    }

    /// Builds only the history half of a snapshot, with dependencies.
    pub fn context(&self, path: &str) -> Result<ConflictContext> {
        let path = self.repo.relative_path(path);
        self.repo.require_unresolved(&path)?;

        let ours = self.stage(&path, Stage::Ours)?;
        let theirs = self.stage(&path, Stage::Theirs)?;
        let history = self.history(&path)?;

        Ok(ConflictContext {
            dependencies: dependencies::scan(
                Path::new(&path),
                ours.text(),
                theirs.text(),
                self.policy.max_dependencies,
            ),
            filepath: path,
            merge_base: history.merge_base,
            merge_base_alternates: history.merge_base_alternates,
            ours_commits: history.ours_commits,
            theirs_commits: history.theirs_commits,
            warnings: history.warnings,
        })
    }

    fn limits(&self) -> AlignLimits {
        AlignLimits {
            max_cells: self.policy.max_alignment_cells,
            refine_window: self.policy.refine_window,
        }
    }

    fn stage(&self, path: &str, stage: Stage) -> Result<StageContent> {
        Ok(StageContent::from_bytes(
            self.repo.get_stage(path, stage)?.into_bytes(),
        ))
    }

    fn history(&self, path: &str) -> Result<History> {
        let Some(heads) = self.repo.merge_heads()? else {
            return Ok(History {
                warnings: vec!["no merge head recorded; commit history unavailable".to_string()],
                ..History::default()
            });
        };

        let git = self.repo.repository();
        let found = find_merge_base(
            git,
            heads.ours,
            heads.theirs,
            Duration::from_millis(self.policy.merge_base_timeout_ms),
        )?;

        let mut warnings = Vec::new();
        if let Some(ambiguity) = found.ambiguity() {
            warn!(%ambiguity, "several merge bases");
            warnings.push(ambiguity.to_string());
        }

        let (hide_ours, hide_theirs): (Vec<Oid>, Vec<Oid>) = match found.chosen {
            Some(chosen) => {
                let all: Vec<Oid> = std::iter::once(chosen)
                    .chain(found.alternates.iter().copied())
                    .collect();
                (all.clone(), all)
            }
            None => {
                warnings.push("histories share no common ancestor".to_string());
                (vec![heads.theirs], vec![heads.ours])
            }
        };

        let file = Path::new(path);
        Ok(History {
            merge_base: found.chosen.map(|oid| oid.to_string()),
            merge_base_alternates: found.alternates.iter().map(Oid::to_string).collect(),
            ours_commits: commit_log(git, heads.ours, &hide_ours, Some(file))?,
            theirs_commits: commit_log(git, heads.theirs, &hide_theirs, Some(file))?,
            warnings,
        })
    }
}

/// Finds conflict regions in working-tree text and infers their base text.
///
/// A diff3-style recorded base wins over inference. Returns the markers and
/// any warnings about abandoned alignment.
pub fn locate_markers(
    worktree: &str,
    base: Option<&str>,
    limits: AlignLimits,
) -> (Vec<ConflictMarker>, Vec<String>) {
    let scanned = scan(worktree);
    let mut warnings = Vec::new();

    let spans = match base {
        Some(base) if scanned.has_conflicts() => {
            let base_lines: Vec<&str> = base.lines().collect();
            let spans = infer_base_spans(&scanned, &base_lines, limits);
            if spans.iter().all(Option::is_none) {
                warn!("base alignment abandoned");
                warnings.push(format!(
                    "base alignment exceeded {} cells; base_text unavailable",
                    limits.max_cells
                ));
            }
            spans
                .into_iter()
                .map(|span| span.map(|span| span_text(base, &span)))
                .collect()
        }
        _ => vec![None; scanned.regions.len()],
    };

    let markers = scanned
        .regions
        .into_iter()
        .zip(spans)
        .map(|(region, inferred)| ConflictMarker {
            start_line: region.start_line,
            end_line: region.end_line,
            ours_text: region.ours_text,
            theirs_text: region.theirs_text,
            base_text: region.recorded_base.or(inferred),
            ours_label: region.ours_label,
            theirs_label: region.theirs_label,
        })
        .collect();

    (markers, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: AlignLimits = AlignLimits {
        max_cells: 1_000_000,
        refine_window: 64,
    };

    #[test]
    fn markers_carry_inferred_base() {
        let worktree = "import os\n<<<<<<< ours\nimport sys\n=======\nimport json\n>>>>>>> theirs\n\ndef main():\n    pass\n";
        let base = "import os\n\ndef main():\n    pass\n";
        let (markers, warnings) = locate_markers(worktree, Some(base), LIMITS);
        assert!(warnings.is_empty());
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].start_line, 2);
        assert_eq!(markers[0].end_line, 6);
        assert_eq!(markers[0].base_text.as_deref(), Some(""));
        assert_eq!(markers[0].ours_text, "import sys\n");
    }

    #[test]
    fn inferred_base_is_byte_faithful() {
        let worktree = "a\n<<<<<<< ours\nx\n=======\ny\n>>>>>>> theirs\n";
        let (markers, _) = locate_markers(worktree, Some("a\nb"), LIMITS);
        assert_eq!(markers[0].base_text.as_deref(), Some("b"));

        let (markers, _) = locate_markers(worktree, Some("a\r\nb\r\n"), LIMITS);
        assert_eq!(markers[0].base_text.as_deref(), Some("b\r\n"));
    }

    #[test]
    fn absent_base_leaves_base_text_null() {
        let worktree = "<<<<<<< ours\na\n=======\nb\n>>>>>>> theirs\n";
        let (markers, _) = locate_markers(worktree, None, LIMITS);
        assert_eq!(markers[0].base_text, None);
    }

    #[test]
    fn recorded_base_wins() {
        let worktree = "<<<<<<< ours\na = 1\n||||||| base\na = 0\n=======\na = 2\n>>>>>>> theirs\n";
        let (markers, _) = locate_markers(worktree, Some("something else\n"), LIMITS);
        assert_eq!(markers[0].base_text.as_deref(), Some("a = 0\n"));
    }

    #[test]
    fn over_budget_alignment_warns() {
        let worktree = "x\n<<<<<<< ours\na\n=======\nb\n>>>>>>> theirs\ny\n";
        let limits = AlignLimits {
            max_cells: 2,
            refine_window: 64,
        };
        let (markers, warnings) = locate_markers(worktree, Some("p\nq\nr\n"), limits);
        assert_eq!(markers[0].base_text, None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn markers_are_ordered() {
        let worktree = "<<<<<<< a\n1\n=======\n2\n>>>>>>> b\nmid\n<<<<<<< a\n3\n=======\n4\n>>>>>>> b\n";
        let (markers, _) = locate_markers(worktree, Some("0\nmid\n5\n"), LIMITS);
        assert!(markers.windows(2).all(|w| w[0].end_line < w[1].start_line));
        assert_eq!(markers[0].base_text.as_deref(), Some("0\n"));
        assert_eq!(markers[1].base_text.as_deref(), Some("5\n"));
    }
}

//! Fixed JSON output schema.
//!
//! Every field is always serialized; absent values appear as `null`.

use std::fmt;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::git::CommitSummary;
use crate::language::Language;

pub mod json;

pub use json::*;

/// Unmerged state of a path, derived from the index stages present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmergedStatus {
    /// Stages 1, 2 and 3.
    BothModified,
    /// Stages 2 and 3.
    BothAdded,
    /// Stages 1 and 3.
    DeletedByUs,
    /// Stages 1 and 2.
    DeletedByThem,
    /// Stage 2 only.
    AddedByUs,
    /// Stage 3 only.
    AddedByThem,
    /// Stage 1 only.
    BothDeleted,
}

impl UnmergedStatus {
    /// Derives the status from stage presence.
    pub fn from_stages(base: bool, ours: bool, theirs: bool) -> Self {
        match (base, ours, theirs) {
            (true, true, true) => Self::BothModified,
            (false, true, true) => Self::BothAdded,
            (true, false, true) => Self::DeletedByUs,
            (true, true, false) => Self::DeletedByThem,
            (false, true, false) => Self::AddedByUs,
            (false, false, true) => Self::AddedByThem,
            _ => Self::BothDeleted,
        }
    }
}

/// A path with unresolved index entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictedFile {
    /// Path relative to the working-tree root.
    pub path: String,
    /// Which sides are present in the index.
    pub status: UnmergedStatus,
}

/// Content of one index stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageContent {
    /// UTF-8 text.
    Text(String),
    /// Bytes that are not valid UTF-8.
    Binary(Vec<u8>),
    /// The stage does not exist.
    Deleted,
}

impl StageContent {
    /// Builds from raw blob bytes.
    pub fn from_bytes(bytes: Option<Vec<u8>>) -> Self {
        match bytes {
            None => Self::Deleted,
            Some(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Self::Text(text),
                Err(err) => Self::Binary(err.into_bytes()),
            },
        }
    }

    /// Text content, if the stage exists and is text.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the stage is absent.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Presence state reported alongside the content.
    pub fn state(&self) -> StageState {
        match self {
            Self::Text(_) => StageState::Present,
            Self::Binary(_) => StageState::Binary,
            Self::Deleted => StageState::Deleted,
        }
    }
}

impl Serialize for StageContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Binary(bytes) => {
                serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            Self::Deleted => serializer.serialize_str("deleted"),
        }
    }
}

/// How a stage's content field should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Text content.
    Present,
    /// Base64 of the raw bytes.
    Binary,
    /// The literal `"deleted"`.
    Deleted,
}

/// Stage states for the three sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStates {
    /// Common ancestor.
    pub base: StageState,
    /// Receiving branch.
    pub ours: StageState,
    /// Incoming branch.
    pub theirs: StageState,
}

/// One conflict region in the working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictMarker {
    /// 1-based line of the opening delimiter.
    pub start_line: usize,
    /// 1-based line of the closing delimiter.
    pub end_line: usize,
    /// Ours section.
    pub ours_text: String,
    /// Theirs section.
    pub theirs_text: String,
    /// Inferred base section; null when alignment failed.
    pub base_text: Option<String>,
    /// Label after the opening delimiter.
    pub ours_label: Option<String>,
    /// Label after the closing delimiter.
    pub theirs_label: Option<String>,
}

/// Imports and top-level declarations of one side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideDependencies {
    /// Import-like statements, trimmed.
    pub imports: Vec<String>,
    /// Top-level declaration names.
    pub declarations: Vec<String>,
}

/// Dependency scan over ours and theirs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyScan {
    /// Language the scan used.
    pub language: Language,
    /// Ours side.
    pub ours: SideDependencies,
    /// Theirs side.
    pub theirs: SideDependencies,
}

/// Complete three-way view of one conflicted file.
#[derive(Debug, Clone, Serialize)]
pub struct ThreeWaySnapshot {
    /// Path relative to the working-tree root.
    pub filepath: String,
    /// Stage 1.
    pub base: StageContent,
    /// Stage 2.
    pub ours: StageContent,
    /// Stage 3.
    pub theirs: StageContent,
    /// How to read the three content fields.
    pub stages: StageStates,
    /// Lowest common ancestor of the two tips.
    pub merge_base: Option<String>,
    /// Other ancestors tied with `merge_base`.
    pub merge_base_alternates: Vec<String>,
    /// Ours-side commits after the merge base, oldest first.
    pub ours_commits: Vec<CommitSummary>,
    /// Theirs-side commits after the merge base, oldest first.
    pub theirs_commits: Vec<CommitSummary>,
    /// Conflict regions in file order.
    pub markers: Vec<ConflictMarker>,
    /// Present only when requested.
    pub dependencies: Option<DependencyScan>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<String>,
}

/// History half of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictContext {
    /// Path relative to the working-tree root.
    pub filepath: String,
    /// Lowest common ancestor of the two tips.
    pub merge_base: Option<String>,
    /// Other ancestors tied with `merge_base`.
    pub merge_base_alternates: Vec<String>,
    /// Ours-side commits after the merge base, oldest first.
    pub ours_commits: Vec<CommitSummary>,
    /// Theirs-side commits after the merge base, oldest first.
    pub theirs_commits: Vec<CommitSummary>,
    /// Imports and declarations on both sides.
    pub dependencies: DependencyScan,
    /// Non-fatal diagnostics.
    pub warnings: Vec<String>,
}

/// Kind of conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    /// Only import statements changed.
    Import,
    /// Sides differ only in whitespace.
    Whitespace,
    /// One identifier renamed.
    Rename,
    /// A declaration's parameter list changed.
    Signature,
    /// Structural reshaping.
    Refactor,
    /// Diverging logic.
    Logic,
    /// One side deleted the file.
    ModifyDelete,
    /// No conflict regions found.
    Unknown,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Import => "IMPORT",
            Self::Whitespace => "WHITESPACE",
            Self::Rename => "RENAME",
            Self::Signature => "SIGNATURE",
            Self::Refactor => "REFACTOR",
            Self::Logic => "LOGIC",
            Self::ModifyDelete => "MODIFY_DELETE",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Estimated resolution difficulty, in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    /// Mechanical.
    Easy,
    /// Needs a little care.
    Medium,
    /// Structural.
    MediumHard,
    /// Needs judgment.
    Hard,
    /// Contradictory intent; hand to a human.
    Escalate,
}

impl Difficulty {
    /// Whether a deterministic rule may resolve this.
    pub fn allows_auto_resolution(self) -> bool {
        self <= Self::Medium
    }
}

/// Verdict for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerCategory {
    /// 1-based line of the opening delimiter.
    pub start_line: usize,
    /// 1-based line of the closing delimiter.
    pub end_line: usize,
    /// Detected kind.
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    /// Estimated difficulty.
    pub difficulty: Difficulty,
    /// Whether a deterministic rule may resolve it.
    pub auto_resolvable: bool,
    /// Why this verdict was reached.
    pub reason: String,
}

/// Verdict for a whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCategory {
    /// Path relative to the working-tree root.
    pub filepath: String,
    /// Most severe region type.
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    /// Highest region difficulty.
    pub difficulty: Difficulty,
    /// True only when every region is auto-resolvable.
    pub auto_resolvable: bool,
    /// Region types in file order.
    pub all_types: Vec<ConflictType>,
    /// Number of regions.
    pub num_conflicts: usize,
    /// Per-region verdicts.
    pub markers: Vec<MarkerCategory>,
}

/// Outcome of a syntax check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Content parsed cleanly.
    Valid,
    /// Content has an error.
    Error,
}

/// Result of validating proposed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Path the content is destined for.
    pub path: String,
    /// Language used for dispatch.
    pub language: Language,
    /// Checker that ran.
    pub checker: String,
    /// Valid or error.
    pub status: ValidationStatus,
    /// Error description, or null when valid.
    pub message: Option<String>,
    /// 1-based line of the error.
    pub line: Option<usize>,
    /// 1-based column of the error.
    pub column: Option<usize>,
}

impl ValidationResult {
    /// Whether the content passed.
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}

/// Safety branch protecting a tip pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Branch name.
    pub backup_branch: String,
    /// Creation time, second resolution.
    pub created_at: DateTime<Utc>,
    /// Ours tip the branch points at.
    pub ours_tip: String,
    /// Theirs tip kept reachable alongside it.
    pub theirs_tip: String,
}

/// Result of writing and staging a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOutcome {
    /// Path that was written.
    pub path: String,
    /// Whether the path was staged.
    pub staged: bool,
    /// Validation that gated the write.
    pub validation: ValidationResult,
}

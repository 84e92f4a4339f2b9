//! Tunable policy for extraction, classification, backups and validation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{ConflictType, Difficulty};
use crate::error::ToolError;
use crate::utils::settings::get_env_var;

/// Repository-local policy file name.
pub const POLICY_FILE_NAME: &str = ".conflict-lens.yaml";

/// Environment variable naming an explicit policy file.
pub const POLICY_ENV_VAR: &str = "CONFLICT_LENS_CONFIG";

/// The six region types that take part in severity ordering.
pub const MARKER_TYPES: [ConflictType; 6] = [
    ConflictType::Logic,
    ConflictType::Refactor,
    ConflictType::Signature,
    ConflictType::Rename,
    ConflictType::Whitespace,
    ConflictType::Import,
];

/// Complete policy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Policy {
    /// Classifier thresholds and orderings.
    pub classifier: ClassifierPolicy,
    /// Extractor limits.
    pub extractor: ExtractorPolicy,
    /// Backup naming and locking.
    pub backup: BackupPolicy,
    /// Validator dispatch overrides.
    pub validator: ValidatorPolicy,
}

/// Classifier thresholds and orderings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierPolicy {
    /// Largest character edit fraction left over once a rename is applied.
    pub rename_max_edit_fraction: f64,
    /// Statement-count difference between the sides that signals a refactor.
    pub refactor_statement_delta: usize,
    /// Nesting-depth difference between the sides that signals a refactor.
    pub refactor_depth_delta: usize,
    /// Changed-token similarity below which LOGIC escalates.
    pub escalate_similarity_floor: f64,
    /// Region types from most to least severe.
    pub severity: Vec<ConflictType>,
    /// Difficulty assigned to each region type.
    pub difficulty: BTreeMap<ConflictType, Difficulty>,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            rename_max_edit_fraction: 0.5,
            refactor_statement_delta: 3,
            refactor_depth_delta: 2,
            escalate_similarity_floor: 0.1,
            severity: MARKER_TYPES.to_vec(),
            difficulty: BTreeMap::from([
                (ConflictType::Import, Difficulty::Easy),
                (ConflictType::Whitespace, Difficulty::Easy),
                (ConflictType::Rename, Difficulty::Medium),
                (ConflictType::Signature, Difficulty::Medium),
                (ConflictType::Refactor, Difficulty::MediumHard),
                (ConflictType::Logic, Difficulty::Hard),
                (ConflictType::ModifyDelete, Difficulty::Hard),
                (ConflictType::Unknown, Difficulty::Medium),
            ]),
        }
    }
}

impl ClassifierPolicy {
    /// Position in the severity list; lower is more severe.
    pub fn severity_rank(&self, ty: ConflictType) -> usize {
        self.severity
            .iter()
            .position(|t| *t == ty)
            .unwrap_or(self.severity.len())
    }

    /// Difficulty for a type, falling back to the built-in table.
    pub fn difficulty_for(&self, ty: ConflictType) -> Difficulty {
        self.difficulty.get(&ty).copied().unwrap_or_else(|| {
            Self::default()
                .difficulty
                .get(&ty)
                .copied()
                .unwrap_or(Difficulty::Hard)
        })
    }
}

/// Extractor limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractorPolicy {
    /// Deadline for merge-base discovery.
    pub merge_base_timeout_ms: u64,
    /// Largest alignment table before base inference is abandoned.
    pub max_alignment_cells: usize,
    /// Largest anchor window searched for a tighter base span.
    pub refine_window: usize,
    /// Cap on each dependency list.
    pub max_dependencies: usize,
}

impl Default for ExtractorPolicy {
    fn default() -> Self {
        Self {
            merge_base_timeout_ms: 10_000,
            max_alignment_cells: 4_000_000,
            refine_window: 64,
            max_dependencies: 50,
        }
    }
}

/// Backup naming and locking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackupPolicy {
    /// Branch name prefix.
    pub prefix: String,
    /// How long to wait for the repository lock.
    pub lock_timeout_ms: u64,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            prefix: "backup-merge-".to_string(),
            lock_timeout_ms: 5_000,
        }
    }
}

/// Validator dispatch overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidatorPolicy {
    /// Glob pattern to language name, checked before extension dispatch.
    pub overrides: BTreeMap<String, String>,
}

impl Policy {
    /// Loads the policy for a working tree.
    ///
    /// `CONFLICT_LENS_CONFIG` (environment, then settings file) wins over
    /// `<workdir>/.conflict-lens.yaml`; with neither present the defaults apply.
    pub fn load_for_workdir(workdir: &Path) -> Result<Self> {
        let path = get_env_var(POLICY_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| workdir.join(POLICY_FILE_NAME));
        Self::load_from_path(&path)
    }

    /// Loads a policy file, returning defaults when it does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file: {}", path.display()))?;

        let policy: Self = serde_yaml::from_str(&content).map_err(|e| {
            ToolError::Usage(format!("invalid policy file {}: {e}", path.display()))
        })?;
        policy.check()?;
        Ok(policy)
    }

    /// Rejects values no classifier can work with.
    pub fn check(&self) -> Result<()> {
        let c = &self.classifier;
        for (name, value) in [
            ("rename_max_edit_fraction", c.rename_max_edit_fraction),
            ("escalate_similarity_floor", c.escalate_similarity_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ToolError::Usage(format!(
                    "classifier.{name} must be between 0 and 1, got {value}"
                ))
                .into());
            }
        }
        if let Some(missing) = MARKER_TYPES.iter().find(|t| !c.severity.contains(t)) {
            return Err(ToolError::Usage(format!(
                "classifier.severity must list every region type; {missing} is missing"
            ))
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_follow_documented_order() {
        let policy = ClassifierPolicy::default();
        assert!(
            policy.severity_rank(ConflictType::Logic) < policy.severity_rank(ConflictType::Import)
        );
        assert_eq!(policy.difficulty_for(ConflictType::Refactor), Difficulty::MediumHard);
        assert_eq!(policy.difficulty_for(ConflictType::Whitespace), Difficulty::Easy);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let policy = Policy::load_from_path(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(policy, Policy::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(POLICY_FILE_NAME);
        std::fs::write(
            &path,
            "classifier:\n  escalate_similarity_floor: 0.25\n  difficulty:\n    RENAME: HARD\nbackup:\n  prefix: safety-\n",
        )
        .unwrap();

        let policy = Policy::load_from_path(&path).unwrap();
        assert!((policy.classifier.escalate_similarity_floor - 0.25).abs() < f64::EPSILON);
        assert_eq!(policy.classifier.difficulty_for(ConflictType::Rename), Difficulty::Hard);
        // Types absent from an overridden map fall back to the built-in table.
        assert_eq!(policy.classifier.difficulty_for(ConflictType::Import), Difficulty::Easy);
        assert_eq!(policy.backup.prefix, "safety-");
        assert_eq!(policy.extractor, ExtractorPolicy::default());
    }

    #[test]
    fn out_of_range_fraction_is_usage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(POLICY_FILE_NAME);
        std::fs::write(&path, "classifier:\n  rename_max_edit_fraction: 1.5\n").unwrap();

        let err = Policy::load_from_path(&path).unwrap_err();
        assert!(matches!(ToolError::classify(&err), ToolError::Usage(_)));
    }

    #[test]
    fn incomplete_severity_is_rejected() {
        let mut policy = Policy::default();
        policy.classifier.severity = vec![ConflictType::Logic];
        assert!(policy.check().is_err());
    }
}

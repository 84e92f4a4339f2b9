use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use conflict_lens::data::{
    ConflictType, StageContent, StageState, UnmergedStatus, ValidationStatus,
};
use conflict_lens::error::ErrorKind;
use conflict_lens::{Facade, ToolError};
use git2::build::CheckoutBuilder;
use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

const BASE_PY: &str = "import os\nimport sys\n\ndef main():\n    return 0\n";
const OURS_PY: &str = "import os\nimport sys\nimport json\n\ndef main():\n    return 0\n";
const THEIRS_PY: &str = "import os\nimport sys\nimport re\n\ndef main():\n    return 0\n";

const BASE_RS: &str = "fn total(items: &[u32]) -> u32 {\n    items.iter().sum()\n}\n";
const OURS_RS: &str = "fn total(items: &[u32]) -> u32 {\n    items.iter().copied().sum()\n}\n";
const THEIRS_RS: &str = "fn total(items: &[u32]) -> u32 {\n    items.iter().fold(0, |a, b| a + b)\n}\n";

/// Test setup that builds a repository stopped in the middle of a conflicted merge
struct TestRepo {
    _temp_dir: TempDir,
    repo_path: PathBuf,
    repo: Repository,
    main_ref: String,
}

impl TestRepo {
    fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().to_path_buf();
        let repo = Repository::init(&repo_path)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok(TestRepo {
            _temp_dir: temp_dir,
            repo_path,
            repo,
            main_ref: String::new(),
        })
    }

    /// Writes (or deletes, for `None`) files and commits them on HEAD.
    fn commit(&self, message: &str, files: &[(&str, Option<&str>)]) -> Result<Oid> {
        let mut index = self.repo.index()?;
        for (path, content) in files {
            let full = self.repo_path.join(path);
            match content {
                Some(content) => {
                    if let Some(parent) = full.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&full, content)?;
                    index.add_path(Path::new(path))?;
                }
                None => {
                    fs::remove_file(&full)?;
                    index.remove_path(Path::new(path))?;
                }
            }
        }
        index.write()?;

        let signature = Signature::now("Test User", "test@example.com")?;
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        Ok(self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?)
    }

    fn switch_to(&self, reference: &str) -> Result<()> {
        self.repo.set_head(reference)?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force().remove_untracked(true)))?;
        Ok(())
    }

    /// Base commit, a `feature` branch commit, a diverging main commit, then
    /// `merge feature` left conflicted.
    fn conflicted(
        mut self,
        base: &[(&str, Option<&str>)],
        theirs: &[(&str, Option<&str>)],
        ours: &[(&str, Option<&str>)],
    ) -> Result<Merged> {
        let base_oid = self.commit("Base commit", base)?;
        self.main_ref = self
            .repo
            .head()?
            .name()
            .unwrap_or("refs/heads/master")
            .to_string();

        self.repo
            .branch("feature", &self.repo.find_commit(base_oid)?, false)?;
        self.switch_to("refs/heads/feature")?;
        let theirs_oid = self.commit("Feature change", theirs)?;

        self.switch_to(&self.main_ref.clone())?;
        let ours_oid = self.commit("Main change", ours)?;

        {
            let feature = self.repo.find_reference("refs/heads/feature")?;
            let annotated = self.repo.reference_to_annotated_commit(&feature)?;
            self.repo.merge(&[&annotated], None, None)?;
        }

        Ok(Merged {
            test_repo: self,
            base: base_oid,
            ours: ours_oid,
            theirs: theirs_oid,
        })
    }
}

struct Merged {
    test_repo: TestRepo,
    base: Oid,
    ours: Oid,
    theirs: Oid,
}

impl Merged {
    fn facade(&self) -> Facade {
        Facade::open(&self.test_repo.repo_path).unwrap()
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.test_repo.repo_path.join(relative)
    }
}

fn two_file_merge() -> Merged {
    TestRepo::new()
        .unwrap()
        .conflicted(
            &[
                ("src/app.py", Some(BASE_PY)),
                ("lib/total.rs", Some(BASE_RS)),
                ("README.md", Some("readme\n")),
            ],
            &[
                ("src/app.py", Some(THEIRS_PY)),
                ("lib/total.rs", Some(THEIRS_RS)),
            ],
            &[
                ("src/app.py", Some(OURS_PY)),
                ("lib/total.rs", Some(OURS_RS)),
                ("README.md", Some("readme, clean change\n")),
            ],
        )
        .unwrap()
}

fn kind_of(err: &anyhow::Error) -> ErrorKind {
    ToolError::classify(err).kind()
}

#[test]
fn list_returns_unresolved_paths_in_order() {
    let merged = two_file_merge();
    let facade = merged.facade();

    let files = facade.list().unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["lib/total.rs", "src/app.py"]);
    assert!(files
        .iter()
        .all(|f| f.status == UnmergedStatus::BothModified));

    assert_eq!(facade.list().unwrap(), files);
}

#[test]
fn extract_reports_stages_history_and_markers() {
    let merged = two_file_merge();
    let snapshot = merged.facade().extract("src/app.py", false).unwrap();

    assert_eq!(snapshot.filepath, "src/app.py");
    assert_eq!(snapshot.base, StageContent::Text(BASE_PY.to_string()));
    assert_eq!(snapshot.ours, StageContent::Text(OURS_PY.to_string()));
    assert_eq!(snapshot.theirs, StageContent::Text(THEIRS_PY.to_string()));
    assert_eq!(snapshot.stages.base, StageState::Present);

    assert_eq!(snapshot.merge_base, Some(merged.base.to_string()));
    assert!(snapshot.merge_base_alternates.is_empty());
    let ours_ids: Vec<&str> = snapshot.ours_commits.iter().map(|c| c.id.as_str()).collect();
    let theirs_ids: Vec<&str> = snapshot.theirs_commits.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ours_ids, [merged.ours.to_string()]);
    assert_eq!(theirs_ids, [merged.theirs.to_string()]);
    assert!(snapshot.ours_commits[0].touches_path);
    assert_eq!(snapshot.theirs_commits[0].summary, "Feature change");

    assert_eq!(snapshot.markers.len(), 1);
    let marker = &snapshot.markers[0];
    assert_eq!(marker.ours_text, "import json\n");
    assert_eq!(marker.theirs_text, "import re\n");
    assert!(marker.start_line < marker.end_line);
    assert!(snapshot.dependencies.is_none());
}

#[test]
fn extract_accepts_dot_prefixed_paths_and_scans_dependencies() {
    let merged = two_file_merge();
    let snapshot = merged.facade().extract("./src/app.py", true).unwrap();
    assert_eq!(snapshot.filepath, "src/app.py");

    let deps = snapshot.dependencies.unwrap();
    assert!(deps.ours.imports.iter().any(|i| i == "import json"));
    assert!(deps.theirs.imports.iter().any(|i| i == "import re"));
    assert!(deps.ours.declarations.iter().any(|d| d == "main"));
}

#[test]
fn extract_rejects_paths_that_are_not_unresolved() {
    let merged = two_file_merge();
    let facade = merged.facade();

    let clean = facade.extract("README.md", false).unwrap_err();
    assert_eq!(kind_of(&clean), ErrorKind::RepositoryStateError);
    assert!(clean.to_string().contains("README.md"));

    let missing = facade.extract("nope.txt", false).unwrap_err();
    assert_eq!(kind_of(&missing), ErrorKind::RepositoryStateError);
}

#[test]
fn modify_delete_conflict() {
    let merged = TestRepo::new()
        .unwrap()
        .conflicted(
            &[("config.py", Some("DEBUG = False\n"))],
            &[("config.py", None)],
            &[("config.py", Some("DEBUG = True\n"))],
        )
        .unwrap();
    let facade = merged.facade();

    let files = facade.list().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].status, UnmergedStatus::DeletedByThem);

    let snapshot = facade.extract("config.py", false).unwrap();
    assert_eq!(snapshot.theirs, StageContent::Deleted);
    assert_eq!(snapshot.stages.theirs, StageState::Deleted);
    assert_eq!(snapshot.ours, StageContent::Text("DEBUG = True\n".to_string()));

    let category = facade.categorize("config.py").unwrap();
    assert_eq!(category.conflict_type, ConflictType::ModifyDelete);
    assert!(!category.auto_resolvable);
    assert_eq!(category.num_conflicts, 0);
}

#[test]
fn categorize_import_conflict() {
    let merged = two_file_merge();
    let category = merged.facade().categorize("src/app.py").unwrap();

    assert_eq!(category.conflict_type, ConflictType::Import);
    assert_eq!(category.num_conflicts, 1);
    assert_eq!(category.all_types, [ConflictType::Import]);
    assert!(category.auto_resolvable);
}

#[test]
fn read_only_commands_leave_repository_untouched() {
    let merged = two_file_merge();
    let facade = merged.facade();
    let before = fs::read(merged.path("src/app.py")).unwrap();

    facade.extract("src/app.py", true).unwrap();
    facade.categorize("src/app.py").unwrap();
    facade.context("src/app.py").unwrap();
    let result = facade
        .validate("src/app.py", "def broken(:\n", None)
        .unwrap();
    assert_eq!(result.status, ValidationStatus::Error);

    assert_eq!(fs::read(merged.path("src/app.py")).unwrap(), before);
    assert_eq!(facade.list().unwrap().len(), 2);
}

#[test]
fn worktree_file_with_markers_fails_validation() {
    let merged = two_file_merge();
    let facade = merged.facade();
    let content = facade.worktree_content("src/app.py").unwrap();
    let result = facade.validate("src/app.py", &content, None).unwrap();

    assert_eq!(result.status, ValidationStatus::Error);
    assert!(result.message.unwrap().contains("conflict delimiter"));
}

#[test]
fn backup_is_idempotent_for_a_tip_pair() {
    let merged = two_file_merge();
    let facade = merged.facade();

    let first = facade.backup(None).unwrap();
    let second = facade.backup(None).unwrap();
    assert_eq!(first, second);
    assert!(first.backup_branch.starts_with("backup-merge-"));
    assert_eq!(first.ours_tip, merged.ours.to_string());
    assert_eq!(first.theirs_tip, merged.theirs.to_string());

    let branch = merged
        .test_repo
        .repo
        .find_branch(&first.backup_branch, git2::BranchType::Local)
        .unwrap();
    assert_eq!(branch.get().target(), Some(merged.ours));
}

#[test]
fn resolve_writes_and_stages_valid_content() {
    let merged = two_file_merge();
    let facade = merged.facade();
    let resolved = "import os\nimport sys\nimport json\nimport re\n\ndef main():\n    return 0\n";

    let outcome = facade.resolve("src/app.py", resolved).unwrap();
    assert!(outcome.staged);
    assert_eq!(outcome.path, "src/app.py");
    assert!(outcome.validation.is_valid());

    assert_eq!(fs::read_to_string(merged.path("src/app.py")).unwrap(), resolved);
    let remaining: Vec<String> = facade.list().unwrap().into_iter().map(|f| f.path).collect();
    assert_eq!(remaining, ["lib/total.rs"]);
}

#[test]
fn resolve_rejects_invalid_content_without_writing() {
    let merged = two_file_merge();
    let facade = merged.facade();
    let before = fs::read(merged.path("lib/total.rs")).unwrap();

    let err = facade
        .resolve("lib/total.rs", "fn total(items: &[u32]) -> u32 {\n")
        .unwrap_err();
    assert_eq!(kind_of(&err), ErrorKind::ValidationError);
    assert_eq!(ToolError::classify(&err).exit_code(), 1);

    assert_eq!(fs::read(merged.path("lib/total.rs")).unwrap(), before);
    assert_eq!(facade.list().unwrap().len(), 2);
}

#[test]
fn resolve_restores_file_when_staging_fails() {
    let merged = two_file_merge();
    let facade = merged.facade();
    let before = fs::read(merged.path("src/app.py")).unwrap();
    // Another git process holding the index makes the index write fail.
    fs::write(merged.path(".git/index.lock"), b"").unwrap();

    let resolved = "import os\nimport sys\nimport json\nimport re\n\ndef main():\n    return 0\n";
    let err = facade.resolve("src/app.py", resolved).unwrap_err();
    assert_eq!(kind_of(&err), ErrorKind::InternalError);
    assert_eq!(ToolError::classify(&err).exit_code(), 3);
    assert!(ToolError::classify(&err)
        .to_string()
        .contains("working tree restored"));

    assert_eq!(fs::read(merged.path("src/app.py")).unwrap(), before);
    let remaining: Vec<String> = facade.list().unwrap().into_iter().map(|f| f.path).collect();
    assert_eq!(remaining, ["lib/total.rs", "src/app.py"]);
}

#[test]
fn non_repository_is_a_state_error() {
    let dir = TempDir::new().unwrap();
    let err = Facade::open(dir.path()).err().unwrap();
    let classified = ToolError::classify(&err);
    assert_eq!(classified.kind(), ErrorKind::RepositoryStateError);
    assert_eq!(classified.exit_code(), 2);
}

#[test]
fn backup_without_merge_is_a_state_error() {
    let test_repo = TestRepo::new().unwrap();
    test_repo
        .commit("Only commit", &[("a.txt", Some("a\n"))])
        .unwrap();
    let facade = Facade::open(&test_repo.repo_path).unwrap();

    let err = facade.backup(None).unwrap_err();
    assert_eq!(kind_of(&err), ErrorKind::RepositoryStateError);
    assert!(facade.list().unwrap().is_empty());
}

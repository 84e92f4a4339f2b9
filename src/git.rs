//! Git operations and repository management.

pub mod backup;
pub mod history;
pub mod lock;
pub mod merge_base;
pub mod repository;

pub use backup::create_backup;
pub use history::{commit_log, CommitSummary};
pub use lock::RepoLock;
pub use merge_base::{find_merge_base, MergeBase};
pub use repository::{GitRepository, MergeHeads, Stage, StageBlob};

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;

//! # conflict-lens
//!
//! Structured, machine-readable views of an in-progress git merge.
//!
//! ## Features
//!
//! - Lists unresolved paths and extracts base/ours/theirs for each
//! - Locates conflict regions and infers the base text they replaced
//! - Classifies regions (import, whitespace, rename, signature, refactor, logic)
//! - Validates proposed resolutions with tree-sitter and serde parsers
//! - Writes backup branches and stages validated resolutions
//!
//! ## Quick Start
//!
//! ```no_run
//! use conflict_lens::Facade;
//!
//! let facade = Facade::open(".")?;
//! for file in facade.list()? {
//!     let category = facade.categorize(&file.path)?;
//!     println!("{}: {}", file.path, category.conflict_type);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod conflict;
pub mod data;
pub mod error;
pub mod facade;
pub mod git;
pub mod language;
pub mod utils;
pub mod validate;

pub use crate::cli::Cli;
pub use crate::error::ToolError;
pub use crate::facade::Facade;

/// The current version of conflict-lens.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

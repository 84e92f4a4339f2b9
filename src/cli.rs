//! CLI interface for conflict-lens.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::facade::Facade;

pub mod backup;
pub mod categorize;
pub mod context;
pub mod extract;
pub mod list;
pub mod resolve;
pub mod validate;

/// conflict-lens: structured views of in-progress git merge conflicts.
#[derive(Parser)]
#[command(name = "conflict-lens")]
#[command(about = "Inspects, classifies and resolves git merge conflicts as JSON", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Repository to operate on.
    #[arg(short = 'C', long = "repo", value_name = "DIR", default_value = ".", global = true)]
    pub repo: PathBuf,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Lists unresolved paths.
    List(list::ListCommand),
    /// Emits the three-way snapshot of a conflicted path.
    Extract(extract::ExtractCommand),
    /// Emits merge history and dependency context of a conflicted path.
    Context(context::ContextCommand),
    /// Classifies the conflict regions of a path.
    Categorize(categorize::CategorizeCommand),
    /// Checks proposed content for syntax errors and leftover delimiters.
    Validate(validate::ValidateCommand),
    /// Creates a safety branch for the merge in progress.
    Backup(backup::BackupCommand),
    /// Validates, writes and stages a resolution.
    Resolve(resolve::ResolveCommand),
}

impl Cli {
    /// Executes the CLI command, returning the JSON document to print.
    pub fn execute(self) -> Result<String> {
        let facade = Facade::open(&self.repo)?;
        match self.command {
            Commands::List(cmd) => cmd.execute(&facade),
            Commands::Extract(cmd) => cmd.execute(&facade),
            Commands::Context(cmd) => cmd.execute(&facade),
            Commands::Categorize(cmd) => cmd.execute(&facade),
            Commands::Validate(cmd) => cmd.execute(&facade),
            Commands::Backup(cmd) => cmd.execute(&facade),
            Commands::Resolve(cmd) => cmd.execute(&facade),
        }
    }
}

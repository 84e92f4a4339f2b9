//! Categorize command: per-region and per-file conflict classification.

use anyhow::Result;
use clap::Parser;

use crate::data::to_json;
use crate::facade::Facade;

/// Categorize command options.
#[derive(Parser)]
pub struct CategorizeCommand {
    /// Conflicted path.
    #[arg(value_name = "PATH")]
    pub path: String,
}

impl CategorizeCommand {
    /// Executes the categorize command.
    pub fn execute(self, facade: &Facade) -> Result<String> {
        to_json(&facade.categorize(&self.path)?)
    }
}

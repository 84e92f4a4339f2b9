//! Extract command: three-way snapshot of one conflicted path.

use anyhow::Result;
use clap::Parser;

use crate::data::to_json;
use crate::facade::Facade;

/// Extract command options.
#[derive(Parser)]
pub struct ExtractCommand {
    /// Conflicted path, relative to the repository root or the current directory.
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Also scan imports and call sites on both sides.
    #[arg(long)]
    pub with_context: bool,
}

impl ExtractCommand {
    /// Executes the extract command.
    pub fn execute(self, facade: &Facade) -> Result<String> {
        to_json(&facade.extract(&self.path, self.with_context)?)
    }
}

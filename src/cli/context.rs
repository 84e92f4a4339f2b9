//! Context command.

use anyhow::Result;
use clap::Parser;

use crate::data::to_json;
use crate::facade::Facade;

/// Context command options.
#[derive(Parser)]
pub struct ContextCommand {
    /// Conflicted path.
    #[arg(value_name = "PATH")]
    pub path: String,
}

impl ContextCommand {
    /// Executes the context command.
    pub fn execute(self, facade: &Facade) -> Result<String> {
        to_json(&facade.context(&self.path)?)
    }
}

//! Resolve command: write and stage validated content for a conflicted path.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::data::to_json;
use crate::facade::Facade;
use crate::utils::general::read_content;

/// Resolve command options.
#[derive(Parser)]
pub struct ResolveCommand {
    /// Conflicted path to resolve.
    #[arg(value_name = "PATH")]
    pub path: String,

    /// File holding the resolved content; stdin when omitted or `-`.
    #[arg(long, value_name = "FILE", default_value = "-")]
    pub content_file: PathBuf,
}

impl ResolveCommand {
    /// Executes the resolve command.
    pub fn execute(self, facade: &Facade) -> Result<String> {
        let content = read_content(&self.content_file)?;
        to_json(&facade.resolve(&self.path, &content)?)
    }
}

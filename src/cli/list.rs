//! List command: unresolved paths of the merge in progress.

use anyhow::Result;
use clap::Parser;

use crate::data::to_json;
use crate::facade::Facade;

/// List command options.
#[derive(Parser)]
pub struct ListCommand {
    /// Include which stages each path has.
    #[arg(long)]
    pub detailed: bool,
}

impl ListCommand {
    /// Executes the list command.
    pub fn execute(self, facade: &Facade) -> Result<String> {
        let files = facade.list()?;
        if self.detailed {
            to_json(&files)
        } else {
            let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
            to_json(&paths)
        }
    }
}

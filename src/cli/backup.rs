//! Backup command.

use anyhow::Result;
use clap::Parser;

use crate::data::to_json;
use crate::facade::Facade;

/// Backup command options.
#[derive(Parser)]
pub struct BackupCommand {
    /// Branch name to use instead of the generated one.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}

impl BackupCommand {
    /// Executes the backup command.
    pub fn execute(self, facade: &Facade) -> Result<String> {
        to_json(&facade.backup(self.name.as_deref())?)
    }
}

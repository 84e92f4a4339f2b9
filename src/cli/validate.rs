//! Validate command: syntax check of proposed content.
//!
//! Invalid content is still a successful run; the verdict is in `status`.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::data::to_json;
use crate::error::ToolError;
use crate::facade::Facade;
use crate::language::Language;
use crate::utils::general::{read_content, read_piped};

/// Validate command options.
#[derive(Parser)]
pub struct ValidateCommand {
    /// Path the content is destined for; picks the checker.
    #[arg(value_name = "PATH")]
    pub path: String,

    /// File holding the proposed content (`-` for stdin). Without it, piped
    /// stdin is read, and with nothing piped the working-tree file.
    #[arg(long, value_name = "FILE")]
    pub content_file: Option<PathBuf>,

    /// Language to check as, overriding detection.
    #[arg(long, value_name = "LANGUAGE")]
    pub language: Option<String>,
}

impl ValidateCommand {
    /// Executes the validate command.
    pub fn execute(self, facade: &Facade) -> Result<String> {
        let stdin = io::stdin();
        let piped = (!stdin.is_terminal()).then(|| stdin.lock());
        self.run(facade, piped)
    }

    fn run<R: Read>(self, facade: &Facade, piped: Option<R>) -> Result<String> {
        let language = self
            .language
            .as_deref()
            .map(str::parse::<Language>)
            .transpose()
            .map_err(ToolError::Usage)?;

        let content = match (&self.content_file, piped) {
            (Some(source), _) => read_content(source)?,
            (None, Some(reader)) => match read_piped(reader)? {
                Some(content) => content,
                None => facade.worktree_content(&self.path)?,
            },
            (None, None) => facade.worktree_content(&self.path)?,
        };

        to_json(&facade.validate(&self.path, &content, language)?)
    }
}

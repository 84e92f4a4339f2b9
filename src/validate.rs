//! Pure syntax validation of proposed file content.
//!
//! Every check starts by rejecting leftover conflict delimiters, then hands
//! the content to the checker registered for the file's language. Nothing
//! here reads or writes the filesystem.

use std::path::Path;

use anyhow::Result;
use globset::{Glob, GlobMatcher};
use tracing::debug;

use crate::config::ValidatorPolicy;
use crate::conflict::markers::first_delimiter_line;
use crate::data::{ValidationResult, ValidationStatus};
use crate::error::ToolError;
use crate::language::Language;

pub mod structured;
pub mod treesitter;

pub use structured::{JsonChecker, TomlChecker, YamlChecker};
pub use treesitter::TreeSitterChecker;

/// Name reported when only the delimiter check ran.
pub const DELIMITER_CHECKER: &str = "conflict-markers";

/// A syntax problem found by a checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// What is wrong.
    pub message: String,
    /// 1-based line, when known.
    pub line: Option<usize>,
    /// 1-based column, when known.
    pub column: Option<usize>,
}

/// A per-language syntax check.
pub trait SyntaxChecker {
    /// Name reported in results.
    fn name(&self) -> &'static str;

    /// Returns the first problem in `content`, if any.
    fn check(&self, content: &str) -> Option<SyntaxError>;
}

/// Registered checker for a language, if there is one.
pub fn checker_for(language: Language) -> Option<Box<dyn SyntaxChecker>> {
    match language {
        Language::Json => Some(Box::new(JsonChecker)),
        Language::Yaml => Some(Box::new(YamlChecker)),
        Language::Toml => Some(Box::new(TomlChecker)),
        other => TreeSitterChecker::for_language(other)
            .map(|checker| Box::new(checker) as Box<dyn SyntaxChecker>),
    }
}

/// Dispatches content to checkers by path.
#[derive(Debug, Default)]
pub struct Validator {
    overrides: Vec<(GlobMatcher, Language)>,
}

impl Validator {
    /// Compiles the glob overrides of a policy.
    pub fn new(policy: &ValidatorPolicy) -> Result<Self> {
        let mut overrides = Vec::with_capacity(policy.overrides.len());
        for (pattern, language) in &policy.overrides {
            let glob = Glob::new(pattern).map_err(|e| {
                ToolError::Usage(format!("invalid validator override glob '{pattern}': {e}"))
            })?;
            let language: Language = language.parse().map_err(|e: String| {
                ToolError::Usage(format!("validator override '{pattern}': {e}"))
            })?;
            overrides.push((glob.compile_matcher(), language));
        }
        Ok(Self { overrides })
    }

    /// Language for a path: first matching override, else the extension.
    pub fn detect(&self, path: &str) -> Language {
        self.overrides
            .iter()
            .find(|(matcher, _)| matcher.is_match(path))
            .map_or_else(|| Language::from_path(Path::new(path)), |(_, language)| *language)
    }

    /// Checks content destined for `path`.
    ///
    /// `language` bypasses detection.
    pub fn validate(&self, path: &str, content: &str, language: Option<Language>) -> ValidationResult {
        let language = language.unwrap_or_else(|| self.detect(path));
        let checker = checker_for(language);
        let checker_name = checker.as_ref().map_or(DELIMITER_CHECKER, |c| c.name());

        let problem = match first_delimiter_line(content) {
            Some(line) => Some(SyntaxError {
                message: format!("unresolved conflict delimiter at line {line}"),
                line: Some(line),
                column: Some(1),
            }),
            None => checker.as_ref().and_then(|c| c.check(content)),
        };
        debug!(path, %language, checker = checker_name, valid = problem.is_none(), "validated");

        let (status, message, line, column) = match problem {
            None => (ValidationStatus::Valid, None, None, None),
            Some(err) => (ValidationStatus::Error, Some(err.message), err.line, err.column),
        };
        ValidationResult {
            path: path.to_string(),
            language,
            checker: checker_name.to_string(),
            status,
            message,
            line,
            column,
        }
    }
}

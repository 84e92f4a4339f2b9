//! Data-format syntax checks backed by their serde parsers.

use serde::Deserialize;

use super::{SyntaxChecker, SyntaxError};

/// JSON via `serde_json`.
pub struct JsonChecker;

impl SyntaxChecker for JsonChecker {
    fn name(&self) -> &'static str {
        "serde_json"
    }

    fn check(&self, content: &str) -> Option<SyntaxError> {
        let err = serde_json::from_str::<serde_json::Value>(content).err()?;
        Some(SyntaxError {
            message: err.to_string(),
            line: Some(err.line()),
            column: Some(err.column()),
        })
    }
}

/// YAML via `serde_yaml`, every document in the stream.
pub struct YamlChecker;

impl SyntaxChecker for YamlChecker {
    fn name(&self) -> &'static str {
        "serde_yaml"
    }

    fn check(&self, content: &str) -> Option<SyntaxError> {
        for document in serde_yaml::Deserializer::from_str(content) {
            if let Err(err) = serde_yaml::Value::deserialize(document) {
                let location = err.location();
                return Some(SyntaxError {
                    message: err.to_string(),
                    line: location.as_ref().map(|l| l.line()),
                    column: location.as_ref().map(|l| l.column()),
                });
            }
        }
        None
    }
}

/// TOML via `toml`.
pub struct TomlChecker;

impl SyntaxChecker for TomlChecker {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn check(&self, content: &str) -> Option<SyntaxError> {
        let err = toml::from_str::<toml::Table>(content).err()?;
        let (line, column) = match err.span() {
            Some(span) => {
                let (line, column) = line_column(content, span.start);
                (Some(line), Some(column))
            }
            None => (None, None),
        };
        Some(SyntaxError {
            message: err.message().to_string(),
            line,
            column,
        })
    }
}

/// 1-based line and column of a byte offset.
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |tail| tail.chars().count())
        + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json() {
        assert!(JsonChecker.check("{\"a\": [1, 2]}").is_none());
        let err = JsonChecker.check("{\n  \"a\": 1,\n}").unwrap();
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn yaml() {
        assert!(YamlChecker.check("a: 1\nb: [x, y]\n---\nc: 2\n").is_none());
        let err = YamlChecker.check("a: [1, 2\nb: 3\n").unwrap();
        assert!(err.line.is_some());
    }

    #[test]
    fn toml() {
        assert!(TomlChecker.check("[package]\nname = \"x\"\n").is_none());
        let err = TomlChecker.check("[package]\nname = \"x\"\nname = \"y\"\n").unwrap();
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn offsets_to_positions() {
        assert_eq!(line_column("ab\ncd", 0), (1, 1));
        assert_eq!(line_column("ab\ncd", 4), (2, 2));
        assert_eq!(line_column("ab", 99), (1, 3));
    }
}

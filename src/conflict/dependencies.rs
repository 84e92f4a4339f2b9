//! Lightweight import and declaration scan.

use std::path::Path;

use crate::data::{DependencyScan, SideDependencies};
use crate::language::Language;

/// Scans one side's content.
///
/// Lines inside leftover conflict regions are scanned like any others, and
/// each list is de-duplicated in first-seen order and capped at `limit`.
pub fn scan_side(language: Language, content: &str, limit: usize) -> SideDependencies {
    let mut imports: Vec<String> = Vec::new();
    let mut declarations: Vec<String> = Vec::new();

    for line in content.lines() {
        if language.is_import_line(line) {
            let import = line.trim().to_string();
            if imports.len() < limit && !imports.contains(&import) {
                imports.push(import);
            }
        } else if let Some(name) = language.top_level_declaration(line) {
            if declarations.len() < limit && !declarations.contains(&name) {
                declarations.push(name);
            }
        }
    }

    SideDependencies {
        imports,
        declarations,
    }
}

/// Scans ours and theirs for a path.
///
/// Unknown extensions produce empty lists; data formats have no imports.
pub fn scan(path: &Path, ours: Option<&str>, theirs: Option<&str>, limit: usize) -> DependencyScan {
    let language = Language::from_path(path);
    let side = |content: Option<&str>| match (language, content) {
        (Language::Unknown, _) | (_, None) => SideDependencies::default(),
        (_, Some(text)) => scan_side(language, text, limit),
    };

    DependencyScan {
        language,
        ours: side(ours),
        theirs: side(theirs),
    }
}

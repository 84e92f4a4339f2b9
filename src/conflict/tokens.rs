//! Tokenization and distance helpers shared by alignment and classification.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::language::Language;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"[A-Za-z_][A-Za-z0-9_]*|\d+(?:\.\d+)?|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|==|!=|<=|>=|&&|\|\||->|=>|::|\S"#,
    )
    .unwrap()
});

/// A lexical token with its kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Token {
    /// Identifier that is not a keyword.
    Ident(String),
    /// Language keyword.
    Keyword(String),
    /// Numeric literal.
    Number(String),
    /// String literal, quotes included.
    Str(String),
    /// Operator or punctuation.
    Punct(String),
}

impl Token {
    /// Token text.
    pub fn text(&self) -> &str {
        match self {
            Self::Ident(s) | Self::Keyword(s) | Self::Number(s) | Self::Str(s) | Self::Punct(s) => s,
        }
    }
}

/// Splits source text into tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    TOKEN
        .find_iter(text)
        .map(|m| {
            let s = m.as_str();
            let first = s.chars().next().unwrap_or(' ');
            if first.is_ascii_alphabetic() || first == '_' {
                if Language::is_keyword(&s.to_ascii_lowercase()) {
                    Token::Keyword(s.to_string())
                } else {
                    Token::Ident(s.to_string())
                }
            } else if first.is_ascii_digit() {
                Token::Number(s.to_string())
            } else if first == '"' || first == '\'' {
                Token::Str(s.to_string())
            } else {
                Token::Punct(s.to_string())
            }
        })
        .collect()
}

/// Distinct token texts of a block.
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .map(|t| t.text().to_string())
        .collect()
}

/// Collapses every whitespace run to a single space and drops blank lines.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lines with surrounding whitespace removed, blank lines dropped.
pub fn significant_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

/// Levenshtein distance over arbitrary comparable items.
pub fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, item_a) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, item_b) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(item_a != item_b);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Character edit distance divided by the longer length, in `[0, 1]`.
pub fn edit_fraction(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    edit_distance(&a, &b) as f64 / longest as f64
}

/// Jaccard similarity of two sets; two empty sets are identical.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Pairs of equal items in a longest common subsequence, as `(index_a, index_b)`.
///
/// Equal items are matched at the earliest offset in `b`; on ties the walk
/// skips items of `a` first. Returns `None` when the DP table would exceed
/// `max_cells`.
pub fn lcs_pairs<T: PartialEq>(a: &[T], b: &[T], max_cells: usize) -> Option<Vec<(usize, usize)>> {
    // A common prefix never needs the table.
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let mid_a = &a[prefix..];
    let mid_b = &b[prefix..];
    let cells = (mid_a.len() + 1).saturating_mul(mid_b.len() + 1);
    if cells > max_cells {
        return None;
    }

    let width = mid_b.len() + 1;
    let mut table = vec![0u32; cells];
    for i in (0..mid_a.len()).rev() {
        for j in (0..mid_b.len()).rev() {
            table[i * width + j] = if mid_a[i] == mid_b[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut pairs: Vec<(usize, usize)> = (0..prefix).map(|i| (i, i)).collect();
    let (mut i, mut j) = (0, 0);
    while i < mid_a.len() && j < mid_b.len() {
        if mid_a[i] == mid_b[j] {
            pairs.push((prefix + i, prefix + j));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    Some(pairs)
}

/// Structural shape of a block of code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shape {
    /// Non-blank, non-comment lines.
    pub statements: usize,
    /// Deepest nesting by braces or indentation.
    pub depth: usize,
}

impl Shape {
    /// Measures a block.
    pub fn of(text: &str) -> Self {
        let mut statements = 0;
        let mut brace_depth: usize = 0;
        let mut max_brace = 0;
        let mut indents = BTreeSet::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || is_comment(trimmed) {
                continue;
            }
            statements += 1;
            indents.insert(indent_width(line));
            for c in trimmed.chars() {
                match c {
                    '{' => {
                        brace_depth += 1;
                        max_brace = max_brace.max(brace_depth);
                    }
                    '}' => brace_depth = brace_depth.saturating_sub(1),
                    _ => {}
                }
            }
        }

        // Distinct indentation levels approximate nesting for brace-less code.
        let indent_depth = indents.len().saturating_sub(1);
        Self {
            statements,
            depth: max_brace.max(indent_depth),
        }
    }
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//")
        || (trimmed.starts_with('#') && !trimmed.starts_with("#include"))
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with("--")
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_kinds() {
        let tokens = tokenize("if total >= 100: return \"done\"");
        assert_eq!(tokens[0], Token::Keyword("if".into()));
        assert_eq!(tokens[1], Token::Ident("total".into()));
        assert_eq!(tokens[2], Token::Punct(">=".into()));
        assert_eq!(tokens[3], Token::Number("100".into()));
        assert_eq!(tokens[4], Token::Punct(":".into()));
        assert_eq!(tokens[6], Token::Str("\"done\"".into()));
    }

    #[test]
    fn whitespace_normalization() {
        assert_eq!(normalize_whitespace("  a  b\t\n\n c  \n"), "a b c");
    }

    #[test]
    fn levenshtein() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        assert_eq!(edit_distance(&a, &b), 3);
        assert_eq!(edit_distance::<char>(&[], &['a']), 1);
        assert!((edit_fraction("", "") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_similarity() {
        let a: BTreeSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["y", "z"].iter().map(|s| s.to_string()).collect();
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
        assert!((jaccard(&BTreeSet::new(), &BTreeSet::new()) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lcs_pairs_basic() {
        let a = ["a", "b", "c", "d"];
        let b = ["a", "x", "c", "d"];
        let pairs = lcs_pairs(&a, &b, 1000).unwrap();
        assert_eq!(pairs, vec![(0, 0), (2, 2), (3, 3)]);
    }

    #[test]
    fn lcs_pairs_prefers_earliest_offset() {
        let a = ["x"];
        let b = ["y", "x", "x"];
        let pairs = lcs_pairs(&a, &b, 1000).unwrap();
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn lcs_pairs_respects_cell_budget() {
        let a = ["a", "b", "c"];
        let b = ["d", "e", "f"];
        assert!(lcs_pairs(&a, &b, 4).is_none());
        assert_eq!(lcs_pairs(&a, &b, 16), Some(vec![]));
    }

    #[test]
    fn shape_counts_depth() {
        let flat = Shape::of("a = 1\nb = 2\n");
        assert_eq!(flat, Shape { statements: 2, depth: 0 });

        let nested = Shape::of("if x {\n    if y {\n        z();\n    }\n}\n");
        assert_eq!(nested.statements, 5);
        assert_eq!(nested.depth, 2);

        let python = Shape::of("for i in x:\n    if i:\n        go(i)\n# note\n");
        assert_eq!(python.statements, 3);
        assert_eq!(python.depth, 2);
    }
}

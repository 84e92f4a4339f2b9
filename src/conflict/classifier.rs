//! Conflict classification.
//!
//! Each region is tested against an ordered list of heuristics and the first
//! match wins: IMPORT, WHITESPACE, RENAME, SIGNATURE, REFACTOR, then LOGIC.
//! Every heuristic also decides whether its type-specific non-contradiction
//! check passes, which together with the difficulty gates auto-resolution.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::tokens::{
    edit_fraction, jaccard, lcs_pairs, normalize_whitespace, significant_lines, token_set,
    tokenize, Shape, Token,
};
use crate::config::ClassifierPolicy;
use crate::data::{
    ConflictCategory, ConflictMarker, ConflictType, Difficulty, MarkerCategory, ThreeWaySnapshot,
};
use crate::language::Language;

/// Line alignment inside a single region is small; past this it is skipped.
const REGION_ALIGN_CELLS: usize = 1_000_000;

static DECLARATION_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(def|fn|function|func)\b").unwrap());

static NOT_A_DECLARATION: &[&str] = &[
    "await", "case", "delete", "else", "goto", "new", "return", "throw", "yield",
];

/// What a heuristic concluded about one region.
struct Verdict {
    conflict_type: ConflictType,
    escalate: bool,
    consistent: bool,
    reason: String,
}

/// One region split into trimmed, non-blank lines.
struct Region<'a> {
    base_text: Option<&'a str>,
    ours_text: &'a str,
    theirs_text: &'a str,
    base: Option<Vec<&'a str>>,
    ours: Vec<&'a str>,
    theirs: Vec<&'a str>,
}

impl<'a> Region<'a> {
    fn new(marker: &'a ConflictMarker) -> Self {
        Self {
            base_text: marker.base_text.as_deref(),
            ours_text: &marker.ours_text,
            theirs_text: &marker.theirs_text,
            base: marker.base_text.as_deref().map(significant_lines),
            ours: significant_lines(&marker.ours_text),
            theirs: significant_lines(&marker.theirs_text),
        }
    }
}

/// Lines a side added relative to the base, and base lines it dropped.
struct SideChange<'a> {
    added: Vec<&'a str>,
    removed: Vec<&'a str>,
}

fn side_change<'a>(side: &[&'a str], base: Option<&[&'a str]>) -> SideChange<'a> {
    let Some(base) = base else {
        return SideChange {
            added: side.to_vec(),
            removed: Vec::new(),
        };
    };
    let Some(pairs) = lcs_pairs(side, base, REGION_ALIGN_CELLS) else {
        return SideChange {
            added: side.to_vec(),
            removed: base.to_vec(),
        };
    };
    let kept_side: BTreeSet<usize> = pairs.iter().map(|(s, _)| *s).collect();
    let kept_base: BTreeSet<usize> = pairs.iter().map(|(_, b)| *b).collect();
    SideChange {
        added: unpaired(side, &kept_side),
        removed: unpaired(base, &kept_base),
    }
}

fn unpaired<'a>(lines: &[&'a str], kept: &BTreeSet<usize>) -> Vec<&'a str> {
    lines
        .iter()
        .enumerate()
        .filter(|(i, _)| !kept.contains(i))
        .map(|(_, line)| *line)
        .collect()
}

/// Lines of ours and theirs that the two sides do not share.
fn unmatched<'a>(ours: &[&'a str], theirs: &[&'a str]) -> (Vec<&'a str>, Vec<&'a str>) {
    match lcs_pairs(ours, theirs, REGION_ALIGN_CELLS) {
        Some(pairs) => {
            let kept_ours: BTreeSet<usize> = pairs.iter().map(|(o, _)| *o).collect();
            let kept_theirs: BTreeSet<usize> = pairs.iter().map(|(_, t)| *t).collect();
            (unpaired(ours, &kept_ours), unpaired(theirs, &kept_theirs))
        }
        None => (ours.to_vec(), theirs.to_vec()),
    }
}

/// Classifies regions under one policy and language.
pub struct Classifier<'a> {
    policy: &'a ClassifierPolicy,
    language: Language,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier for files of `language`.
    pub fn new(policy: &'a ClassifierPolicy, language: Language) -> Self {
        Self { policy, language }
    }

    /// Classifies one region.
    pub fn classify_marker(&self, marker: &ConflictMarker) -> MarkerCategory {
        let region = Region::new(marker);
        let verdict = self.detect(&region);

        let difficulty = if verdict.escalate {
            Difficulty::Escalate
        } else {
            self.policy.difficulty_for(verdict.conflict_type)
        };
        debug!(
            start = marker.start_line,
            kind = %verdict.conflict_type,
            ?difficulty,
            "classified region"
        );

        MarkerCategory {
            start_line: marker.start_line,
            end_line: marker.end_line,
            conflict_type: verdict.conflict_type,
            difficulty,
            auto_resolvable: difficulty.allows_auto_resolution() && verdict.consistent,
            reason: verdict.reason,
        }
    }

    fn detect(&self, region: &Region<'_>) -> Verdict {
        let ours = side_change(&region.ours, region.base.as_deref());
        let theirs = side_change(&region.theirs, region.base.as_deref());

        if let Some(verdict) = self.import_verdict(region, &ours, &theirs) {
            return verdict;
        }
        if normalize_whitespace(region.ours_text) == normalize_whitespace(region.theirs_text) {
            return Verdict {
                conflict_type: ConflictType::Whitespace,
                escalate: false,
                consistent: true,
                reason: "sides differ only in whitespace".to_string(),
            };
        }

        let (ours_only, theirs_only) = unmatched(&region.ours, &region.theirs);
        if let Some(verdict) = self.rename_verdict(region, &ours_only, &theirs_only, &ours, &theirs) {
            return verdict;
        }
        if let Some(verdict) = self.signature_verdict(region, &ours_only, &theirs_only) {
            return verdict;
        }
        if let Some(verdict) = self.refactor_verdict(region) {
            return verdict;
        }
        self.logic_verdict(region)
    }

    fn import_verdict(
        &self,
        region: &Region<'_>,
        ours: &SideChange<'_>,
        theirs: &SideChange<'_>,
    ) -> Option<Verdict> {
        let mut changed = ours
            .added
            .iter()
            .chain(&ours.removed)
            .chain(&theirs.added)
            .chain(&theirs.removed)
            .peekable();
        changed.peek()?;
        if !changed.all(|line| self.language.is_import_line(line)) {
            return None;
        }

        // An import one side dropped must not survive on the other side.
        let dropped_but_kept = ours
            .removed
            .iter()
            .find(|line| region.theirs.contains(*line))
            .or_else(|| theirs.removed.iter().find(|line| region.ours.contains(*line)));

        Some(Verdict {
            conflict_type: ConflictType::Import,
            escalate: false,
            consistent: dropped_but_kept.is_none(),
            reason: match dropped_but_kept {
                None => "only import statements changed".to_string(),
                Some(line) => format!("only imports changed, but '{line}' is removed on one side and kept on the other"),
            },
        })
    }

    fn rename_verdict(
        &self,
        region: &Region<'_>,
        ours_only: &[&str],
        theirs_only: &[&str],
        ours: &SideChange<'_>,
        theirs: &SideChange<'_>,
    ) -> Option<Verdict> {
        let mut used = vec![false; theirs_only.len()];
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        let mut rename: Option<(String, String)> = None;

        for o in ours_only {
            for (k, t) in theirs_only.iter().enumerate() {
                if used[k] {
                    continue;
                }
                if let Some(pair) = identifier_difference(o, t) {
                    if rename.as_ref().is_some_and(|existing| *existing != pair) {
                        return None;
                    }
                    rename = Some(pair);
                    used[k] = true;
                    pairs.push((*o, *t));
                    break;
                }
            }
        }
        let (ours_ident, theirs_ident) = rename?;

        // Orientation: the identifier still present in the base is the old one.
        let base_tokens = region.base_text.map(token_set).unwrap_or_default();
        let ours_renamed = base_tokens.contains(&theirs_ident) && !base_tokens.contains(&ours_ident);
        let theirs_renamed = base_tokens.contains(&ours_ident) && !base_tokens.contains(&theirs_ident);

        let (renamer_text, keeper_text, old, new) = if theirs_renamed {
            (region.theirs_text, region.ours_text, &ours_ident, &theirs_ident)
        } else {
            (region.ours_text, region.theirs_text, &theirs_ident, &ours_ident)
        };
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(new))).ok()?;
        let reverted = pattern.replace_all(renamer_text, old.as_str());
        let residue = edit_fraction(&normalize_whitespace(&reverted), &normalize_whitespace(keeper_text));
        if residue > self.policy.rename_max_edit_fraction {
            return None;
        }

        let consistent = if ours_renamed || theirs_renamed {
            let paired_ours: BTreeSet<&str> = pairs.iter().map(|(o, _)| *o).collect();
            let paired_theirs: BTreeSet<&str> = pairs.iter().map(|(_, t)| *t).collect();
            let (renamer_lines, renamer_paired, keeper_added, keeper_paired) = if ours_renamed {
                (&region.ours, &paired_ours, &theirs.added, &paired_theirs)
            } else {
                (&region.theirs, &paired_theirs, &ours.added, &paired_ours)
            };
            let uses_old = |line: &&str| token_set(line).contains(old.as_str());
            let renamer_residual = renamer_lines
                .iter()
                .filter(|l| !renamer_paired.contains(*l))
                .any(|l| uses_old(l));
            let keeper_residual = keeper_added
                .iter()
                .filter(|l| !keeper_paired.contains(*l))
                .any(|l| uses_old(l));
            !renamer_residual && !keeper_residual
        } else {
            false
        };

        let reason = if ours_renamed || theirs_renamed {
            let side = if ours_renamed { "ours" } else { "theirs" };
            format!("{side} renamed '{old}' to '{new}'")
        } else {
            format!("sides use different names '{ours_ident}' and '{theirs_ident}'")
        };

        Some(Verdict {
            conflict_type: ConflictType::Rename,
            escalate: false,
            consistent,
            reason: if consistent || !(ours_renamed || theirs_renamed) {
                reason
            } else {
                format!("{reason}; '{old}' is still used elsewhere")
            },
        })
    }

    fn signature_verdict(
        &self,
        region: &Region<'_>,
        ours_only: &[&str],
        theirs_only: &[&str],
    ) -> Option<Verdict> {
        if ours_only.is_empty() || ours_only.len() != theirs_only.len() {
            return None;
        }

        let base_lines = region.base.as_deref().unwrap_or(&[]);
        let mut names = Vec::new();
        let mut defaults_everywhere = true;

        for (o, t) in ours_only.iter().zip(theirs_only) {
            let ours_sig = signature_parts(o, self.language)?;
            let theirs_sig = signature_parts(t, self.language)?;
            if ours_sig.head != theirs_sig.head || ours_sig.tail != theirs_sig.tail {
                return None;
            }

            let base_params = base_lines
                .iter()
                .filter_map(|line| signature_parts(line, self.language))
                .find(|sig| sig.head == ours_sig.head)
                .map(|sig| sig.params);

            let added_ok = |side: &[String], other: &[String]| {
                let reference = base_params.as_deref().unwrap_or(other);
                side.iter()
                    .filter(|p| !reference.contains(p))
                    .all(|p| p.contains('='))
            };
            defaults_everywhere &= added_ok(&ours_sig.params, &theirs_sig.params)
                && added_ok(&theirs_sig.params, &ours_sig.params);
            names.push(ours_sig.head);
        }

        let consistent = defaults_everywhere && self.language.supports_default_params();
        let reason = if consistent {
            format!("parameter lists differ in {}; added parameters have defaults", names.join(", "))
        } else {
            format!("parameter lists differ in {}", names.join(", "))
        };
        Some(Verdict {
            conflict_type: ConflictType::Signature,
            escalate: false,
            consistent,
            reason,
        })
    }

    fn refactor_verdict(&self, region: &Region<'_>) -> Option<Verdict> {
        let ours = Shape::of(region.ours_text);
        let theirs = Shape::of(region.theirs_text);
        let statements = ours.statements.abs_diff(theirs.statements);
        let depth = ours.depth.abs_diff(theirs.depth);

        if statements < self.policy.refactor_statement_delta && depth < self.policy.refactor_depth_delta {
            return None;
        }
        if let Some(base) = region.base_text.map(Shape::of) {
            if base == ours && base == theirs {
                return None;
            }
        }

        Some(Verdict {
            conflict_type: ConflictType::Refactor,
            escalate: false,
            consistent: false,
            reason: format!(
                "structure diverges: {} vs {} statements, depth {} vs {}",
                ours.statements, theirs.statements, ours.depth, theirs.depth
            ),
        })
    }

    fn logic_verdict(&self, region: &Region<'_>) -> Verdict {
        let (ours_new, theirs_new) = match region.base_text {
            Some(base) => {
                let base = token_set(base);
                (
                    token_set(region.ours_text).difference(&base).cloned().collect(),
                    token_set(region.theirs_text).difference(&base).cloned().collect(),
                )
            }
            None => (token_set(region.ours_text), token_set(region.theirs_text)),
        };
        let similarity = jaccard(&ours_new, &theirs_new);
        let escalate = similarity < self.policy.escalate_similarity_floor;

        Verdict {
            conflict_type: ConflictType::Logic,
            escalate,
            consistent: false,
            reason: if escalate {
                format!(
                    "changes share no intent: token overlap {similarity:.2} below {:.2}",
                    self.policy.escalate_similarity_floor
                )
            } else {
                format!("diverging logic, token overlap {similarity:.2}")
            },
        }
    }
}

/// The identifier pair by which two lines differ, if that is their only difference.
///
/// Every differing token position must be an identifier on both sides, all
/// with the same pair.
fn identifier_difference(a: &str, b: &str) -> Option<(String, String)> {
    let ta = tokenize(a);
    let tb = tokenize(b);
    if ta.len() != tb.len() {
        return None;
    }
    let mut pair: Option<(String, String)> = None;
    for (x, y) in ta.iter().zip(&tb) {
        if x == y {
            continue;
        }
        let (Token::Ident(x), Token::Ident(y)) = (x, y) else {
            return None;
        };
        if let Some((px, py)) = &pair {
            if px != x || py != y {
                return None;
            }
            continue;
        }
        pair = Some((x.clone(), y.clone()));
    }
    pair
}

/// A declaration split around its parameter list.
#[derive(Debug, PartialEq)]
struct Signature {
    head: String,
    params: Vec<String>,
    tail: String,
}

fn signature_parts(line: &str, language: Language) -> Option<Signature> {
    let line = line.trim();
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if close < open {
        return None;
    }
    let head = line[..open].trim_end();
    if !head.ends_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$') {
        return None;
    }

    let words: Vec<&str> = head.split_whitespace().collect();
    let declares = DECLARATION_KEYWORD.is_match(head)
        || (matches!(language, Language::Java | Language::C | Language::Cpp)
            && words.len() >= 2
            && !NOT_A_DECLARATION.contains(&words[0]));
    if !declares {
        return None;
    }

    Some(Signature {
        head: normalize_whitespace(head),
        params: split_params(&line[open + 1..close]),
        tail: normalize_whitespace(&line[close + 1..]),
    })
}

/// Splits a parameter list on top-level commas.
fn split_params(list: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth -= 1,
            ',' if depth == 0 => {
                params.push(normalize_whitespace(&current));
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    let last = normalize_whitespace(&current);
    if !last.is_empty() {
        params.push(last);
    }
    params.retain(|p| !p.is_empty());
    params
}

/// Classifies every region of a snapshot and aggregates a file verdict.
pub fn categorize(snapshot: &ThreeWaySnapshot, policy: &ClassifierPolicy) -> ConflictCategory {
    let language = Language::from_path(Path::new(&snapshot.filepath));
    let classifier = Classifier::new(policy, language);
    let markers: Vec<MarkerCategory> = snapshot
        .markers
        .iter()
        .map(|marker| classifier.classify_marker(marker))
        .collect();

    if markers.is_empty() {
        let conflict_type = if snapshot.ours.is_deleted() || snapshot.theirs.is_deleted() {
            ConflictType::ModifyDelete
        } else {
            ConflictType::Unknown
        };
        return ConflictCategory {
            filepath: snapshot.filepath.clone(),
            conflict_type,
            difficulty: policy.difficulty_for(conflict_type),
            auto_resolvable: false,
            all_types: Vec::new(),
            num_conflicts: 0,
            markers,
        };
    }

    let all_types: Vec<ConflictType> = markers.iter().map(|m| m.conflict_type).collect();
    let conflict_type = all_types
        .iter()
        .copied()
        .min_by_key(|ty| policy.severity_rank(*ty))
        .unwrap_or(ConflictType::Unknown);
    let difficulty = markers
        .iter()
        .map(|m| m.difficulty)
        .max()
        .unwrap_or(Difficulty::Medium);

    ConflictCategory {
        filepath: snapshot.filepath.clone(),
        conflict_type,
        difficulty,
        auto_resolvable: markers.iter().all(|m| m.auto_resolvable),
        all_types,
        num_conflicts: markers.len(),
        markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{StageContent, StageState, StageStates};
    use proptest::prelude::*;

    fn marker(base: Option<&str>, ours: &str, theirs: &str) -> ConflictMarker {
        ConflictMarker {
            start_line: 1,
            end_line: 5,
            ours_text: ours.to_string(),
            theirs_text: theirs.to_string(),
            base_text: base.map(str::to_string),
            ours_label: Some("ours".to_string()),
            theirs_label: Some("theirs".to_string()),
        }
    }

    fn classify(language: Language, m: &ConflictMarker) -> MarkerCategory {
        let policy = ClassifierPolicy::default();
        Classifier::new(&policy, language).classify_marker(m)
    }

    fn snapshot(path: &str, markers: Vec<ConflictMarker>) -> ThreeWaySnapshot {
        ThreeWaySnapshot {
            filepath: path.to_string(),
            base: StageContent::Text(String::new()),
            ours: StageContent::Text(String::new()),
            theirs: StageContent::Text(String::new()),
            stages: StageStates {
                base: StageState::Present,
                ours: StageState::Present,
                theirs: StageState::Present,
            },
            merge_base: None,
            merge_base_alternates: Vec::new(),
            ours_commits: Vec::new(),
            theirs_commits: Vec::new(),
            markers,
            dependencies: None,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn scenario_a_import() {
        let verdict = classify(Language::Python, &marker(Some(""), "import sys\n", "import json\n"));
        assert_eq!(verdict.conflict_type, ConflictType::Import);
        assert_eq!(verdict.difficulty, Difficulty::Easy);
        assert!(verdict.auto_resolvable);
    }

    #[test]
    fn import_removed_and_kept_is_not_auto() {
        let verdict = classify(
            Language::Python,
            &marker(Some("import os\n"), "import sys\n", "import os\nimport json\n"),
        );
        assert_eq!(verdict.conflict_type, ConflictType::Import);
        assert!(!verdict.auto_resolvable);
    }

    #[test]
    fn scenario_b_rename() {
        let base = "def calculate_total(items):\n    return sum(items)\n";
        let ours = "def compute_total(items):\n    return sum(items)\n";
        let theirs = "def calculate_total(items):\n    validate(items)\n    return sum(items)\n";
        let verdict = classify(Language::Python, &marker(Some(base), ours, theirs));
        assert_eq!(verdict.conflict_type, ConflictType::Rename);
        assert_eq!(verdict.difficulty, Difficulty::Medium);
        assert!(verdict.auto_resolvable);
        assert_eq!(verdict.reason, "ours renamed 'calculate_total' to 'compute_total'");
    }

    #[test]
    fn rename_with_residual_use_is_not_auto() {
        let base = "def calculate_total(items):\n    return sum(items)\n";
        let ours = "def compute_total(items):\n    return sum(items)\n";
        let theirs = "def calculate_total(items):\n    return sum(items)\nprint(calculate_total([1]))\n";
        let verdict = classify(Language::Python, &marker(Some(base), ours, theirs));
        assert_eq!(verdict.conflict_type, ConflictType::Rename);
        assert!(!verdict.auto_resolvable);
    }

    #[test]
    fn scenario_c_logic_escalates() {
        let base = "    if total > 100:\n";
        let ours = "    if total >= 150:\n";
        let theirs = "    if total < 50:\n";
        let verdict = classify(Language::Python, &marker(Some(base), ours, theirs));
        assert_eq!(verdict.conflict_type, ConflictType::Logic);
        assert_eq!(verdict.difficulty, Difficulty::Escalate);
        assert!(!verdict.auto_resolvable);
    }

    #[test]
    fn overlapping_logic_stays_hard() {
        let base = "    return price\n";
        let ours = "    return price * rate + fee\n";
        let theirs = "    return price * rate - discount\n";
        let verdict = classify(Language::Python, &marker(Some(base), ours, theirs));
        assert_eq!(verdict.conflict_type, ConflictType::Logic);
        assert_eq!(verdict.difficulty, Difficulty::Hard);
    }

    #[test]
    fn scenario_d_whitespace() {
        let verdict = classify(
            Language::Python,
            &marker(Some("x = 1\n"), "x = compute()   \n", "x = compute()\n"),
        );
        assert_eq!(verdict.conflict_type, ConflictType::Whitespace);
        assert_eq!(verdict.difficulty, Difficulty::Easy);
        assert!(verdict.auto_resolvable);
    }

    #[test]
    fn signature_with_defaults() {
        let base = "def fetch(url):\n";
        let ours = "def fetch(url, timeout=30):\n";
        let theirs = "def fetch(url, retries=3):\n";
        let verdict = classify(Language::Python, &marker(Some(base), ours, theirs));
        assert_eq!(verdict.conflict_type, ConflictType::Signature);
        assert_eq!(verdict.difficulty, Difficulty::Medium);
        assert!(verdict.auto_resolvable);
    }

    #[test]
    fn signature_without_defaults_is_not_auto() {
        let base = "fn fetch(url: &str) {\n";
        let ours = "fn fetch(url: &str, timeout: u64) {\n";
        let theirs = "fn fetch(url: &str, retries: u8) {\n";
        let verdict = classify(Language::Rust, &marker(Some(base), ours, theirs));
        assert_eq!(verdict.conflict_type, ConflictType::Signature);
        assert!(!verdict.auto_resolvable);
    }

    #[test]
    fn refactor_on_shape_change() {
        let base = "total = sum(items)\n";
        let ours = "total = sum(items) * 2\n";
        let theirs = "total = 0\nfor item in items:\n    if item.active:\n        total += item.value\n";
        let verdict = classify(Language::Python, &marker(Some(base), ours, theirs));
        assert_eq!(verdict.conflict_type, ConflictType::Refactor);
        assert_eq!(verdict.difficulty, Difficulty::MediumHard);
        assert!(!verdict.auto_resolvable);
    }

    #[test]
    fn signature_parts_split() {
        let sig = signature_parts("def f(a, b=(1, 2)):", Language::Python).unwrap();
        assert_eq!(sig.head, "def f");
        assert_eq!(sig.params, vec!["a", "b=(1, 2)"]);
        assert_eq!(sig.tail, ":");
        assert!(signature_parts("return f(a)", Language::Java).is_none());
        assert!(signature_parts("x = f(a)", Language::Python).is_none());
    }

    #[test]
    fn file_level_aggregate() {
        let snap = snapshot(
            "app.py",
            vec![
                marker(Some(""), "import sys\n", "import json\n"),
                marker(Some("    if total > 100:\n"), "    if total >= 150:\n", "    if total < 50:\n"),
            ],
        );
        let category = categorize(&snap, &ClassifierPolicy::default());
        assert_eq!(category.conflict_type, ConflictType::Logic);
        assert_eq!(category.difficulty, Difficulty::Escalate);
        assert!(!category.auto_resolvable);
        assert_eq!(category.all_types, vec![ConflictType::Import, ConflictType::Logic]);
        assert_eq!(category.num_conflicts, 2);
        insta::assert_snapshot!(
            serde_json::to_string(&category.markers[0]).unwrap(),
            @r#"{"start_line":1,"end_line":5,"type":"IMPORT","difficulty":"EASY","auto_resolvable":true,"reason":"only import statements changed"}"#
        );
    }

    #[test]
    fn severity_order_is_configurable() {
        let mut policy = ClassifierPolicy::default();
        policy.severity = vec![
            ConflictType::Import,
            ConflictType::Logic,
            ConflictType::Refactor,
            ConflictType::Signature,
            ConflictType::Rename,
            ConflictType::Whitespace,
        ];
        let snap = snapshot(
            "app.py",
            vec![
                marker(Some(""), "import sys\n", "import json\n"),
                marker(Some("    if total > 100:\n"), "    if total >= 150:\n", "    if total < 50:\n"),
            ],
        );
        assert_eq!(categorize(&snap, &policy).conflict_type, ConflictType::Import);
    }

    #[test]
    fn no_markers_with_deleted_side() {
        let mut snap = snapshot("gone.py", Vec::new());
        snap.theirs = StageContent::Deleted;
        let category = categorize(&snap, &ClassifierPolicy::default());
        assert_eq!(category.conflict_type, ConflictType::ModifyDelete);
        assert_eq!(category.difficulty, Difficulty::Hard);
        assert!(!category.auto_resolvable);
        assert_eq!(category.num_conflicts, 0);

        let plain = categorize(&snapshot("data.bin", Vec::new()), &ClassifierPolicy::default());
        assert_eq!(plain.conflict_type, ConflictType::Unknown);
    }

    proptest! {
        #[test]
        fn categorize_is_deterministic(
            base in proptest::option::of("[a-z =+<>0-9\n]{0,40}"),
            ours in "[a-z =+<>0-9\n]{0,40}",
            theirs in "[a-z =+<>0-9\n]{0,40}",
        ) {
            let snap = snapshot("f.py", vec![marker(base.as_deref(), &ours, &theirs)]);
            let policy = ClassifierPolicy::default();
            let first = categorize(&snap, &policy);
            let second = categorize(&snap, &policy);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.num_conflicts, 1);
            prop_assert!(first.auto_resolvable == first.markers[0].auto_resolvable);
        }
    }
}

//! Inference of the base span behind each conflict region.
//!
//! The context lines around the regions are aligned against the base with a
//! longest common subsequence. A region's base span is the stretch of base
//! lines between the nearest aligned context line before it and the nearest
//! aligned context line after it. When context lines next to the region did
//! not align (both sides changed them identically), the window is wider than
//! the true span; candidate sub-spans are then ranked by line edit distance
//! to either side, then by earliest offset. That search shares the cell
//! budget of the alignment; over budget, the whole window is the span.

use std::ops::Range;

use tracing::debug;

use super::markers::ScannedContent;
use super::tokens::{edit_fraction, lcs_pairs};

/// Alignment limits.
#[derive(Debug, Clone, Copy)]
pub struct AlignLimits {
    /// Largest LCS table, in cells, before alignment is abandoned.
    pub max_cells: usize,
    /// Largest anchor window searched for a tighter span.
    pub refine_window: usize,
}

/// Infers the base line range for every region of `scanned`.
///
/// Returns `None` for all regions when the alignment table would be too
/// large; the caller reports those base spans as absent.
pub fn infer_base_spans(
    scanned: &ScannedContent<'_>,
    base_lines: &[&str],
    limits: AlignLimits,
) -> Vec<Option<Range<usize>>> {
    let Some(pairs) = lcs_pairs(&scanned.context, base_lines, limits.max_cells) else {
        debug!(
            context = scanned.context.len(),
            base = base_lines.len(),
            "alignment table over budget"
        );
        return vec![None; scanned.regions.len()];
    };

    let mut matched: Vec<Option<usize>> = vec![None; scanned.context.len()];
    for (ctx, base) in pairs {
        matched[ctx] = Some(base);
    }

    scanned
        .regions
        .iter()
        .map(|region| {
            let before = region.context_before;
            let (lo, lo_adjacent) = match (0..before).rev().find_map(|k| matched[k].map(|b| (k, b))) {
                Some((k, b)) => (b + 1, k + 1 == before),
                None => (0, before == 0),
            };
            let (hi, hi_adjacent) = match (before..matched.len()).find_map(|k| matched[k].map(|b| (k, b))) {
                Some((k, b)) => (b, k == before),
                None => (base_lines.len(), before == matched.len()),
            };
            if lo > hi {
                return None;
            }
            if (lo_adjacent && hi_adjacent) || hi - lo > limits.refine_window {
                return Some(lo..hi);
            }
            Some(refine(
                &base_lines[lo..hi],
                &region_lines(&region.ours_text),
                &region_lines(&region.theirs_text),
                limits.max_cells,
            )
            .map_or(lo..hi, |r| lo + r.start..lo + r.end))
        })
        .collect()
}

fn region_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Picks the sub-span of `window` closest to either side.
///
/// Returns `None` when the search would exceed `max_cells`.
fn refine(
    window: &[&str],
    ours: &[&str],
    theirs: &[&str],
    max_cells: usize,
) -> Option<Range<usize>> {
    let cells = refine_cells(window, ours).saturating_add(refine_cells(window, theirs));
    if cells > max_cells {
        debug!(cells, window = window.len(), "span refinement over budget");
        return None;
    }

    let ours_costs = substitution_costs(window, ours);
    let theirs_costs = substitution_costs(window, theirs);
    let mut best: Option<(f64, Range<usize>)> = None;
    // Starts ascend, so the first minimum found is also the earliest offset.
    for start in 0..=window.len() {
        let from_ours = distances_from(&ours_costs[start..], ours.len());
        let from_theirs = distances_from(&theirs_costs[start..], theirs.len());
        for (len, (o, t)) in from_ours.into_iter().zip(from_theirs).enumerate() {
            let cost = o.min(t);
            if best
                .as_ref()
                .map_or(true, |(best_cost, _)| cost < best_cost - f64::EPSILON)
            {
                best = Some((cost, start..start + len));
            }
        }
    }
    best.map(|(_, range)| range)
}

/// Work of refining `window` against one side: the character tables of
/// every line pair plus one line table per start.
fn refine_cells(window: &[&str], side: &[&str]) -> usize {
    let window_chars: usize = window.iter().map(|l| l.len() + 1).sum();
    let side_chars: usize = side.iter().map(|l| l.len() + 1).sum();
    let starts = window.len() + 1;
    let line_tables = starts
        .saturating_mul(starts)
        .saturating_mul(side.len() + 1)
        / 2;
    window_chars
        .saturating_mul(side_chars)
        .saturating_add(line_tables)
}

/// Character edit fraction of every window line against every side line.
fn substitution_costs(window: &[&str], side: &[&str]) -> Vec<Vec<f64>> {
    window
        .iter()
        .map(|w| side.iter().map(|s| edit_fraction(w.trim(), s.trim())).collect())
        .collect()
}

/// Weighted line distance from each prefix of `rows` to the whole side.
///
/// Element `n` is the distance of the first `n` window lines; one table
/// serves every span end for a given start.
fn distances_from(rows: &[Vec<f64>], side_len: usize) -> Vec<f64> {
    let mut prev: Vec<f64> = (0..=side_len).map(|j| j as f64).collect();
    let mut curr = vec![0.0; side_len + 1];
    let mut distances = Vec::with_capacity(rows.len() + 1);
    distances.push(prev[side_len]);
    for (i, row) in rows.iter().enumerate() {
        curr[0] = (i + 1) as f64;
        for (j, cost) in row.iter().enumerate() {
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1.0).min(curr[j] + 1.0);
        }
        std::mem::swap(&mut prev, &mut curr);
        distances.push(prev[side_len]);
    }
    distances
}

/// Base text of a span, sliced from the original so line endings and a
/// missing final newline survive.
pub fn span_text(base: &str, span: &Range<usize>) -> String {
    let mut starts: Vec<usize> = base
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some(start)
        })
        .collect();
    starts.push(base.len());
    let offset = |line: usize| starts.get(line).copied().unwrap_or(base.len());
    base.get(offset(span.start)..offset(span.end))
        .unwrap_or_default()
        .to_string()
}

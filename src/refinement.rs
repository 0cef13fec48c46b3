//! Post-selection simplification.
//!
//! Two opportunistic rewrites run after the greedy pass: replacing the
//! whole selection with one generalization that covers every include row
//! at zero exclude hits, and merging atom pairs into a generalization
//! that subsumes their combined coverage. Both keep the solution intact
//! when no proposal validates.

use tracing::debug;

use crate::candidates::{global_prefix, truncate_at_last_delimiter};
use crate::matcher;
use crate::models::{PatternKind, SolveOptions};
use crate::solver::AtomSpec;
use crate::tokens::{tokenize, SplitMethod};

/// Refine a multi-atom selection. Single-atom and empty selections are
/// returned untouched.
pub(crate) fn refine<S: AsRef<str>>(
    specs: Vec<AtomSpec>,
    include: &[S],
    exclude: &[S],
    options: &SolveOptions,
) -> Vec<AtomSpec> {
    if specs.len() <= 1 {
        return specs;
    }
    if let Some(single) = try_single_pattern(include, exclude, options) {
        debug!(pattern = %single.text, "refinement collapsed selection to one atom");
        return vec![single];
    }
    merge_pairs(specs, include, exclude, options)
}

/// Look for one generalization that covers all includes with zero
/// exclude hits.
fn try_single_pattern<S: AsRef<str>>(
    include: &[S],
    exclude: &[S],
    options: &SolveOptions,
) -> Option<AtomSpec> {
    for pattern in generalizations(include, options) {
        let include_bits = matcher::match_all(include, &pattern);
        if include_bits.count_ones() != include.len() {
            continue;
        }
        if !matcher::match_all(exclude, &pattern).is_empty() {
            continue;
        }
        return Some(AtomSpec {
            kind: PatternKind::classify(&pattern),
            text: pattern,
            field: None,
        });
    }
    None
}

/// Candidate generalizations of the include set: the common prefix cut
/// at its last delimiter, tokens present in every row, and pairs of
/// those tokens.
fn generalizations<S: AsRef<str>>(include: &[S], options: &SolveOptions) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |pattern: String| {
        if !out.contains(&pattern) {
            out.push(pattern);
        }
    };

    if include.len() >= 2 {
        if let Some(prefix) = global_prefix(include) {
            push(format!("{prefix}*"));
        }
    }

    let method = options.splitmethod.resolve(None, SplitMethod::ClassChange);
    let min_len = options.min_token_len.resolve(None, 3);
    let mut seen: Vec<(String, usize)> = Vec::new();
    for row in include {
        let mut in_row: Vec<String> = Vec::new();
        for token in tokenize(row.as_ref(), method, min_len) {
            if in_row.contains(&token.text) {
                continue;
            }
            in_row.push(token.text.clone());
            match seen.iter_mut().find(|(text, _)| *text == token.text) {
                Some((_, count)) => *count += 1,
                None => seen.push((token.text, 1)),
            }
        }
    }
    let common: Vec<&String> = seen
        .iter()
        .filter(|(_, count)| *count == include.len())
        .map(|(text, _)| text)
        .take(5)
        .collect();

    for token in &common {
        push(format!("*{token}*"));
    }
    for i in 0..common.len() {
        for j in (i + 1)..common.len().min(i + 3) {
            push(format!("*{}*{}*", common[i], common[j]));
        }
    }
    out
}

/// Merge atom pairs whose combined coverage is subsumed by a zero-FP
/// generalization. Runs to a fixpoint; every merge shrinks the list.
fn merge_pairs<S: AsRef<str>>(
    mut specs: Vec<AtomSpec>,
    include: &[S],
    exclude: &[S],
    options: &SolveOptions,
) -> Vec<AtomSpec> {
    loop {
        let masks: Vec<_> = specs
            .iter()
            .map(|spec| matcher::match_all(include, &spec.text))
            .collect();
        let mut replacement: Option<(usize, usize, String)> = None;
        'outer: for i in 0..specs.len() {
            for j in (i + 1)..specs.len() {
                let pair_union = masks[i].union(&masks[j]);
                for pattern in generalize_pair(&specs[i].text, &specs[j].text, options) {
                    let gen_in = matcher::match_all(include, &pattern);
                    if !pair_union.is_subset_of(&gen_in) {
                        continue;
                    }
                    if !matcher::match_all(exclude, &pattern).is_empty() {
                        continue;
                    }
                    replacement = Some((i, j, pattern));
                    break 'outer;
                }
            }
        }
        let Some((i, j, pattern)) = replacement else {
            return specs;
        };
        debug!(
            left = %specs[i].text,
            right = %specs[j].text,
            merged = %pattern,
            "refinement merged atom pair"
        );
        specs.remove(j);
        specs.remove(i);
        specs.push(AtomSpec {
            kind: PatternKind::classify(&pattern),
            text: pattern,
            field: None,
        });
    }
}

/// Generalizations that could cover both patterns: the shared prefix cut
/// back to a delimiter, and substring forms of their common tokens.
fn generalize_pair(left: &str, right: &str, options: &SolveOptions) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let shared: String = left
        .chars()
        .zip(right.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect();
    if shared.chars().count() > 3 {
        if let Some(prefix) = truncate_at_last_delimiter(&shared) {
            let pattern = format!("{prefix}*");
            if matcher::literal_len(&pattern) > 0 {
                out.push(pattern);
            }
        }
    }

    let method = options.splitmethod.resolve(None, SplitMethod::ClassChange);
    let min_len = options.min_token_len.resolve(None, 3);
    let right_tokens: Vec<String> = tokenize(right, method, min_len)
        .into_iter()
        .map(|t| t.text)
        .collect();
    let mut added = 0;
    for token in tokenize(left, method, min_len) {
        if added >= 3 {
            break;
        }
        if right_tokens.contains(&token.text) {
            let pattern = format!("*{}*", token.text);
            if !out.contains(&pattern) {
                out.push(pattern);
                added += 1;
            }
        }
    }
    out
}

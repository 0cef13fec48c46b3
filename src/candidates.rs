//! Candidate pattern generation for single-field solves.
//!
//! Every include row contributes substring, exact, prefix, suffix, and
//! multi-segment patterns derived from its tokens; the whole corpus
//! contributes one longest-common-prefix pattern. Scores are length
//! heuristics that bias the pool ordering, not the selection itself (the
//! greedy loop re-scores everything by cost).

use std::collections::BTreeMap;

use crate::models::{PatternKind, SolveOptions};
use crate::tokens::{iter_tokens, SplitMethod};

/// A scored pattern prior to coverage computation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCandidate {
    pub pattern: String,
    pub kind: PatternKind,
    pub score: f64,
    pub field: Option<String>,
}

/// Deduplicating pool keyed by pattern text, keeping the highest score.
#[derive(Default)]
struct CandidatePool {
    entries: BTreeMap<String, (PatternKind, f64)>,
}

impl CandidatePool {
    fn push(&mut self, pattern: String, kind: PatternKind, score: f64) {
        match self.entries.get(&pattern) {
            Some((_, current)) if score <= *current => {}
            _ => {
                self.entries.insert(pattern, (kind, score));
            }
        }
    }
}

/// Generate the scored candidate pool for `include`.
///
/// The result is sorted by score descending, then pattern text ascending,
/// and is not yet truncated to `max_candidates` (the solver applies that
/// budget so debug tooling can inspect the full pool).
pub fn generate_candidates<S: AsRef<str>>(
    include: &[S],
    options: &SolveOptions,
) -> Vec<GeneratedCandidate> {
    let method = options.splitmethod.resolve(None, SplitMethod::ClassChange);
    let min_len = options.min_token_len.resolve(None, 3);

    let mut token_lists: Vec<Vec<String>> = vec![Vec::new(); include.len()];
    for (idx, token) in iter_tokens(include, method, min_len) {
        token_lists[idx].push(token.text);
    }

    let mut pool = CandidatePool::default();
    let allowed = |kind: PatternKind| options.kind_allowed(kind, None);

    for (row, tokens) in include.iter().zip(&token_lists) {
        let row = row.as_ref();
        if allowed(PatternKind::Substring) {
            for token in tokens.iter().take(options.per_word_substrings) {
                let score = token.chars().count() as f64;
                pool.push(format!("*{token}*"), PatternKind::Substring, score);
            }
        }
        if allowed(PatternKind::Exact) {
            if !row.is_empty() {
                pool.push(
                    row.to_string(),
                    PatternKind::Exact,
                    row.chars().count() as f64,
                );
            }
            for token in tokens {
                pool.push(
                    token.clone(),
                    PatternKind::Exact,
                    token.chars().count() as f64,
                );
            }
        }
        if allowed(PatternKind::Prefix) {
            for token in tokens {
                if row.starts_with(token.as_str()) {
                    let score = 1.5 * token.chars().count() as f64;
                    pool.push(format!("{token}*"), PatternKind::Prefix, score);
                }
            }
        }
        if allowed(PatternKind::Suffix) {
            for token in tokens {
                if row.ends_with(token.as_str()) {
                    let score = 1.5 * token.chars().count() as f64;
                    pool.push(format!("*{token}"), PatternKind::Suffix, score);
                }
            }
        }
        if allowed(PatternKind::Multi) && tokens.len() >= 2 {
            for start in 0..tokens.len() {
                let max_end = (start + options.max_multi_segments).min(tokens.len());
                for end in (start + 2)..=max_end {
                    let window = &tokens[start..end];
                    let score = window.iter().map(|t| t.chars().count()).sum::<usize>() as f64
                        - (end - start - 1) as f64;
                    pool.push(
                        format!("*{}*", window.join("*")),
                        PatternKind::Multi,
                        score,
                    );
                }
            }
        }
    }

    if include.len() >= 2 && allowed(PatternKind::Prefix) {
        if let Some(prefix) = global_prefix(include) {
            let score = 2.0 * prefix.chars().count() as f64;
            pool.push(format!("{prefix}*"), PatternKind::Prefix, score);
        }
    }

    let mut generated: Vec<GeneratedCandidate> = pool
        .entries
        .into_iter()
        .map(|(pattern, (kind, score))| GeneratedCandidate {
            pattern,
            kind,
            score,
            field: None,
        })
        .collect();
    generated.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.pattern.cmp(&b.pattern))
    });
    generated
}

/// Longest common prefix of all rows, truncated at the last
/// non-alphanumeric boundary (the delimiter stays in the prefix).
pub fn global_prefix<S: AsRef<str>>(rows: &[S]) -> Option<String> {
    let mut iter = rows.iter();
    let mut prefix: Vec<char> = iter.next()?.as_ref().chars().collect();
    for row in iter {
        let chars: Vec<char> = row.as_ref().chars().collect();
        let shared = prefix
            .iter()
            .zip(&chars)
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
        if prefix.is_empty() {
            return None;
        }
    }
    truncate_at_last_delimiter(&prefix.into_iter().collect::<String>())
}

/// Keep the prefix through its last non-alphanumeric character.
pub fn truncate_at_last_delimiter(prefix: &str) -> Option<String> {
    let mut cut = 0;
    for (offset, ch) in prefix.char_indices() {
        if !ch.is_alphanumeric() {
            cut = offset + ch.len_utf8();
        }
    }
    if cut > 0 {
        Some(prefix[..cut].to_string())
    } else {
        None
    }
}

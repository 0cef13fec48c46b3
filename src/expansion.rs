//! Per-atom honing: make each pattern as specific as possible without
//! changing which include rows it matches or adding exclude hits.
//!
//! Substring atoms grow rightwards through tokens shared by every
//! matched row, then try to become anchored prefixes; prefix atoms
//! deepen through delimiter boundaries of the matched rows' common
//! prefix. Candidates are tried longest-first and the scan stops as soon
//! as coverage changes, so shorter cuts are never tested needlessly.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::bitset::BitSet;
use crate::matcher;
use crate::models::PatternKind;
use crate::solver::AtomSpec;
use crate::tokens::DELIMITERS;

const MAX_SEGMENTS: usize = 5;
const MAX_EXTENSIONS: usize = 5;
const MAX_PREFIX_CUTS: usize = 10;

fn token_re() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(r"[a-zA-Z0-9]{3,}").expect("static pattern compiles"))
}

/// Hone every atom independently. Atoms that cannot be tightened are
/// returned unchanged.
pub(crate) fn expand<S: AsRef<str>>(
    specs: Vec<AtomSpec>,
    include: &[S],
    exclude: &[S],
) -> Vec<AtomSpec> {
    specs
        .into_iter()
        .map(|spec| {
            let text = expand_one(&spec.text, include, exclude);
            if text != spec.text {
                debug!(from = %spec.text, to = %text, "expansion tightened atom");
                AtomSpec {
                    kind: PatternKind::classify(&text),
                    text,
                    field: spec.field,
                }
            } else {
                spec
            }
        })
        .collect()
}

fn expand_one<S: AsRef<str>>(pattern: &str, include: &[S], exclude: &[S]) -> String {
    let current_in = matcher::match_all(include, pattern);
    if current_in.is_empty() {
        return pattern.to_string();
    }
    let current_ex = matcher::match_all(exclude, pattern);
    let matched: Vec<&str> = current_in.iter_ones().map(|i| include[i].as_ref()).collect();

    let mut best = pattern.to_string();
    let mut best_len = matcher::literal_len(pattern);

    if pattern.starts_with('*') && pattern.ends_with('*') {
        if let Some(extended) =
            extend_segments(pattern, include, exclude, &current_in, &current_ex, &matched)
        {
            best_len = matcher::literal_len(&extended);
            best = extended;
        }
        let common = common_prefix(&matched);
        try_prefix_cuts(
            &common,
            0,
            true,
            include,
            exclude,
            &current_in,
            &current_ex,
            &mut best,
            &mut best_len,
        );
    } else if pattern.ends_with('*') && matcher::wildcard_count(pattern) == 1 {
        // Prefix atoms only deepen to delimiter boundaries; cutting at an
        // arbitrary character would anchor into the middle of a segment.
        let stem = &pattern[..pattern.len() - 1];
        let common = common_prefix(&matched);
        if common.starts_with(stem) {
            try_prefix_cuts(
                &common,
                stem.len(),
                false,
                include,
                exclude,
                &current_in,
                &current_ex,
                &mut best,
                &mut best_len,
            );
        }
    }
    best
}

/// Grow `*a*` towards `*a*b*c*` through next tokens shared by every
/// matched row. Truly adjacent tokens are appended without a wildcard.
fn extend_segments<S: AsRef<str>>(
    pattern: &str,
    include: &[S],
    exclude: &[S],
    current_in: &BitSet,
    current_ex: &BitSet,
    matched: &[&str],
) -> Option<String> {
    let segments: Vec<&str> = pattern.split('*').filter(|s| !s.is_empty()).collect();
    let last_segment = *segments.last()?;
    if segments.len() >= MAX_SEGMENTS {
        return None;
    }

    // Tokens appearing after the last segment, with a contiguity flag
    // that survives only if the token is adjacent in every matched row.
    let mut followers: Vec<(String, usize, bool)> = Vec::new();
    for row in matched {
        let lower = row.to_lowercase();
        let tokens: Vec<&str> = token_re().find_iter(&lower).map(|m| m.as_str()).collect();
        let Some(last_idx) = tokens.iter().position(|t| *t == last_segment) else {
            continue;
        };
        let Some(seg_pos) = lower.find(last_segment) else {
            continue;
        };
        let search_from = seg_pos + last_segment.len();
        for token in &tokens[last_idx + 1..] {
            if segments.contains(token) {
                continue;
            }
            let Some(tok_pos) = lower[search_from..].find(token) else {
                continue;
            };
            let contiguous = tok_pos == 0;
            match followers.iter_mut().find(|(t, _, _)| t == token) {
                Some((_, count, all_contiguous)) => {
                    *count += 1;
                    *all_contiguous &= contiguous;
                }
                None => followers.push((token.to_string(), 1, contiguous)),
            }
        }
    }

    let mut shared: Vec<(String, bool)> = followers
        .into_iter()
        .filter(|(_, count, _)| *count == matched.len())
        .map(|(token, _, contiguous)| (token, contiguous))
        .collect();
    shared.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    let mut current = pattern.to_string();
    let mut best: Option<String> = None;
    let mut best_len = matcher::literal_len(pattern);
    for (token, contiguous) in shared.into_iter().take(MAX_EXTENSIONS) {
        let stem = &current[..current.len() - 1];
        let extended = if contiguous {
            format!("{stem}{token}*")
        } else {
            format!("{stem}*{token}*")
        };
        if matcher::match_all(include, &extended) != *current_in {
            continue;
        }
        if !matcher::match_all(exclude, &extended).is_subset_of(current_ex) {
            continue;
        }
        let len = matcher::literal_len(&extended);
        if len > best_len {
            best_len = len;
            current = extended.clone();
            best = Some(extended);
        }
    }
    best
}

/// Try anchored prefixes cut at delimiter boundaries of `common`,
/// longest first. The scan stops at the first cut whose coverage
/// differs, because every shorter cut is strictly more general.
#[allow(clippy::too_many_arguments)]
fn try_prefix_cuts<S: AsRef<str>>(
    common: &str,
    min_offset: usize,
    include_full: bool,
    include: &[S],
    exclude: &[S],
    current_in: &BitSet,
    current_ex: &BitSet,
    best: &mut String,
    best_len: &mut usize,
) {
    let mut cuts: Vec<usize> = common
        .char_indices()
        .filter(|(_, ch)| DELIMITERS.contains(ch))
        .map(|(offset, ch)| offset + ch.len_utf8())
        .filter(|offset| *offset > min_offset)
        .collect();
    if include_full && common.len() > min_offset {
        cuts.push(common.len());
    }
    cuts.sort_unstable_by(|a, b| b.cmp(a));
    cuts.dedup();

    for cut in cuts.into_iter().take(MAX_PREFIX_CUTS) {
        let candidate = format!("{}*", &common[..cut]);
        if matcher::match_all(include, &candidate) != *current_in {
            break;
        }
        if !matcher::match_all(exclude, &candidate).is_subset_of(current_ex) {
            continue;
        }
        let len = matcher::literal_len(&candidate);
        if len > *best_len {
            *best_len = len;
            *best = candidate;
            if *best_len == common.chars().count() {
                return;
            }
        }
    }
}

/// Longest common prefix of the matched rows, raw case preserved.
fn common_prefix(rows: &[&str]) -> String {
    let mut iter = rows.iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.chars().collect();
    for row in iter {
        let chars: Vec<char> = row.chars().collect();
        let shared = prefix
            .iter()
            .zip(&chars)
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
        if prefix.is_empty() {
            break;
        }
    }
    prefix.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_becomes_prefix() {
        let include = ["pd_sio/asio/a0", "pd_sio/asio/a1"];
        let exclude = ["pd_dbg/asio/a0"];
        assert_eq!(expand_one("*sio*", &include, &exclude), "pd_sio/asio/a*");
    }

    #[test]
    fn test_prefix_deepens_through_delimiters() {
        let include = ["pd_sio/asio/spis/u0", "pd_sio/asio/spis/u1"];
        let exclude: [&str; 0] = [];
        assert_eq!(
            expand_one("pd_sio/*", &include, &exclude),
            "pd_sio/asio/spis/*"
        );
    }

    #[test]
    fn test_prefix_stops_at_delimiter_boundary() {
        // "alpha*" reaches "alpha/" but never anchors into "alpha/m".
        let include = ["alpha/m1", "alpha/m2"];
        let exclude = ["beta/m1"];
        assert_eq!(expand_one("alpha*", &include, &exclude), "alpha/*");
    }

    #[test]
    fn test_segment_extension() {
        let include = ["cpu/c0/execute/alu_int/s1", "cpu/c1/execute/alu_int/s2"];
        let exclude = ["cpu/c0/decode/alu_bypass"];
        let expanded = expand_one("*execute*", &include, &exclude);
        assert!(expanded.starts_with("*execute*"), "got {expanded}");
        assert!(expanded.contains("alu"), "got {expanded}");
    }

    #[test]
    fn test_coverage_is_preserved() {
        // Tightening to the common prefix would drop the second row.
        let include = ["alpha/cache/0", "beta/cache/1"];
        let exclude: [&str; 0] = [];
        assert_eq!(expand_one("*cache*", &include, &exclude), "*cache*");
    }

    #[test]
    fn test_exclude_hits_block_tightening() {
        let include = ["alpha/mem/0"];
        let exclude = ["alpha/mem/9"];
        // "alpha/mem/*" would pick up the exclude row; the full-length
        // cut is still clean.
        let expanded = expand_one("*mem*", &include, &exclude);
        assert_eq!(expanded, "alpha/mem/0*");
    }
}

//! Wildcard matching primitives.
//!
//! A pattern is a literal string where `*` matches any run of characters.
//! There is no other meta-syntax; invalid patterns simply behave as
//! literals. This sits on the hot path of every coverage computation, so
//! the implementation scans byte positions directly instead of compiling
//! anything.

use crate::bitset::BitSet;

/// Does `text` match the wildcard `pattern`?
///
/// Semantics:
/// - `"*"` matches everything.
/// - A pattern without `*` matches by literal equality.
/// - Otherwise the pattern splits into fragments on `*`. The first
///   fragment anchors the start unless the pattern begins with `*`; the
///   last fragment anchors the end unless the pattern ends with `*`.
///   Intermediate fragments must occur in order, non-overlapping, each
///   searched from just past the previous match.
pub fn match_pattern(text: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return text == pattern;
    }
    let start_anchor = !pattern.starts_with('*');
    let end_anchor = !pattern.ends_with('*');
    let mut frags: Vec<&str> = pattern.split('*').filter(|f| !f.is_empty()).collect();
    if frags.is_empty() {
        return true;
    }
    let mut pos = 0usize;
    if start_anchor {
        let first = frags[0];
        if !text.starts_with(first) {
            return false;
        }
        pos = first.len();
        frags.remove(0);
    }
    let last = frags.len().wrapping_sub(1);
    for (idx, frag) in frags.iter().enumerate() {
        if idx == last && end_anchor {
            return text.ends_with(frag) && text[pos..].contains(frag);
        }
        match text[pos..].find(frag) {
            Some(found) => pos += found + frag.len(),
            None => return false,
        }
    }
    true
}

/// Match a raw expression composed of wildcard atoms.
///
/// `&` joins conjuncts; within a conjunct, `A - B - C` means
/// "matches A and neither B nor C". Parentheses around the minus
/// operands are stripped.
pub fn match_raw(text: &str, raw: &str) -> bool {
    raw.split('&').all(|piece| match_minus_piece(text, piece))
}

fn match_minus_piece(text: &str, piece: &str) -> bool {
    let piece = piece.trim();
    if piece.is_empty() {
        return true;
    }
    let mut parts = piece
        .split('-')
        .map(|p| p.trim().trim_matches(|c| c == '(' || c == ')').trim())
        .filter(|p| !p.is_empty());
    let Some(left) = parts.next() else {
        return true;
    };
    if !match_pattern(text, left) {
        return false;
    }
    parts.all(|right| !match_pattern(text, right))
}

/// Bitset of the rows in `texts` matched by `pattern`.
pub fn match_all<S: AsRef<str>>(texts: &[S], pattern: &str) -> BitSet {
    let mut bits = BitSet::new(texts.len());
    for (idx, text) in texts.iter().enumerate() {
        if match_pattern(text.as_ref(), pattern) {
            bits.insert(idx);
        }
    }
    bits
}

/// Bitset of the rows matched by a raw `&`/`-` expression.
pub fn match_all_raw<S: AsRef<str>>(texts: &[S], raw: &str) -> BitSet {
    let mut bits = BitSet::new(texts.len());
    for (idx, text) in texts.iter().enumerate() {
        if match_raw(text.as_ref(), raw) {
            bits.insert(idx);
        }
    }
    bits
}

/// Number of `*` meta-characters in a pattern.
pub fn wildcard_count(pattern: &str) -> usize {
    pattern.matches('*').count()
}

/// Pattern text length excluding wildcards.
pub fn literal_len(pattern: &str) -> usize {
    pattern.chars().filter(|c| *c != '*').count()
}

//! Property-based tests for solver and matcher invariants.
//!
//! Uses proptest to verify that the solver's guarantees hold across a
//! wide range of generated identifier corpora.

use proptest::prelude::*;

use patternforge::{matcher, propose_solution, SolveOptions};

/// Hierarchical-identifier generator: a few segments over a small
/// alphabet, so include/exclude sets collide often enough to be
/// interesting.
fn identifier() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-d]{1,6}", 1..4).prop_map(|segments| segments.join("/"))
}

fn corpus(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(identifier(), 0..max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: EXACT mode never reports a false positive, and the
    /// coverage arithmetic always balances.
    #[test]
    fn prop_exact_mode_has_zero_fp(include in corpus(6), exclude in corpus(6)) {
        let solution = propose_solution(&include, &exclude, &SolveOptions::default()).unwrap();
        prop_assert_eq!(solution.metrics.fp, 0);
        prop_assert_eq!(
            solution.metrics.covered + solution.metrics.fn_count,
            include.len()
        );
        prop_assert_eq!(solution.metrics.total_positive, include.len());
    }

    /// Property: per-atom counts agree with the matcher, and the
    /// wildcard/length arithmetic is exact.
    #[test]
    fn prop_atom_counts_match_matcher(include in corpus(5), exclude in corpus(5)) {
        let solution = propose_solution(&include, &exclude, &SolveOptions::default()).unwrap();
        for atom in &solution.atoms {
            let tp = include.iter().filter(|row| matcher::match_raw(row, &atom.text)).count();
            let fp = exclude.iter().filter(|row| matcher::match_raw(row, &atom.text)).count();
            prop_assert_eq!(atom.tp, tp);
            prop_assert_eq!(atom.fp, fp);
            prop_assert_eq!(atom.wildcards, atom.text.matches('*').count());
            prop_assert_eq!(
                atom.length + atom.wildcards,
                atom.text.chars().count()
            );
            prop_assert_ne!(atom.text.as_str(), "*");
        }
    }

    /// Property: solving the same inputs twice yields structurally and
    /// textually identical solutions.
    #[test]
    fn prop_determinism(include in corpus(5), exclude in corpus(5)) {
        let first = propose_solution(&include, &exclude, &SolveOptions::default()).unwrap();
        let second = propose_solution(&include, &exclude, &SolveOptions::default()).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    /// Property: anchoring semantics of the matcher primitives.
    #[test]
    fn prop_matcher_anchors(text in "[a-z/_.]{1,20}") {
        if !text.contains('*') {
            prop_assert!(matcher::match_pattern(&text, &text));
            prop_assert!(matcher::match_pattern(&text, "*"));
            let prefix = &text[..text.len().min(3)];
            let prefix_pattern = format!("{}*", prefix);
            prop_assert!(matcher::match_pattern(&text, &prefix_pattern));
            let start = text.len().saturating_sub(3);
            let suffix = &text[start..];
            let suffix_pattern = format!("*{}", suffix);
            prop_assert!(matcher::match_pattern(&text, &suffix_pattern));
            let mid = &text[..text.len().min(2)];
            let mid_pattern = format!("*{}*", mid);
            prop_assert!(matcher::match_pattern(&text, &mid_pattern));
        }
    }

    /// Property: wildcard counting is exact on arbitrary pattern text.
    #[test]
    fn prop_wildcard_arithmetic(pattern in "[a-z*]{0,20}") {
        let stars = pattern.matches('*').count();
        prop_assert_eq!(matcher::wildcard_count(&pattern), stars);
        prop_assert_eq!(
            matcher::literal_len(&pattern) + stars,
            pattern.chars().count()
        );
    }
}

//! Inversion strategies: the complement is returned only when it is
//! both wanted and FP-feasible.

use patternforge::{
    propose_solution, InvertStrategy, QualityMode, SolveOptions, TermMethod,
};

#[test]
fn test_always_falls_back_when_complement_violates_fp() {
    // The complement of a selection covering "one" matches both exclude
    // rows, so EXACT mode keeps the base solution.
    let include = ["one"];
    let exclude = ["two", "three"];
    let options = SolveOptions {
        invert: InvertStrategy::Always,
        ..SolveOptions::default()
    };
    let solution = propose_solution(&include, &exclude, &options).unwrap();
    assert!(!solution.global_inverted);
    assert_eq!(solution.term_method, TermMethod::Additive);
    assert_eq!(solution.metrics.fp, 0);
    assert_eq!(solution.metrics.covered, 1);
}

#[test]
fn test_always_inverts_when_feasible() {
    let include = ["one"];
    let exclude = ["two", "three"];
    let options = SolveOptions {
        mode: QualityMode::Approx,
        invert: InvertStrategy::Always,
        ..SolveOptions::default()
    };
    let solution = propose_solution(&include, &exclude, &options).unwrap();
    assert!(solution.global_inverted);
    assert_eq!(solution.term_method, TermMethod::Subtractive);
    // Complemented accounting: everything the base selection matched is
    // now a false negative and vice versa.
    assert_eq!(solution.metrics.covered + solution.metrics.fn_count, 1);
}

#[test]
fn test_never_keeps_base() {
    let include = ["alpha/m1", "alpha/m2"];
    let exclude = ["beta/m1"];
    let options = SolveOptions {
        invert: InvertStrategy::Never,
        ..SolveOptions::default()
    };
    let solution = propose_solution(&include, &exclude, &options).unwrap();
    assert!(!solution.global_inverted);
    assert_eq!(solution.metrics.covered, 2);
    assert_eq!(solution.metrics.fp, 0);
}

#[test]
fn test_auto_prefers_cheaper_base_here() {
    let include = ["alpha/m1", "alpha/m2", "alpha/m3"];
    let exclude = ["beta/m1"];
    let solution = propose_solution(&include, &exclude, &SolveOptions::default()).unwrap();
    assert!(!solution.global_inverted);
    assert_eq!(solution.metrics.fp, 0);
}

#[test]
fn test_inverted_solution_still_honors_max_fp() {
    // Whatever the strategy asks for, the returned metrics respect the
    // EXACT-mode post-condition.
    for invert in [
        InvertStrategy::Never,
        InvertStrategy::Auto,
        InvertStrategy::Always,
    ] {
        let options = SolveOptions {
            invert,
            ..SolveOptions::default()
        };
        let solution =
            propose_solution(&["one"], &["two", "three"], &options).unwrap();
        assert_eq!(solution.metrics.fp, 0, "strategy {invert:?} leaked FP");
    }
}

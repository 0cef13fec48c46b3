//! Refinement and honing at the API level: more general atoms replace
//! fragmented selections, and tightening never changes coverage.

use patternforge::{propose_solution, PerField, SolveOptions, Weights};

#[test]
fn test_fragmented_selection_collapses_to_common_prefix() {
    // Exact-row atoms would cover this, but one prefix atom does the
    // same job; the final answer has a single generalized atom.
    let include = [
        "top/blockA[0]/mem",
        "top/blockA[1]/mem",
        "top/blockA[2]/mem",
    ];
    let exclude = ["bot/blockA[0]/mem"];
    let solution = propose_solution(&include, &exclude, &SolveOptions::default()).unwrap();
    assert_eq!(solution.atoms.len(), 1);
    assert_eq!(solution.metrics.covered, 3);
    assert_eq!(solution.metrics.fp, 0);
}

#[test]
fn test_honing_produces_anchored_patterns() {
    let include = ["pd_sio/asio/u0", "pd_sio/asio/u1"];
    let exclude = ["pd_dbg/asio/u0"];
    let solution = propose_solution(&include, &exclude, &SolveOptions::default()).unwrap();
    assert_eq!(solution.metrics.covered, 2);
    assert_eq!(solution.metrics.fp, 0);
    // Whatever atom was selected, honing anchors it into the pd_sio
    // subtree rather than leaving a floating substring.
    assert!(
        solution.atoms.iter().any(|a| a.text.starts_with("pd_sio/")),
        "expected an anchored atom, got {:?}",
        solution.atoms
    );
}

#[test]
fn test_refinement_never_regresses_coverage() {
    let include = [
        "alpha/mem/i0",
        "alpha/mem/i1",
        "beta/rom/j0",
        "gamma/reg/k0",
    ];
    let exclude = ["alpha/dbg/i0", "beta/dbg/j0"];
    let solution = propose_solution(&include, &exclude, &SolveOptions::default()).unwrap();
    assert_eq!(solution.metrics.covered, 4);
    assert_eq!(solution.metrics.fp, 0);
}

#[test]
fn test_refined_atoms_keep_counts_consistent() {
    let include = ["x/cache/bank0", "x/cache/bank1", "y/cache/bank2"];
    let exclude = ["x/debug/bank0"];
    let options = SolveOptions {
        weights: Weights {
            w_len: PerField::Scalar(-0.01),
            w_atom: PerField::Scalar(0.35),
            ..Weights::default()
        },
        ..SolveOptions::default()
    };
    let solution = propose_solution(&include, &exclude, &options).unwrap();
    for atom in &solution.atoms {
        let tp = include
            .iter()
            .filter(|row| patternforge::matcher::match_raw(row, &atom.text))
            .count();
        assert_eq!(atom.tp, tp);
    }
    assert_eq!(solution.metrics.fp, 0);
}

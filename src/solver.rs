//! Greedy set-cover selection and solution assembly.
//!
//! The solver scores every candidate against the current selection each
//! round and commits the cheapest one while the weighted cost keeps
//! falling and the hard budgets hold. Inversion, refinement, and
//! expansion are post-passes over the committed selection.

use tracing::debug;

use crate::bitset::BitSet;
use crate::candidates::generate_candidates;
use crate::expansion;
use crate::matcher;
use crate::models::{
    Atom, Candidate, InvertStrategy, Metrics, PatternKind, SolveOptions, Solution, Term,
    TermMethod, Weights, Witnesses,
};
use crate::refinement;
use crate::Error;

/// A pattern headed for the solution, before ids and counts are attached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AtomSpec {
    pub text: String,
    pub kind: PatternKind,
    pub field: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Selection {
    pub chosen: Vec<usize>,
    pub include_bits: BitSet,
    pub exclude_bits: BitSet,
}

/// Per-candidate additive cost contribution, resolved by its field.
fn atom_cost(candidate: &Candidate, weights: &Weights) -> f64 {
    let field = candidate.field.as_deref();
    weights.w_atom.resolve(field, 0.05)
        + weights.w_wc.resolve(field, 0.01) * candidate.wildcards as f64
        + weights.w_len.resolve(field, 0.001) * candidate.length as f64
}

fn selection_cost(
    chosen: &[usize],
    candidates: &[Candidate],
    matched: usize,
    fp: usize,
    num_include: usize,
    weights: &Weights,
) -> f64 {
    let w_fp = weights.w_fp.resolve(None, 1.0);
    let w_fn = weights.w_fn.resolve(None, 1.0);
    let w_op = weights.w_op.resolve(None, 0.02);
    let ops = chosen.len().saturating_sub(1);
    let atoms: f64 = chosen.iter().map(|&ci| atom_cost(&candidates[ci], weights)).sum();
    w_fp * fp as f64 + w_fn * (num_include - matched) as f64 + w_op * ops as f64 + atoms
}

/// Attach coverage bitsets to the generated pool, truncated to the
/// candidate budget.
pub(crate) fn build_candidates<S: AsRef<str>>(
    include: &[S],
    exclude: &[S],
    options: &SolveOptions,
) -> Vec<Candidate> {
    let generated = generate_candidates(include, options);
    debug!(pool = generated.len(), "generated candidate pool");
    generated
        .into_iter()
        .take(options.budgets.max_candidates)
        .map(|g| Candidate {
            include_bits: matcher::match_all(include, &g.pattern),
            exclude_bits: matcher::match_all(exclude, &g.pattern),
            wildcards: matcher::wildcard_count(&g.pattern),
            length: matcher::literal_len(&g.pattern),
            text: g.pattern,
            kind: g.kind,
            score: g.score,
            field: g.field,
        })
        .collect()
}

/// Greedy selection loop of spec-defined cost and tie-breaks.
pub(crate) fn greedy_select(
    num_include: usize,
    candidates: &[Candidate],
    options: &SolveOptions,
) -> Selection {
    let weights = &options.weights;
    let max_fp = options.effective_max_fp(num_include);
    let max_fn = options.budgets.max_fn.as_ref().map(|l| l.resolve(num_include));
    let max_patterns = options
        .budgets
        .max_patterns
        .as_ref()
        .map(|l| l.resolve(num_include));

    let mut selection = Selection {
        chosen: Vec::new(),
        include_bits: BitSet::new(num_include),
        exclude_bits: BitSet::new(candidates.first().map_or(0, |c| c.exclude_bits.len())),
    };
    let mut best_cost = selection_cost(&[], candidates, 0, 0, num_include, weights);
    let mut atom_sum = 0.0;

    loop {
        if max_patterns.is_some_and(|limit| selection.chosen.len() >= limit) {
            break;
        }
        struct Best<'a> {
            index: usize,
            cost: f64,
            matched: usize,
            wildcards: usize,
            length: usize,
            text: &'a str,
        }
        let mut best: Option<Best> = None;
        let w_fp = weights.w_fp.resolve(None, 1.0);
        let w_fn = weights.w_fn.resolve(None, 1.0);
        let w_op = weights.w_op.resolve(None, 0.02);
        for (index, candidate) in candidates.iter().enumerate() {
            if selection.chosen.contains(&index) {
                continue;
            }
            let trial_matched = selection.include_bits.union_count(&candidate.include_bits);
            let trial_fp = selection.exclude_bits.union_count(&candidate.exclude_bits);
            let trial_fn = num_include - trial_matched;
            if max_fp.is_some_and(|limit| trial_fp > limit) {
                continue;
            }
            if max_fn.is_some_and(|limit| trial_fn > limit) {
                continue;
            }
            let trial_cost = w_fp * trial_fp as f64
                + w_fn * trial_fn as f64
                + w_op * selection.chosen.len() as f64
                + atom_sum
                + atom_cost(candidate, weights);
            let better = match &best {
                None => true,
                Some(current) => {
                    if trial_cost != current.cost {
                        trial_cost < current.cost
                    } else if trial_matched != current.matched {
                        trial_matched > current.matched
                    } else if candidate.wildcards != current.wildcards {
                        candidate.wildcards < current.wildcards
                    } else if candidate.length != current.length {
                        candidate.length > current.length
                    } else {
                        candidate.text.as_str() < current.text
                    }
                }
            };
            if better {
                best = Some(Best {
                    index,
                    cost: trial_cost,
                    matched: trial_matched,
                    wildcards: candidate.wildcards,
                    length: candidate.length,
                    text: candidate.text.as_str(),
                });
            }
        }
        let Some(winner) = best else { break };
        if winner.cost > best_cost {
            break;
        }
        let candidate = &candidates[winner.index];
        selection.include_bits.union_with(&candidate.include_bits);
        selection.exclude_bits.union_with(&candidate.exclude_bits);
        selection.chosen.push(winner.index);
        atom_sum += atom_cost(candidate, weights);
        best_cost = winner.cost;
        debug!(
            pattern = %candidate.text,
            covered = selection.include_bits.count_ones(),
            fp = selection.exclude_bits.count_ones(),
            "committed candidate"
        );
    }
    selection
}

/// Realize a solution from atom specs: per-atom counts, terms with
/// residual contributions, metrics, and witnesses.
pub(crate) fn make_solution<S: AsRef<str>>(
    include: &[S],
    exclude: &[S],
    specs: &[AtomSpec],
    options: &SolveOptions,
    inverted: bool,
) -> Solution {
    let masks_in: Vec<BitSet> = specs
        .iter()
        .map(|s| matcher::match_all_raw(include, &s.text))
        .collect();
    let masks_ex: Vec<BitSet> = specs
        .iter()
        .map(|s| matcher::match_all_raw(exclude, &s.text))
        .collect();

    let atoms: Vec<Atom> = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| Atom {
            id: format!("P{}", i + 1),
            text: spec.text.clone(),
            kind: spec.kind,
            wildcards: matcher::wildcard_count(&spec.text),
            length: matcher::literal_len(&spec.text),
            field: spec.field.clone(),
            negated: false,
            tp: masks_in[i].count_ones(),
            fp: masks_ex[i].count_ones(),
        })
        .collect();

    let terms = if options.allow_complex_expressions {
        build_complex_terms(include, exclude, &atoms, &masks_in, &masks_ex)
    } else {
        build_simple_terms(include, exclude, &atoms, &masks_in, &masks_ex)
    };

    finish_solution(include, exclude, atoms, terms, options, inverted)
}

pub(crate) struct RealizedTerm {
    term: Term,
    mask_in: BitSet,
    mask_ex: BitSet,
}

fn examples<S: AsRef<str>>(rows: &[S], mask: &BitSet) -> Vec<String> {
    mask.iter_ones()
        .take(3)
        .map(|i| rows[i].as_ref().to_string())
        .collect()
}

fn build_simple_terms<S: AsRef<str>>(
    include: &[S],
    exclude: &[S],
    atoms: &[Atom],
    masks_in: &[BitSet],
    masks_ex: &[BitSet],
) -> Vec<RealizedTerm> {
    atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| RealizedTerm {
            term: Term {
                expr: atom.id.clone(),
                raw_expr: atom.text.clone(),
                fields: None,
                not_fields: None,
                tp: masks_in[i].count_ones(),
                fp: masks_ex[i].count_ones(),
                fn_count: include.len() - masks_in[i].count_ones(),
                incremental_tp: 0,
                incremental_fp: 0,
                length: atom.length,
                include_examples: examples(include, &masks_in[i]),
                exclude_examples: examples(exclude, &masks_ex[i]),
            },
            mask_in: masks_in[i].clone(),
            mask_ex: masks_ex[i].clone(),
        })
        .collect()
}

/// Pair atoms into `A & B` or `A & !B` terms when the combination keeps
/// the first atom's include coverage and strictly reduces its FP hits.
fn build_complex_terms<S: AsRef<str>>(
    include: &[S],
    exclude: &[S],
    atoms: &[Atom],
    masks_in: &[BitSet],
    masks_ex: &[BitSet],
) -> Vec<RealizedTerm> {
    let mut used = vec![false; atoms.len()];
    let mut terms = Vec::new();
    for i in 0..atoms.len() {
        if used[i] {
            continue;
        }
        let tp_i = masks_in[i].count_ones();
        let mut best_conj: Option<(usize, BitSet, BitSet)> = None;
        let mut best_conj_fp = masks_ex[i].count_ones();
        let mut best_sub: Option<(usize, BitSet, BitSet)> = None;
        let mut best_sub_fp = masks_ex[i].count_ones();
        for j in (i + 1)..atoms.len() {
            if used[j] {
                continue;
            }
            let inter_in = masks_in[i].intersect(&masks_in[j]);
            let inter_ex = masks_ex[i].intersect(&masks_ex[j]);
            if inter_in.count_ones() == tp_i && inter_ex.count_ones() < best_conj_fp {
                best_conj_fp = inter_ex.count_ones();
                best_conj = Some((j, inter_in, inter_ex));
            }
            let diff_in = masks_in[i].and_not(&masks_in[j]);
            let diff_ex = masks_ex[i].and_not(&masks_ex[j]);
            if diff_in.count_ones() == tp_i && diff_ex.count_ones() < best_sub_fp {
                best_sub_fp = diff_ex.count_ones();
                best_sub = Some((j, diff_in, diff_ex));
            }
        }
        let (expr, raw_expr, partner, mask_in, mask_ex) = if let Some((j, m_in, m_ex)) = best_conj {
            (
                format!("{} & {}", atoms[i].id, atoms[j].id),
                format!("({}) & ({})", atoms[i].text, atoms[j].text),
                Some(j),
                m_in,
                m_ex,
            )
        } else if let Some((j, m_in, m_ex)) = best_sub {
            (
                format!("{} & !{}", atoms[i].id, atoms[j].id),
                format!("({}) - ({})", atoms[i].text, atoms[j].text),
                Some(j),
                m_in,
                m_ex,
            )
        } else {
            (
                atoms[i].id.clone(),
                atoms[i].text.clone(),
                None,
                masks_in[i].clone(),
                masks_ex[i].clone(),
            )
        };
        used[i] = true;
        let length = match partner {
            Some(j) => {
                used[j] = true;
                atoms[i].length + atoms[j].length
            }
            None => atoms[i].length,
        };
        terms.push(RealizedTerm {
            term: Term {
                expr,
                raw_expr,
                fields: None,
                not_fields: None,
                tp: mask_in.count_ones(),
                fp: mask_ex.count_ones(),
                fn_count: include.len() - mask_in.count_ones(),
                incremental_tp: 0,
                incremental_fp: 0,
                length,
                include_examples: examples(include, &mask_in),
                exclude_examples: examples(exclude, &mask_ex),
            },
            mask_in,
            mask_ex,
        });
    }
    terms
}

/// Shared tail for single-field and structured assembly: residuals in
/// term order, metrics (inversion-aware), witnesses, expression strings.
pub(crate) fn finish_solution<S: AsRef<str>>(
    include: &[S],
    exclude: &[S],
    atoms: Vec<Atom>,
    mut terms: Vec<RealizedTerm>,
    options: &SolveOptions,
    inverted: bool,
) -> Solution {
    let mut acc_in = BitSet::new(include.len());
    let mut acc_ex = BitSet::new(exclude.len());
    for realized in &mut terms {
        let new_in = realized.mask_in.and_not(&acc_in);
        let new_ex = realized.mask_ex.and_not(&acc_ex);
        realized.term.incremental_tp = new_in.count_ones();
        realized.term.incremental_fp = new_ex.count_ones();
        acc_in.union_with(&realized.mask_in);
        acc_ex.union_with(&realized.mask_ex);
    }

    let matched_expr = acc_in.count_ones();
    let fp_expr = acc_ex.count_ones();
    let (covered, fp, fn_count) = if inverted {
        (
            include.len() - matched_expr,
            exclude.len() - fp_expr,
            matched_expr,
        )
    } else {
        (matched_expr, fp_expr, include.len() - matched_expr)
    };

    let mut witnesses = Witnesses::default();
    for (idx, row) in include.iter().enumerate() {
        if witnesses.tp_examples.len() >= 3 {
            break;
        }
        if acc_in.contains(idx) != inverted {
            witnesses.tp_examples.push(row.as_ref().to_string());
        }
    }
    for (idx, row) in exclude.iter().enumerate() {
        if witnesses.fp_examples.len() >= 3 {
            break;
        }
        if acc_ex.contains(idx) != inverted {
            witnesses.fp_examples.push(row.as_ref().to_string());
        }
    }
    for (idx, row) in include.iter().enumerate() {
        if witnesses.fn_examples.len() >= 3 {
            break;
        }
        if acc_in.contains(idx) == inverted {
            witnesses.fn_examples.push(row.as_ref().to_string());
        }
    }

    let metrics = Metrics {
        covered,
        total_positive: include.len(),
        fp,
        fn_count,
        patterns: atoms.len(),
        boolean_ops: atoms.len().saturating_sub(1),
        wildcards: atoms.iter().map(|a| a.wildcards).sum(),
        pattern_chars: atoms.iter().map(|a| a.length).sum(),
    };

    let wrap = |text: &str, multi: bool| {
        if multi {
            format!("({text})")
        } else {
            text.to_string()
        }
    };
    let expr = if terms.is_empty() {
        "FALSE".to_string()
    } else {
        terms
            .iter()
            .map(|t| wrap(&t.term.expr, t.term.expr.contains('&')))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    let raw_expr = if terms.is_empty() {
        "FALSE".to_string()
    } else {
        terms
            .iter()
            .map(|t| t.term.raw_expr.clone())
            .collect::<Vec<_>>()
            .join(" | ")
    };

    Solution {
        expr,
        raw_expr,
        global_inverted: inverted,
        term_method: if inverted {
            TermMethod::Subtractive
        } else {
            TermMethod::Additive
        },
        mode: options.mode,
        options: options.snapshot(),
        atoms,
        metrics,
        witnesses,
        terms: terms.into_iter().map(|t| t.term).collect(),
    }
}

pub(crate) fn realized_term(term: Term, mask_in: BitSet, mask_ex: BitSet) -> RealizedTerm {
    RealizedTerm {
        term,
        mask_in,
        mask_ex,
    }
}

/// Propose a wildcard expression covering `include` and avoiding
/// `exclude`.
pub fn propose_solution<S: AsRef<str>>(
    include: &[S],
    exclude: &[S],
    options: &SolveOptions,
) -> Result<Solution, Error> {
    options.validate()?;
    if include.is_empty() {
        return Ok(Solution::empty(0, options));
    }
    let candidates = build_candidates(include, exclude, options);
    let selection = greedy_select(include.len(), &candidates, options);
    let specs: Vec<AtomSpec> = selection
        .chosen
        .iter()
        .map(|&ci| AtomSpec {
            text: candidates[ci].text.clone(),
            kind: candidates[ci].kind,
            field: candidates[ci].field.clone(),
        })
        .collect();

    let max_fp = options.effective_max_fp(include.len());
    let fp_feasible =
        |solution: &Solution| max_fp.is_none_or(|limit| solution.metrics.fp <= limit);

    let base = make_solution(include, exclude, &specs, options, false);
    let mut solution = match options.invert {
        InvertStrategy::Never => base,
        InvertStrategy::Always => {
            let inverted = make_solution(include, exclude, &specs, options, true);
            if fp_feasible(&inverted) {
                inverted
            } else {
                base
            }
        }
        InvertStrategy::Auto => {
            if specs.is_empty() {
                let inverted = make_solution(include, exclude, &specs, options, true);
                if fp_feasible(&inverted) {
                    inverted
                } else {
                    base
                }
            } else {
                let matched = selection.include_bits.count_ones();
                let fp = selection.exclude_bits.count_ones();
                let base_cost = selection_cost(
                    &selection.chosen,
                    &candidates,
                    matched,
                    fp,
                    include.len(),
                    &options.weights,
                );
                let inverted_cost = selection_cost(
                    &selection.chosen,
                    &candidates,
                    include.len() - matched,
                    exclude.len() - fp,
                    include.len(),
                    &options.weights,
                );
                if inverted_cost < base_cost {
                    let inverted = make_solution(include, exclude, &specs, options, true);
                    if fp_feasible(&inverted) {
                        inverted
                    } else {
                        base
                    }
                } else {
                    base
                }
            }
        }
    };

    if !solution.global_inverted && !solution.atoms.is_empty() {
        let mut specs: Vec<AtomSpec> = solution
            .atoms
            .iter()
            .map(|a| AtomSpec {
                text: a.text.clone(),
                kind: a.kind,
                field: a.field.clone(),
            })
            .collect();
        specs = refinement::refine(specs, include, exclude, options);
        specs = expansion::expand(specs, include, exclude);
        solution = make_solution(include, exclude, &specs, options, false);
    }
    debug!(
        expr = %solution.expr,
        covered = solution.metrics.covered,
        fp = solution.metrics.fp,
        inverted = solution.global_inverted,
        "solution assembled"
    );
    Ok(solution)
}

//! Human-oriented views of a solution: recomputed metrics, per-term
//! residual ordering, and field attribution for structured results.
//! Rendering stays here so the solver never formats anything.

use serde_json::json;

use crate::bitset::BitSet;
use crate::matcher;
use crate::models::{Solution, StructuredRow, TermMethod};

/// Recompute per-atom counts and aggregate metrics from the corpora and
/// return them alongside the solution's own term data.
///
/// Coverage is replayed term by term over each term's raw `&`/`-` text,
/// never by unioning bare atoms: a conjunction or subtraction term
/// matches fewer rows than its atoms do. Structured atoms match
/// per-field values rather than the flattened row text, so their counts
/// come from the solve and the aggregate from the term residuals.
pub fn explain_dict<S: AsRef<str>>(
    solution: &Solution,
    include: &[S],
    exclude: &[S],
) -> serde_json::Value {
    let structured = solution.atoms.iter().any(|a| a.field.is_some());

    let mut patterns = Vec::new();
    for atom in &solution.atoms {
        let (tp, fp) = if structured {
            (atom.tp, atom.fp)
        } else {
            (
                matcher::match_all_raw(include, &atom.text).count_ones(),
                matcher::match_all_raw(exclude, &atom.text).count_ones(),
            )
        };
        patterns.push(json!({
            "id": &atom.id,
            "text": &atom.text,
            "kind": atom.kind,
            "wildcards": atom.wildcards,
            "length": atom.length,
            "tp": tp,
            "fp": fp,
        }));
    }

    let (matched, fp_expr) = if structured {
        (
            solution.terms.iter().map(|t| t.incremental_tp).sum(),
            solution.terms.iter().map(|t| t.incremental_fp).sum(),
        )
    } else {
        let mut union_in = BitSet::new(include.len());
        let mut union_ex = BitSet::new(exclude.len());
        for term in &solution.terms {
            union_in.union_with(&matcher::match_all_raw(include, &term.raw_expr));
            union_ex.union_with(&matcher::match_all_raw(exclude, &term.raw_expr));
        }
        (union_in.count_ones(), union_ex.count_ones())
    };
    let (covered, fp, fn_count) = if solution.global_inverted {
        (
            include.len().saturating_sub(matched),
            exclude.len().saturating_sub(fp_expr),
            matched,
        )
    } else {
        (matched, fp_expr, include.len().saturating_sub(matched))
    };
    json!({
        "expr": &solution.expr,
        "global_inverted": solution.global_inverted,
        "term_method": solution.term_method,
        "metrics": {
            "covered": covered,
            "total_positive": include.len(),
            "fp": fp,
            "fn": fn_count,
        },
        "patterns": patterns,
        "witnesses": &solution.witnesses,
        "expressions": &solution.terms,
    })
}

/// Multi-line report: expression, coverage, the atom roster, and
/// witnesses when anything is off.
pub fn explain_text<S: AsRef<str>>(
    solution: &Solution,
    include: &[S],
    _exclude: &[S],
) -> String {
    let metrics = &solution.metrics;
    let total = if metrics.total_positive > 0 {
        metrics.total_positive
    } else {
        include.len()
    };
    let mut lines = vec![
        format!("EXPR: {}", solution.expr),
        format!("RAW:  {}", solution.raw_expr),
        format!(
            "COVERAGE: {}/{} include matched (FN={}), FP={}",
            metrics.covered, total, metrics.fn_count, metrics.fp
        ),
        "PATTERNS:".to_string(),
    ];
    for atom in &solution.atoms {
        lines.push(format!("  {}: {} ({})", atom.id, atom.text, atom.kind));
    }
    if metrics.fp > 0 || metrics.fn_count > 0 {
        lines.push("EXAMPLES:".to_string());
        let witnesses = &solution.witnesses;
        if !witnesses.tp_examples.is_empty() {
            lines.push(format!("  TP: {}", witnesses.tp_examples.join(", ")));
        }
        if !witnesses.fp_examples.is_empty() {
            lines.push(format!("  FP: {}", witnesses.fp_examples.join(", ")));
        }
        if !witnesses.fn_examples.is_empty() {
            lines.push(format!("  FN: {}", witnesses.fn_examples.join(", ")));
        }
    }
    lines.join("\n")
}

/// One line per term, largest residual contribution first. Subtractive
/// solutions label counts as removals.
pub fn explain_simple(solution: &Solution) -> String {
    let label = match solution.term_method {
        TermMethod::Subtractive => "removed",
        TermMethod::Additive => "matches",
    };
    let mut terms: Vec<_> = solution.terms.iter().collect();
    terms.sort_by(|a, b| b.incremental_tp.cmp(&a.incremental_tp));

    let structured = terms.iter().any(|t| t.fields.is_some());
    let mut lines = Vec::new();
    if structured {
        let mut order: Vec<&String> = Vec::new();
        for term in &terms {
            for map in [term.fields.as_ref(), term.not_fields.as_ref()].into_iter().flatten() {
                for name in map.keys() {
                    if !order.contains(&name) {
                        order.push(name);
                    }
                }
            }
        }
        order.sort();
        for term in &terms {
            let mut parts: Vec<String> = Vec::new();
            for name in &order {
                if let Some(pattern) = term.fields.as_ref().and_then(|m| m.get(*name)) {
                    if pattern != "*" {
                        parts.push(format!("{name}: {pattern}"));
                    }
                }
            }
            for name in &order {
                if let Some(pattern) = term.not_fields.as_ref().and_then(|m| m.get(*name)) {
                    if pattern != "*" {
                        parts.push(format!("- {name}: {pattern}"));
                    }
                }
            }
            let text = if parts.is_empty() {
                term.raw_expr.clone()
            } else {
                parts.join(" ")
            };
            lines.push(format!(
                "{text}  (# incremental {label}: {}, total {label}: {})",
                term.incremental_tp, term.tp
            ));
        }
    } else {
        for term in &terms {
            lines.push(format!(
                "{}  (# incremental {label}: {}, total {label}: {})",
                term.raw_expr, term.incremental_tp, term.tp
            ));
        }
    }
    lines.join("\n")
}

/// One-paragraph summary for quick inspection.
pub fn summarize_text(solution: &Solution) -> String {
    if solution.atoms.is_empty() {
        return "No patterns were selected for this dataset.".to_string();
    }
    let metrics = &solution.metrics;
    let primary = &solution.atoms[0];
    format!(
        "The selection covers {} of {} target items (FN={}) with {} false positives. \
         Primary coverage comes from {} with {} matches. \
         In total the formula uses {} patterns.",
        metrics.covered,
        metrics.total_positive,
        metrics.fn_count,
        metrics.fp,
        primary.text,
        primary.tp,
        solution.atoms.len()
    )
}

/// Heuristic attribution of atoms to fields by substring hits across the
/// include rows. Purely advisory; matching semantics are unaffected.
pub fn explain_by_field(
    solution: &Solution,
    include_rows: &[StructuredRow],
    field_order: Option<&[String]>,
) -> serde_json::Value {
    let names: Vec<String> = match field_order {
        Some(order) => order.to_vec(),
        None => include_rows
            .first()
            .map(|row| row.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default(),
    };
    let rows_fields: Vec<Vec<String>> = include_rows
        .iter()
        .map(|row| {
            names
                .iter()
                .map(|name| {
                    row.iter()
                        .find(|(field, _)| field == name)
                        .and_then(|(_, value)| value.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let mut hits: serde_json::Map<String, serde_json::Value> = names
        .iter()
        .map(|name| (name.clone(), json!([])))
        .collect();
    for atom in &solution.atoms {
        let tokens: Vec<&str> = atom.text.split('*').filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            continue;
        }
        let mut counts = vec![0usize; names.len()];
        for fields in &rows_fields {
            for (fi, value) in fields.iter().enumerate() {
                for token in &tokens {
                    if value.contains(token) {
                        counts[fi] += 1;
                    }
                }
            }
        }
        let Some(best) = counts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(i, _)| i)
        else {
            continue;
        };
        if let Some(serde_json::Value::Array(list)) = hits.get_mut(&names[best]) {
            list.push(serde_json::to_value(atom).expect("atom serialization cannot fail"));
        }
    }
    json!({ "by_field": hits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatternKind, QualityMode, SolveOptions};
    use crate::solver::{make_solution, AtomSpec};

    fn spec(text: &str) -> AtomSpec {
        AtomSpec {
            text: text.to_string(),
            kind: PatternKind::classify(text),
            field: None,
        }
    }

    fn complex_options() -> SolveOptions {
        SolveOptions {
            mode: QualityMode::Approx,
            allow_complex_expressions: true,
            ..SolveOptions::default()
        }
    }

    #[test]
    fn test_explain_dict_replays_conjunction_terms() {
        // The bare atoms' union would count P1's exclude hit; the
        // realized (P1 & P2) term does not.
        let include = ["alpha/cache/1"];
        let exclude = ["beta/cache/2"];
        let solution = make_solution(
            &include,
            &exclude,
            &[spec("*cache*"), spec("*alpha*")],
            &complex_options(),
            false,
        );
        assert_eq!(solution.terms[0].expr, "P1 & P2");
        assert_eq!(solution.metrics.fp, 0);

        let payload = explain_dict(&solution, &include, &exclude);
        assert_eq!(payload["metrics"]["fp"], 0);
        assert_eq!(payload["metrics"]["covered"], 1);
        assert_eq!(payload["metrics"]["fn"], 0);
        // Per-atom counts still report the bare pattern's exclude hit.
        assert_eq!(payload["patterns"][0]["fp"], 1);
    }

    #[test]
    fn test_explain_dict_replays_subtraction_terms() {
        // P2 matches an include row of its own; the bare union would
        // fold it into coverage even though P1 & !P2 drops it.
        let include = ["alpha/cache/1", "beta/only/2"];
        let exclude = ["beta/cache/9"];
        let solution = make_solution(
            &include,
            &exclude,
            &[spec("*cache*"), spec("*beta*")],
            &complex_options(),
            false,
        );
        assert_eq!(solution.terms[0].expr, "P1 & !P2");
        assert_eq!(solution.metrics.covered, 1);
        assert_eq!(solution.metrics.fp, 0);

        let payload = explain_dict(&solution, &include, &exclude);
        assert_eq!(payload["metrics"]["covered"], 1);
        assert_eq!(payload["metrics"]["fp"], 0);
        assert_eq!(payload["metrics"]["fn"], 1);
    }

    #[test]
    fn test_explain_dict_matches_stored_metrics_for_inverted() {
        let include = ["one"];
        let exclude = ["two", "three"];
        let solution = make_solution(
            &include,
            &exclude,
            &[spec("one")],
            &SolveOptions::default(),
            true,
        );
        let payload = explain_dict(&solution, &include, &exclude);
        assert_eq!(
            payload["metrics"]["covered"].as_u64().unwrap() as usize,
            solution.metrics.covered
        );
        assert_eq!(
            payload["metrics"]["fp"].as_u64().unwrap() as usize,
            solution.metrics.fp
        );
        assert_eq!(
            payload["metrics"]["fn"].as_u64().unwrap() as usize,
            solution.metrics.fn_count
        );
    }
}

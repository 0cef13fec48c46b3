//! Multi-field pattern discovery.
//!
//! Rows carry named fields; a term is a conjunction of per-field
//! patterns. Two strategies share the candidate and coverage machinery:
//! a pattern-centric greedy set-cover that scales to large corpora, and
//! a bounded per-row enumerator that squeezes out better conjunctions on
//! tiny ones. The dispatcher in `adaptive` picks between them.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::adaptive::{select_strategy, StrategyChoice, StrategyConfig};
use crate::bitset::BitSet;
use crate::matcher;
use crate::models::{
    Atom, PatternKind, SolveOptions, Solution, StructuredRow, Term,
};
use crate::solver::{finish_solution, realized_term, RealizedTerm};
use crate::tokens::{FieldTokenizer, SplitMethod};
use crate::Error;

/// Convert JSON rows to structured rows.
///
/// Objects map field names to values; arrays are positional and require
/// an explicit `fields` list. `null` becomes a don't-care value.
pub fn rows_from_json(
    values: &[serde_json::Value],
    fields: Option<&[String]>,
) -> Result<Vec<StructuredRow>, Error> {
    values
        .iter()
        .map(|value| match value {
            serde_json::Value::Object(map) => Ok(map
                .iter()
                .map(|(name, v)| (name.clone(), json_field_value(v)))
                .collect()),
            serde_json::Value::Array(items) => {
                let fields = fields.ok_or_else(|| {
                    Error::InputShape("positional rows require a fields list".to_string())
                })?;
                Ok(fields
                    .iter()
                    .enumerate()
                    .map(|(i, name)| (name.clone(), items.get(i).and_then(json_field_value_ref)))
                    .collect())
            }
            other => Err(Error::InputShape(format!(
                "row must be an object or array, got {other}"
            ))),
        })
        .collect()
}

fn json_field_value(value: &serde_json::Value) -> Option<String> {
    json_field_value_ref(value)
}

fn json_field_value_ref(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A row normalized against the field list: lowercased values, `None`
/// preserved only where it means don't-care.
struct NormRow {
    values: Vec<Option<String>>,
}

fn normalize_rows(
    rows: &[StructuredRow],
    fields: &[String],
    keep_dont_care: bool,
) -> Vec<NormRow> {
    rows.iter()
        .map(|row| NormRow {
            values: fields
                .iter()
                .map(|name| {
                    let value = row
                        .iter()
                        .find(|(field, _)| field == name)
                        .and_then(|(_, value)| value.as_ref());
                    match value {
                        Some(v) => Some(v.to_lowercase()),
                        None if keep_dont_care => None,
                        None => Some(String::new()),
                    }
                })
                .collect(),
        })
        .collect()
}

/// Does `pattern` accept this row's field? Don't-care values accept
/// every pattern.
fn field_matches(value: &Option<String>, pattern: &str) -> bool {
    match value {
        None => true,
        Some(v) => matcher::match_pattern(v, pattern),
    }
}

fn canonical(row: &StructuredRow) -> String {
    let parts: Vec<&str> = row
        .iter()
        .filter_map(|(_, value)| value.as_deref())
        .filter(|v| !v.is_empty())
        .collect();
    parts.join("/")
}

/// One selected conjunction prior to solution assembly.
struct SelectedTerm {
    fields: BTreeMap<String, String>,
    include_bits: BitSet,
    exclude_bits: BitSet,
}

/// Propose a solution over rows of named fields.
///
/// `fields` defaults to the first include row's field order. Exclude
/// rows may leave fields as `None` to mean don't-care. `max_fp` defaults
/// to zero for structured solves.
pub fn propose_solution_structured(
    include_rows: &[StructuredRow],
    exclude_rows: &[StructuredRow],
    fields: Option<&[String]>,
    options: &SolveOptions,
) -> Result<Solution, Error> {
    options.validate()?;
    let fields: Vec<String> = match fields {
        Some(fields) => fields.to_vec(),
        None => include_rows
            .first()
            .map(|row| row.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default(),
    };
    if include_rows.is_empty() || fields.is_empty() {
        return Ok(Solution::empty(include_rows.len(), options));
    }

    let include = normalize_rows(include_rows, &fields, false);
    let exclude = normalize_rows(exclude_rows, &fields, true);
    let tokenizers: BTreeMap<String, FieldTokenizer> = fields
        .iter()
        .map(|name| {
            (
                name.clone(),
                FieldTokenizer {
                    method: options
                        .splitmethod
                        .resolve(Some(name), SplitMethod::ClassChange),
                    min_token_len: options.min_token_len.resolve(Some(name), 3),
                },
            )
        })
        .collect();

    let max_fp = options.effective_max_fp(include.len()).unwrap_or(0);
    let (choice, config) = select_strategy(include.len(), fields.len(), options.effort);
    debug!(
        rows = include.len(),
        fields = fields.len(),
        strategy = ?choice,
        "dispatching structured solve"
    );

    let selected = match choice {
        StrategyChoice::Scalable => {
            solve_scalable(&include, &exclude, &fields, &tokenizers, options, &config, max_fp)
        }
        StrategyChoice::Bounded => {
            solve_bounded(&include, &exclude, &fields, &tokenizers, options, &config, max_fp)
        }
    };

    Ok(assemble(
        include_rows,
        exclude_rows,
        &include,
        &exclude,
        &fields,
        selected,
        options,
    ))
}

// ---------------------------------------------------------------------
// Scalable strategy: pattern-centric greedy set-cover.

/// Candidate patterns for one field value.
fn value_patterns(value: &str, tokenizer: &FieldTokenizer) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |pattern: String| {
        if !out.contains(&pattern) {
            out.push(pattern);
        }
    };
    push(value.to_string());
    let tokens = tokenizer.tokenize(value);
    for token in tokens.iter().take(5) {
        push(format!("*{}*", token.text));
    }
    if let Some(first) = tokens.first() {
        push(format!("{}*", first.text));
    }
    if let Some(last) = tokens.last() {
        push(format!("*{}", last.text));
    }
    if tokens.len() >= 2 {
        push(format!(
            "*{}*{}*",
            tokens[0].text,
            tokens[tokens.len() - 1].text
        ));
    }
    out
}

struct FieldPattern {
    field_idx: usize,
    pattern: String,
    include_bits: BitSet,
    exclude_bits: BitSet,
    coverage: usize,
}

fn field_pattern_stats(
    include: &[NormRow],
    exclude: &[NormRow],
    fields: &[String],
    tokenizers: &BTreeMap<String, FieldTokenizer>,
    options: &SolveOptions,
    cap: usize,
) -> Vec<FieldPattern> {
    let mut stats = Vec::new();
    for (field_idx, field) in fields.iter().enumerate() {
        let tokenizer = &tokenizers[field];
        // Rank candidate patterns by how many rows propose them.
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in include {
            let Some(value) = row.values[field_idx].as_deref() else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            for pattern in value_patterns(value, tokenizer) {
                if !options.kind_allowed(PatternKind::classify(&pattern), Some(field)) {
                    continue;
                }
                *counts.entry(pattern).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (pattern, _) in ranked.into_iter().take(cap) {
            let mut include_bits = BitSet::new(include.len());
            for (idx, row) in include.iter().enumerate() {
                if field_matches(&row.values[field_idx], &pattern) {
                    include_bits.insert(idx);
                }
            }
            let coverage = include_bits.count_ones();
            if coverage == 0 {
                continue;
            }
            let mut exclude_bits = BitSet::new(exclude.len());
            for (idx, row) in exclude.iter().enumerate() {
                if field_matches(&row.values[field_idx], &pattern) {
                    exclude_bits.insert(idx);
                }
            }
            stats.push(FieldPattern {
                field_idx,
                pattern,
                include_bits,
                exclude_bits,
                coverage,
            });
        }
    }
    stats
}

fn solve_scalable(
    include: &[NormRow],
    exclude: &[NormRow],
    fields: &[String],
    tokenizers: &BTreeMap<String, FieldTokenizer>,
    options: &SolveOptions,
    config: &StrategyConfig,
    max_fp: usize,
) -> Vec<SelectedTerm> {
    let stats = field_pattern_stats(
        include,
        exclude,
        fields,
        tokenizers,
        options,
        config.max_patterns_per_field,
    );
    debug!(patterns = stats.len(), "scalable field-pattern pool ready");

    let mut selected: Vec<SelectedTerm> = Vec::new();
    let mut covered = BitSet::new(include.len());
    let mut fp_mask = BitSet::new(exclude.len());

    while covered.count_ones() < include.len() {
        let single = pick_single_field(&stats, fields, &covered, &fp_mask, options, max_fp);
        let pick = match single {
            Some(pick) => Some(pick),
            None if config.enable_multi_field => {
                pick_field_pair(&stats, fields, &covered, &fp_mask, max_fp)
            }
            None => None,
        };
        let Some(term) = pick else { break };
        covered.union_with(&term.include_bits);
        fp_mask.union_with(&term.exclude_bits);
        debug!(
            covered = covered.count_ones(),
            fp = fp_mask.count_ones(),
            "selected structured term"
        );
        selected.push(term);
    }
    selected
}

/// Best single-field atom by maximal uncovered gain under the FP budget.
fn pick_single_field(
    stats: &[FieldPattern],
    fields: &[String],
    covered: &BitSet,
    fp_mask: &BitSet,
    options: &SolveOptions,
    max_fp: usize,
) -> Option<SelectedTerm> {
    struct Pick<'a> {
        stat: &'a FieldPattern,
        new_coverage: usize,
        tie_score: f64,
    }
    let mut best: Option<Pick> = None;
    for stat in stats {
        let new_coverage = stat.include_bits.and_not(covered).count_ones();
        if new_coverage == 0 {
            continue;
        }
        let new_fp = fp_mask.union_count(&stat.exclude_bits);
        if new_fp > max_fp {
            continue;
        }
        let weight = options
            .weights
            .field_weight(Some(fields[stat.field_idx].as_str()));
        let tie_score = new_coverage as f64 * weight - 10.0 * new_fp as f64;
        let better = match &best {
            None => true,
            Some(current) => {
                if new_coverage != current.new_coverage {
                    new_coverage > current.new_coverage
                } else if tie_score != current.tie_score {
                    tie_score > current.tie_score
                } else {
                    (
                        &fields[stat.field_idx],
                        &stat.pattern,
                    ) < (
                        &fields[current.stat.field_idx],
                        &current.stat.pattern,
                    )
                }
            }
        };
        if better {
            best = Some(Pick {
                stat,
                new_coverage,
                tie_score,
            });
        }
    }
    best.map(|pick| SelectedTerm {
        fields: BTreeMap::from([(
            fields[pick.stat.field_idx].clone(),
            pick.stat.pattern.clone(),
        )]),
        include_bits: pick.stat.include_bits.clone(),
        exclude_bits: pick.stat.exclude_bits.clone(),
    })
}

/// Two-field conjunctions, tried only once no single field can add
/// coverage within the budget. The per-field pool is capped by coverage
/// so the pair scan stays quadratic in a small constant.
fn pick_field_pair(
    stats: &[FieldPattern],
    fields: &[String],
    covered: &BitSet,
    fp_mask: &BitSet,
    max_fp: usize,
) -> Option<SelectedTerm> {
    const PAIR_POOL_PER_FIELD: usize = 40;

    let mut by_field: BTreeMap<usize, Vec<&FieldPattern>> = BTreeMap::new();
    for stat in stats {
        by_field.entry(stat.field_idx).or_default().push(stat);
    }
    for pool in by_field.values_mut() {
        pool.sort_by(|a, b| b.coverage.cmp(&a.coverage).then_with(|| a.pattern.cmp(&b.pattern)));
        pool.truncate(PAIR_POOL_PER_FIELD);
    }

    struct Pick<'a> {
        left: &'a FieldPattern,
        right: &'a FieldPattern,
        include_bits: BitSet,
        exclude_bits: BitSet,
        new_coverage: usize,
        new_fp: usize,
        length: usize,
    }
    let mut best: Option<Pick> = None;
    let field_indexes: Vec<usize> = by_field.keys().copied().collect();
    for (a, &fi) in field_indexes.iter().enumerate() {
        for &fj in &field_indexes[a + 1..] {
            for left in by_field[&fi].iter().copied() {
                for right in by_field[&fj].iter().copied() {
                    let include_bits = left.include_bits.intersect(&right.include_bits);
                    let new_coverage = include_bits.and_not(covered).count_ones();
                    if new_coverage == 0 {
                        continue;
                    }
                    let exclude_bits = left.exclude_bits.intersect(&right.exclude_bits);
                    let new_fp = fp_mask.union_count(&exclude_bits);
                    if new_fp > max_fp {
                        continue;
                    }
                    let length = matcher::literal_len(&left.pattern)
                        + matcher::literal_len(&right.pattern);
                    let better = match &best {
                        None => true,
                        Some(current) => {
                            if new_coverage != current.new_coverage {
                                new_coverage > current.new_coverage
                            } else if new_fp != current.new_fp {
                                new_fp < current.new_fp
                            } else if length != current.length {
                                length > current.length
                            } else {
                                (
                                    &fields[left.field_idx],
                                    &left.pattern,
                                    &fields[right.field_idx],
                                    &right.pattern,
                                ) < (
                                    &fields[current.left.field_idx],
                                    &current.left.pattern,
                                    &fields[current.right.field_idx],
                                    &current.right.pattern,
                                )
                            }
                        }
                    };
                    if better {
                        best = Some(Pick {
                            left,
                            right,
                            include_bits,
                            exclude_bits,
                            new_coverage,
                            new_fp,
                            length,
                        });
                    }
                }
            }
        }
    }
    best.map(|pick| SelectedTerm {
        fields: BTreeMap::from([
            (
                fields[pick.left.field_idx].clone(),
                pick.left.pattern.clone(),
            ),
            (
                fields[pick.right.field_idx].clone(),
                pick.right.pattern.clone(),
            ),
        ]),
        include_bits: pick.include_bits,
        exclude_bits: pick.exclude_bits,
    })
}

// ---------------------------------------------------------------------
// Bounded strategy: per-row term enumeration.

/// Richer per-value pattern list used by the enumerator.
fn row_value_patterns(value: &str, tokenizer: &FieldTokenizer) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |pattern: String| {
        if !out.contains(&pattern) {
            out.push(pattern);
        }
    };
    push(value.to_string());
    let tokens = tokenizer.tokenize(value);
    for token in &tokens {
        push(format!("*{}*", token.text));
    }
    if let Some(first) = tokens.first() {
        push(format!("{}*", first.text));
    }
    if let Some(last) = tokens.last() {
        push(format!("*{}", last.text));
    }
    for i in 0..tokens.len() {
        for j in (i + 1)..tokens.len().min(i + 3) {
            let window: Vec<&str> = tokens[i..=j].iter().map(|t| t.text.as_str()).collect();
            push(format!("*{}*", window.join("*")));
        }
    }
    out
}

struct BoundedTerm {
    fields: BTreeMap<usize, String>,
    include_bits: BitSet,
    exclude_bits: BitSet,
    score: f64,
}

/// Specificity score: field-weighted pattern lengths with bonuses for
/// anchoring, hierarchical depth, and multi-field conjunctions.
fn term_score(
    fields: &BTreeMap<usize, String>,
    field_names: &[String],
    options: &SolveOptions,
) -> f64 {
    let mut score = 0.0;
    for (field_idx, pattern) in fields {
        let mut pattern_score = pattern.chars().count() as f64;
        match matcher::wildcard_count(pattern) {
            0 => pattern_score *= 2.0,
            1 => pattern_score *= 1.5,
            _ => {}
        }
        let components = pattern.matches('/').count() + 1;
        if components > 1 {
            pattern_score *= 1.0 + 0.2 * (components - 1) as f64;
        }
        pattern_score *= options
            .weights
            .field_weight(Some(field_names[*field_idx].as_str()));
        score += pattern_score;
    }
    if fields.len() > 1 {
        score *= 1.0 + 0.3 * (fields.len() - 1) as f64;
    }
    score
}

fn term_masks(
    fields: &BTreeMap<usize, String>,
    include: &[NormRow],
    exclude: &[NormRow],
) -> (BitSet, BitSet) {
    let mut include_bits = BitSet::new(include.len());
    for (idx, row) in include.iter().enumerate() {
        if fields
            .iter()
            .all(|(fi, pattern)| field_matches(&row.values[*fi], pattern))
        {
            include_bits.insert(idx);
        }
    }
    let mut exclude_bits = BitSet::new(exclude.len());
    for (idx, row) in exclude.iter().enumerate() {
        if fields
            .iter()
            .all(|(fi, pattern)| field_matches(&row.values[*fi], pattern))
        {
            exclude_bits.insert(idx);
        }
    }
    (include_bits, exclude_bits)
}

fn solve_bounded(
    include: &[NormRow],
    exclude: &[NormRow],
    fields: &[String],
    tokenizers: &BTreeMap<String, FieldTokenizer>,
    options: &SolveOptions,
    config: &StrategyConfig,
    max_fp: usize,
) -> Vec<SelectedTerm> {
    let per_row_cap = config
        .max_expressions_per_row
        .min(config.max_total_expressions / include.len().max(1))
        .max(1);

    let mut combos: Vec<BTreeMap<usize, String>> = Vec::new();
    let mut seen: BTreeSet<Vec<(usize, String)>> = BTreeSet::new();
    'rows: for row in include {
        let per_field: Vec<Vec<String>> = fields
            .iter()
            .enumerate()
            .map(|(fi, name)| match row.values[fi].as_deref() {
                Some(value) if !value.is_empty() => row_value_patterns(value, &tokenizers[name])
                    .into_iter()
                    .filter(|p| options.kind_allowed(PatternKind::classify(p), Some(name)))
                    .collect(),
                _ => Vec::new(),
            })
            .collect();

        let mut row_combos: Vec<BTreeMap<usize, String>> = Vec::new();
        for (fi, patterns) in per_field.iter().enumerate() {
            for pattern in patterns.iter().take(5) {
                row_combos.push(BTreeMap::from([(fi, pattern.clone())]));
            }
        }
        for fi in 0..fields.len() {
            for fj in (fi + 1)..fields.len() {
                for left in per_field[fi].iter().take(3) {
                    for right in per_field[fj].iter().take(3) {
                        row_combos.push(BTreeMap::from([
                            (fi, left.clone()),
                            (fj, right.clone()),
                        ]));
                    }
                }
            }
        }
        if fields.len() == 3 {
            for a in per_field[0].iter().take(2) {
                for b in per_field[1].iter().take(2) {
                    for c in per_field[2].iter().take(2) {
                        row_combos.push(BTreeMap::from([
                            (0, a.clone()),
                            (1, b.clone()),
                            (2, c.clone()),
                        ]));
                    }
                }
            }
        }

        for combo in row_combos.into_iter().take(per_row_cap) {
            let key: Vec<(usize, String)> =
                combo.iter().map(|(k, v)| (*k, v.clone())).collect();
            if seen.insert(key) {
                combos.push(combo);
            }
            if combos.len() >= config.max_total_expressions {
                break 'rows;
            }
        }
    }

    let mut terms: Vec<BoundedTerm> = combos
        .into_iter()
        .map(|combo| {
            let (include_bits, exclude_bits) = term_masks(&combo, include, exclude);
            let score = term_score(&combo, fields, options);
            BoundedTerm {
                fields: combo,
                include_bits,
                exclude_bits,
                score,
            }
        })
        .collect();
    terms.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| {
                b.include_bits
                    .count_ones()
                    .cmp(&a.include_bits.count_ones())
            })
            .then_with(|| a.fields.cmp(&b.fields))
    });
    debug!(terms = terms.len(), "bounded term pool ready");

    let mut selected: Vec<SelectedTerm> = Vec::new();
    let mut covered = BitSet::new(include.len());
    let mut fp_mask = BitSet::new(exclude.len());
    let mut used = vec![false; terms.len()];
    while covered.count_ones() < include.len() {
        let mut best: Option<(usize, usize, f64)> = None;
        for (idx, term) in terms.iter().enumerate() {
            if used[idx] {
                continue;
            }
            let new_coverage = term.include_bits.and_not(&covered).count_ones();
            if new_coverage == 0 {
                continue;
            }
            if fp_mask.union_count(&term.exclude_bits) > max_fp {
                continue;
            }
            let better = match &best {
                None => true,
                Some((_, best_cov, best_score)) => {
                    new_coverage > *best_cov
                        || (new_coverage == *best_cov && term.score > *best_score)
                }
            };
            if better {
                best = Some((idx, new_coverage, term.score));
            }
        }
        let Some((idx, _, _)) = best else { break };
        used[idx] = true;
        covered.union_with(&terms[idx].include_bits);
        fp_mask.union_with(&terms[idx].exclude_bits);
        let term = &terms[idx];
        selected.push(SelectedTerm {
            fields: term
                .fields
                .iter()
                .map(|(fi, pattern)| (fields[*fi].clone(), pattern.clone()))
                .collect(),
            include_bits: term.include_bits.clone(),
            exclude_bits: term.exclude_bits.clone(),
        });
    }
    selected
}

// ---------------------------------------------------------------------
// Solution assembly.

fn assemble(
    include_rows: &[StructuredRow],
    exclude_rows: &[StructuredRow],
    include: &[NormRow],
    exclude: &[NormRow],
    fields: &[String],
    selected: Vec<SelectedTerm>,
    options: &SolveOptions,
) -> Solution {
    let include_canon: Vec<String> = include_rows.iter().map(canonical).collect();
    let exclude_canon: Vec<String> = exclude_rows.iter().map(canonical).collect();

    let mut atoms: Vec<Atom> = Vec::new();
    let mut terms: Vec<RealizedTerm> = Vec::new();
    for term in &selected {
        let mut atom_ids: Vec<String> = Vec::new();
        for (field, pattern) in &term.fields {
            let id = format!("P{}", atoms.len() + 1);
            atom_ids.push(id.clone());
            let (tp, fp) = atom_counts(field, pattern, fields, include, exclude);
            atoms.push(Atom {
                id,
                text: pattern.clone(),
                kind: PatternKind::classify(pattern),
                wildcards: matcher::wildcard_count(pattern),
                length: matcher::literal_len(pattern),
                field: Some(field.clone()),
                negated: false,
                tp,
                fp,
            });
        }
        let expr = atom_ids.join(" & ");
        let joined = term
            .fields
            .iter()
            .map(|(field, pattern)| format!("({field}: {pattern})"))
            .collect::<Vec<_>>()
            .join(" & ");
        let raw_expr = if term.fields.len() > 1 {
            format!("({joined})")
        } else {
            joined
        };
        let tp = term.include_bits.count_ones();
        let term_value = Term {
            expr,
            raw_expr,
            fields: Some(term.fields.clone()),
            not_fields: None,
            tp,
            fp: term.exclude_bits.count_ones(),
            fn_count: include.len() - tp,
            incremental_tp: 0,
            incremental_fp: 0,
            length: term
                .fields
                .values()
                .map(|p| matcher::literal_len(p))
                .sum(),
            include_examples: term
                .include_bits
                .iter_ones()
                .take(3)
                .map(|i| include_canon[i].clone())
                .collect(),
            exclude_examples: term
                .exclude_bits
                .iter_ones()
                .take(3)
                .map(|i| exclude_canon[i].clone())
                .collect(),
        };
        terms.push(realized_term(
            term_value,
            term.include_bits.clone(),
            term.exclude_bits.clone(),
        ));
    }

    finish_solution(&include_canon, &exclude_canon, atoms, terms, options, false)
}

/// Per-atom counts against the atom's own field values, honoring
/// don't-care rows.
fn atom_counts(
    field: &str,
    pattern: &str,
    fields: &[String],
    include: &[NormRow],
    exclude: &[NormRow],
) -> (usize, usize) {
    let Some(field_idx) = fields.iter().position(|name| name == field) else {
        return (0, 0);
    };
    let tp = include
        .iter()
        .filter(|row| field_matches(&row.values[field_idx], pattern))
        .count();
    let fp = exclude
        .iter()
        .filter(|row| field_matches(&row.values[field_idx], pattern))
        .count();
    (tp, fp)
}

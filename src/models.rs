//! Data model shared across the engine.
//!
//! `Candidate` is the unit of combinatorial choice and lives only for the
//! duration of a solve; `Atom`, `Term`, and `Solution` are the retained
//! result and serialize to the stable JSON shape consumed by the CLI and
//! by downstream tooling.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::adaptive::Effort;
use crate::bitset::BitSet;
use crate::tokens::SplitMethod;
use crate::Error;

/// One structured row: ordered `(field, value)` pairs. A `None` value in
/// an exclude row means "don't care" for that field.
pub type StructuredRow = Vec<(String, Option<String>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityMode {
    #[default]
    #[serde(rename = "EXACT")]
    Exact,
    #[serde(rename = "APPROX")]
    Approx,
}

impl FromStr for QualityMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value.to_ascii_uppercase().as_str() {
            "EXACT" => Ok(QualityMode::Exact),
            "APPROX" => Ok(QualityMode::Approx),
            other => Err(Error::InvalidOption(format!(
                "unknown mode '{other}' (expected EXACT or APPROX)"
            ))),
        }
    }
}

impl fmt::Display for QualityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityMode::Exact => write!(f, "EXACT"),
            QualityMode::Approx => write!(f, "APPROX"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvertStrategy {
    Never,
    #[default]
    Auto,
    Always,
}

impl FromStr for InvertStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value.to_ascii_lowercase().as_str() {
            "never" => Ok(InvertStrategy::Never),
            "auto" => Ok(InvertStrategy::Auto),
            "always" => Ok(InvertStrategy::Always),
            other => Err(Error::InvalidOption(format!(
                "unknown invert strategy '{other}' (expected never, auto, or always)"
            ))),
        }
    }
}

impl fmt::Display for InvertStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvertStrategy::Never => write!(f, "never"),
            InvertStrategy::Auto => write!(f, "auto"),
            InvertStrategy::Always => write!(f, "always"),
        }
    }
}

/// How a solution is to be read: a union of matches, or everything
/// except the union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermMethod {
    #[default]
    Additive,
    Subtractive,
}

/// Shape taxonomy of wildcard patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Exact,
    Substring,
    Prefix,
    Suffix,
    Multi,
}

impl PatternKind {
    /// Infer the kind from a pattern's shape.
    pub fn classify(pattern: &str) -> PatternKind {
        let wildcards = pattern.matches('*').count();
        if wildcards == 0 {
            PatternKind::Exact
        } else if pattern.starts_with('*') && pattern.ends_with('*') {
            if wildcards == 2 {
                PatternKind::Substring
            } else {
                PatternKind::Multi
            }
        } else if pattern.starts_with('*') {
            PatternKind::Suffix
        } else if pattern.ends_with('*') {
            PatternKind::Prefix
        } else {
            PatternKind::Multi
        }
    }
}

impl FromStr for PatternKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "exact" => Ok(PatternKind::Exact),
            "substring" => Ok(PatternKind::Substring),
            "prefix" => Ok(PatternKind::Prefix),
            "suffix" => Ok(PatternKind::Suffix),
            "multi" => Ok(PatternKind::Multi),
            other => Err(Error::InvalidOption(format!(
                "unknown pattern kind '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Exact => write!(f, "exact"),
            PatternKind::Substring => write!(f, "substring"),
            PatternKind::Prefix => write!(f, "prefix"),
            PatternKind::Suffix => write!(f, "suffix"),
            PatternKind::Multi => write!(f, "multi"),
        }
    }
}

/// A knob that is either one value for every field or a per-field map.
/// Missing fields fall back to the supplied default.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PerField<T: Clone> {
    Scalar(T),
    ByField(BTreeMap<String, T>),
}

impl<T: Clone> PerField<T> {
    pub fn resolve(&self, field: Option<&str>, default: T) -> T {
        match self {
            PerField::Scalar(value) => value.clone(),
            PerField::ByField(map) => field
                .and_then(|name| map.get(name).cloned())
                .unwrap_or(default),
        }
    }
}

impl<T: Clone + Default> Default for PerField<T> {
    fn default() -> Self {
        PerField::Scalar(T::default())
    }
}

/// A hard budget: an absolute count, or a fraction of the include size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Limit {
    Count(usize),
    Fraction(f64),
}

impl Limit {
    pub fn resolve(&self, num_rows: usize) -> usize {
        match self {
            Limit::Count(count) => *count,
            Limit::Fraction(fraction) => (fraction * num_rows as f64) as usize,
        }
    }

    pub fn validate(&self, name: &str) -> Result<(), Error> {
        if let Limit::Fraction(fraction) = self {
            if !(fraction.is_finite() && *fraction > 0.0 && *fraction < 1.0) {
                return Err(Error::InvalidOption(format!(
                    "{name} fraction must lie in (0, 1), got {fraction}"
                )));
            }
        }
        Ok(())
    }
}

/// Cost-function weights. Each may be per-field; `w_field` multiplies
/// candidate scores during generation.
#[derive(Debug, Clone, Serialize)]
pub struct Weights {
    pub w_fp: PerField<f64>,
    pub w_fn: PerField<f64>,
    pub w_atom: PerField<f64>,
    pub w_op: PerField<f64>,
    pub w_wc: PerField<f64>,
    pub w_len: PerField<f64>,
    pub w_field: BTreeMap<String, f64>,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            w_fp: PerField::Scalar(1.0),
            w_fn: PerField::Scalar(1.0),
            w_atom: PerField::Scalar(0.05),
            w_op: PerField::Scalar(0.02),
            w_wc: PerField::Scalar(0.01),
            w_len: PerField::Scalar(0.001),
            w_field: BTreeMap::new(),
        }
    }
}

impl Weights {
    pub fn field_weight(&self, field: Option<&str>) -> f64 {
        field
            .and_then(|name| self.w_field.get(name).copied())
            .unwrap_or(1.0)
    }

    fn validate_one(weight: &PerField<f64>, name: &str) -> Result<(), Error> {
        let finite = match weight {
            PerField::Scalar(value) => value.is_finite(),
            PerField::ByField(map) => map.values().all(|v| v.is_finite()),
        };
        if finite {
            Ok(())
        } else {
            Err(Error::InvalidOption(format!("{name} must be finite")))
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        Weights::validate_one(&self.w_fp, "w_fp")?;
        Weights::validate_one(&self.w_fn, "w_fn")?;
        Weights::validate_one(&self.w_atom, "w_atom")?;
        Weights::validate_one(&self.w_op, "w_op")?;
        Weights::validate_one(&self.w_wc, "w_wc")?;
        Weights::validate_one(&self.w_len, "w_len")?;
        if self.w_field.values().any(|v| !v.is_finite()) {
            return Err(Error::InvalidOption("w_field must be finite".to_string()));
        }
        Ok(())
    }
}

/// Hard budgets honored by the greedy loop.
#[derive(Debug, Clone, Serialize)]
pub struct Budgets {
    pub max_candidates: usize,
    pub max_patterns: Option<Limit>,
    pub max_fp: Option<Limit>,
    pub max_fn: Option<Limit>,
}

impl Default for Budgets {
    fn default() -> Self {
        Budgets {
            max_candidates: 4000,
            max_patterns: None,
            max_fp: None,
            max_fn: None,
        }
    }
}

impl Budgets {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(limit) = &self.max_patterns {
            limit.validate("max_patterns")?;
        }
        if let Some(limit) = &self.max_fp {
            limit.validate("max_fp")?;
        }
        if let Some(limit) = &self.max_fn {
            limit.validate("max_fn")?;
        }
        Ok(())
    }
}

/// Restriction on which pattern kinds the generator may emit.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AllowedPatterns {
    Global(BTreeSet<PatternKind>),
    ByField(BTreeMap<String, BTreeSet<PatternKind>>),
}

impl AllowedPatterns {
    pub fn allows(&self, kind: PatternKind, field: Option<&str>) -> bool {
        match self {
            AllowedPatterns::Global(kinds) => kinds.contains(&kind),
            AllowedPatterns::ByField(map) => match field.and_then(|name| map.get(name)) {
                Some(kinds) => kinds.contains(&kind),
                None => true,
            },
        }
    }
}

/// Full knob set for one solve. Copied into the solution as a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SolveOptions {
    pub mode: QualityMode,
    pub effort: Effort,
    pub invert: InvertStrategy,
    pub weights: Weights,
    pub budgets: Budgets,
    pub splitmethod: PerField<SplitMethod>,
    pub min_token_len: PerField<usize>,
    pub per_word_substrings: usize,
    pub max_multi_segments: usize,
    pub allowed_patterns: Option<AllowedPatterns>,
    pub allow_complex_expressions: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            mode: QualityMode::Exact,
            effort: Effort::Medium,
            invert: InvertStrategy::Auto,
            weights: Weights::default(),
            budgets: Budgets::default(),
            splitmethod: PerField::Scalar(SplitMethod::ClassChange),
            min_token_len: PerField::Scalar(3),
            per_word_substrings: 16,
            max_multi_segments: 3,
            allowed_patterns: None,
            allow_complex_expressions: false,
        }
    }
}

impl SolveOptions {
    pub fn validate(&self) -> Result<(), Error> {
        self.weights.validate()?;
        self.budgets.validate()?;
        let min_len = self.min_token_len.resolve(None, 3);
        if min_len == 0 {
            return Err(Error::InvalidOption(
                "min_token_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Is a pattern of this kind allowed for this field?
    pub fn kind_allowed(&self, kind: PatternKind, field: Option<&str>) -> bool {
        match &self.allowed_patterns {
            Some(allowed) => allowed.allows(kind, field),
            None => true,
        }
    }

    /// EXACT mode forces `max_fp = 0` when the caller left it unset.
    pub fn effective_max_fp(&self, num_include: usize) -> Option<usize> {
        match &self.budgets.max_fp {
            Some(limit) => Some(limit.resolve(num_include)),
            None if self.mode == QualityMode::Exact => Some(0),
            None => None,
        }
    }

    /// The option snapshot embedded in every solution.
    pub fn snapshot(&self) -> serde_json::Value {
        json!({
            "mode": self.mode,
            "effort": self.effort,
            "invert": self.invert,
            "splitmethod": self.splitmethod,
            "min_token_len": self.min_token_len,
            "per_word_substrings": self.per_word_substrings,
            "max_multi_segments": self.max_multi_segments,
            "allow_complex_expressions": self.allow_complex_expressions,
        })
    }
}

/// A candidate pattern under consideration. Created once per solve and
/// dropped when the solver returns.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub text: String,
    pub kind: PatternKind,
    pub score: f64,
    pub include_bits: BitSet,
    pub exclude_bits: BitSet,
    pub wildcards: usize,
    pub length: usize,
    pub field: Option<String>,
}

/// A pattern retained in the solution, addressed by its stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    pub id: String,
    pub text: String,
    pub kind: PatternKind,
    pub wildcards: usize,
    pub length: usize,
    pub field: Option<String>,
    pub negated: bool,
    pub tp: usize,
    pub fp: usize,
}

/// One disjunct of the final expression: a conjunction of atoms with its
/// coverage and its residual contribution under greedy order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub expr: String,
    pub raw_expr: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fields: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub not_fields: Option<BTreeMap<String, String>>,
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_count: usize,
    pub incremental_tp: usize,
    pub incremental_fp: usize,
    pub length: usize,
    pub include_examples: Vec<String>,
    pub exclude_examples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub covered: usize,
    pub total_positive: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_count: usize,
    pub patterns: usize,
    pub boolean_ops: usize,
    pub wildcards: usize,
    pub pattern_chars: usize,
}

/// Up to three literal examples per category backing the metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witnesses {
    pub tp_examples: Vec<String>,
    pub fp_examples: Vec<String>,
    pub fn_examples: Vec<String>,
}

/// The full result of a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub expr: String,
    pub raw_expr: String,
    pub global_inverted: bool,
    pub term_method: TermMethod,
    pub mode: QualityMode,
    pub options: serde_json::Value,
    #[serde(rename = "patterns")]
    pub atoms: Vec<Atom>,
    pub metrics: Metrics,
    pub witnesses: Witnesses,
    #[serde(rename = "expressions")]
    pub terms: Vec<Term>,
}

impl Solution {
    /// The well-formed empty solution: no atoms, `expr == "FALSE"`,
    /// metrics zeroed except the include total. Never a bare `*`.
    pub fn empty(num_include: usize, options: &SolveOptions) -> Solution {
        Solution {
            expr: "FALSE".to_string(),
            raw_expr: "FALSE".to_string(),
            global_inverted: false,
            term_method: TermMethod::Additive,
            mode: options.mode,
            options: options.snapshot(),
            atoms: Vec::new(),
            metrics: Metrics {
                covered: 0,
                total_positive: num_include,
                fp: 0,
                fn_count: num_include,
                patterns: 0,
                boolean_ops: 0,
                wildcards: 0,
                pattern_chars: 0,
            },
            witnesses: Witnesses::default(),
            terms: Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("solution serialization cannot fail")
    }
}

//! # patternforge
//!
//! Discover a compact boolean expression over glob-style wildcard
//! patterns that covers a target set of strings while matching none (or
//! a bounded number) of a contrast set.
//!
//! ## Features
//!
//! - Shell-style `*` wildcards only - readable by humans, no regex
//! - EXACT mode guarantees zero false positives or an empty solution
//! - Greedy set-cover with refinement and per-atom honing passes
//! - Structured (multi-field) rows with per-field patterns
//! - Deterministic: identical inputs produce identical solutions
//!
//! ## Example
//!
//! ```
//! use patternforge::{propose_solution, SolveOptions};
//!
//! # fn main() -> Result<(), patternforge::Error> {
//! let include = ["alpha/m1", "alpha/m2", "alpha/m3"];
//! let exclude = ["beta/m1"];
//! let solution = propose_solution(&include, &exclude, &SolveOptions::default())?;
//!
//! assert_eq!(solution.metrics.fp, 0);
//! assert_eq!(solution.metrics.covered, 3);
//! assert_eq!(solution.raw_expr, "alpha/*");
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! Tokenization ([`tokens`]) feeds candidate generation
//! ([`candidates`]); coverage is tracked as bitsets ([`bitset`]); the
//! greedy selector ([`solver`]) honors hard FP/FN/pattern budgets;
//! refinement and expansion tighten the result; the structured solver
//! ([`structured`]) lifts everything to rows of named fields; and the
//! evaluator ([`evaluator`]) recomputes metrics for arbitrary boolean
//! expressions over the chosen atoms.

use rayon::prelude::*;

pub mod adaptive;
pub mod bitset;
pub mod candidates;
pub mod evaluator;
pub mod expansion;
pub mod explain;
pub mod io;
pub mod matcher;
pub mod models;
pub mod refinement;
pub mod solver;
pub mod structured;
pub mod tokens;

pub use adaptive::Effort;
pub use evaluator::{evaluate_expr, ExprMetrics, ParseError};
pub use models::{
    AllowedPatterns, Atom, Budgets, InvertStrategy, Limit, Metrics, PatternKind, PerField,
    QualityMode, Solution, SolveOptions, StructuredRow, Term, TermMethod, Weights, Witnesses,
};
pub use solver::propose_solution;
pub use structured::{propose_solution_structured, rows_from_json};
pub use tokens::SplitMethod;

/// One independent include/exclude dataset for [`propose_batch`].
#[derive(Debug, Clone, Default)]
pub struct SolveRequest {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Solve several independent datasets in parallel.
///
/// Each call owns its candidate pool and selection state; the solver
/// itself stays single-threaded and deterministic, so the output order
/// matches the input order regardless of scheduling.
pub fn propose_batch(
    requests: &[SolveRequest],
    options: &SolveOptions,
) -> Result<Vec<Solution>, Error> {
    requests
        .par_iter()
        .map(|request| propose_solution(&request.include, &request.exclude, options))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An option value is outside its declared domain.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Rows are neither mappings nor tuples, or a required field list is
    /// missing.
    #[error("invalid input shape: {0}")]
    InputShape(String),

    /// The expression evaluator rejected its input.
    #[error("expression parse error: {0}")]
    Parse(#[from] ParseError),

    /// Filesystem failure in the wrapper tooling; never from the core.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

//! Strategy dispatch for the structured solver.
//!
//! The bounded per-row enumerator gives the best terms on tiny datasets
//! but explodes combinatorially; the pattern-centric scalable set-cover
//! handles everything else. Dispatch is by dataset shape and the caller's
//! effort level.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    #[default]
    Medium,
    High,
    Exhaustive,
}

impl FromStr for Effort {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Ok(Effort::Low),
            "medium" => Ok(Effort::Medium),
            "high" => Ok(Effort::High),
            "exhaustive" => Ok(Effort::Exhaustive),
            other => Err(Error::InvalidOption(format!(
                "unknown effort '{other}' (expected low, medium, high, or exhaustive)"
            ))),
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effort::Low => write!(f, "low"),
            Effort::Medium => write!(f, "medium"),
            Effort::High => write!(f, "high"),
            Effort::Exhaustive => write!(f, "exhaustive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyChoice {
    /// Per-row term enumerator; small datasets only.
    Bounded,
    /// Pattern-centric greedy set-cover.
    Scalable,
}

#[derive(Debug, Clone, Copy)]
pub struct StrategyConfig {
    pub max_patterns_per_field: usize,
    pub enable_multi_field: bool,
    pub max_expressions_per_row: usize,
    pub max_total_expressions: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            max_patterns_per_field: 100,
            enable_multi_field: true,
            max_expressions_per_row: 50,
            max_total_expressions: 1000,
        }
    }
}

/// Pick a structured strategy for `(N, F, effort)`.
///
/// Low effort always takes the fastest path; exhaustive effort gets the
/// bounded enumerator while the dataset is small enough to afford it.
pub fn select_strategy(
    num_include: usize,
    num_fields: usize,
    effort: Effort,
) -> (StrategyChoice, StrategyConfig) {
    if effort == Effort::Low {
        return (
            StrategyChoice::Scalable,
            StrategyConfig {
                max_patterns_per_field: 20,
                enable_multi_field: false,
                ..StrategyConfig::default()
            },
        );
    }

    if effort == Effort::Exhaustive && num_include < 100 && num_fields <= 4 {
        return (
            StrategyChoice::Bounded,
            StrategyConfig {
                max_expressions_per_row: 200,
                max_total_expressions: 10_000,
                ..StrategyConfig::default()
            },
        );
    }

    let cap = if num_include < 1000 && num_fields < 8 {
        if effort == Effort::High {
            150
        } else {
            100
        }
    } else if effort == Effort::High {
        200
    } else {
        100
    };
    (
        StrategyChoice::Scalable,
        StrategyConfig {
            max_patterns_per_field: cap,
            ..StrategyConfig::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_effort_is_always_scalable() {
        let (choice, config) = select_strategy(10, 3, Effort::Low);
        assert_eq!(choice, StrategyChoice::Scalable);
        assert_eq!(config.max_patterns_per_field, 20);
        assert!(!config.enable_multi_field);
    }

    #[test]
    fn test_exhaustive_small_gets_bounded() {
        let (choice, _) = select_strategy(50, 3, Effort::Exhaustive);
        assert_eq!(choice, StrategyChoice::Bounded);
        // Too large for the enumerator: fall back to scalable.
        let (choice, _) = select_strategy(5000, 3, Effort::Exhaustive);
        assert_eq!(choice, StrategyChoice::Scalable);
    }

    #[test]
    fn test_high_effort_raises_caps() {
        let (_, medium) = select_strategy(500, 4, Effort::Medium);
        let (_, high) = select_strategy(500, 4, Effort::High);
        assert!(high.max_patterns_per_field > medium.max_patterns_per_field);
    }
}

//! Boolean expression evaluation over atom identifiers.
//!
//! Grammar: `expr := term ('|' term)*`, `term := factor ('&' factor)*`,
//! `factor := '!' factor | '(' expr ')' | atomId` where an atom id is
//! `P` followed by digits. The AST evaluates to row bitmasks, with the
//! corpus universe standing in for negation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bitset::BitSet;
use crate::matcher;
use crate::Error;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown atom id '{0}'")]
    UnknownAtom(String),
    #[error("missing closing parenthesis at offset {0}")]
    UnbalancedParens(usize),
    #[error("expected atom identifier at offset {0}")]
    ExpectedAtom(usize),
    #[error("unexpected trailing characters at offset {0}")]
    TrailingGarbage(usize),
}

/// Metrics recomputed from a user-supplied expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprMetrics {
    pub covered: usize,
    pub total_positive: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_count: usize,
}

#[derive(Debug)]
enum Node {
    Atom(String),
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(expr: &str) -> Self {
        Parser {
            chars: expr.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Node, ParseError> {
        let node = self.parse_expr()?;
        self.skip_spaces();
        if self.pos != self.chars.len() {
            return Err(ParseError::TrailingGarbage(self.pos));
        }
        Ok(node)
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn parse_expr(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_term()?;
        self.skip_spaces();
        while self.peek() == Some('|') {
            self.pos += 1;
            let rhs = self.parse_term()?;
            node = Node::Or(Box::new(node), Box::new(rhs));
            self.skip_spaces();
        }
        Ok(node)
    }

    fn parse_term(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_factor()?;
        self.skip_spaces();
        while self.peek() == Some('&') {
            self.pos += 1;
            let rhs = self.parse_factor()?;
            node = Node::And(Box::new(node), Box::new(rhs));
            self.skip_spaces();
        }
        Ok(node)
    }

    fn parse_factor(&mut self) -> Result<Node, ParseError> {
        self.skip_spaces();
        match self.peek() {
            Some('!') => {
                self.pos += 1;
                Ok(Node::Not(Box::new(self.parse_factor()?)))
            }
            Some('(') => {
                let open = self.pos;
                self.pos += 1;
                let node = self.parse_expr()?;
                self.skip_spaces();
                if self.peek() != Some(')') {
                    return Err(ParseError::UnbalancedParens(open));
                }
                self.pos += 1;
                Ok(node)
            }
            _ => self.parse_atom().map(Node::Atom),
        }
    }

    fn parse_atom(&mut self) -> Result<String, ParseError> {
        self.skip_spaces();
        if self.peek() != Some('P') {
            return Err(ParseError::ExpectedAtom(self.pos));
        }
        let start = self.pos;
        self.pos += 1;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

fn eval_node(
    node: &Node,
    masks: &BTreeMap<String, BitSet>,
    universe: &BitSet,
) -> Result<BitSet, ParseError> {
    match node {
        Node::Atom(name) => masks
            .get(name)
            .cloned()
            .ok_or_else(|| ParseError::UnknownAtom(name.clone())),
        Node::Not(inner) => {
            let inner = eval_node(inner, masks, universe)?;
            Ok(universe.and_not(&inner))
        }
        Node::And(lhs, rhs) => {
            Ok(eval_node(lhs, masks, universe)?.intersect(&eval_node(rhs, masks, universe)?))
        }
        Node::Or(lhs, rhs) => {
            Ok(eval_node(lhs, masks, universe)?.union(&eval_node(rhs, masks, universe)?))
        }
    }
}

/// Evaluate `expr` over `atoms` (id -> pattern text) against the two
/// corpora. Atom patterns may use the raw `&`/`-` composition.
pub fn evaluate_expr<S: AsRef<str>>(
    expr: &str,
    atoms: &BTreeMap<String, String>,
    include: &[S],
    exclude: &[S],
) -> Result<ExprMetrics, Error> {
    let ast = Parser::new(expr).parse()?;
    let include_masks: BTreeMap<String, BitSet> = atoms
        .iter()
        .map(|(id, pattern)| (id.clone(), matcher::match_all_raw(include, pattern)))
        .collect();
    let exclude_masks: BTreeMap<String, BitSet> = atoms
        .iter()
        .map(|(id, pattern)| (id.clone(), matcher::match_all_raw(exclude, pattern)))
        .collect();
    let include_universe = BitSet::new(include.len()).complement();
    let exclude_universe = BitSet::new(exclude.len()).complement();
    let include_mask = eval_node(&ast, &include_masks, &include_universe)?;
    let exclude_mask = eval_node(&ast, &exclude_masks, &exclude_universe)?;
    let covered = include_mask.count_ones();
    Ok(ExprMetrics {
        covered,
        total_positive: include.len(),
        fp: exclude_mask.count_ones(),
        fn_count: include.len() - covered,
    })
}

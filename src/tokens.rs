//! Deterministic segmentation of identifiers into lowercase tokens.
//!
//! Three split methods are supported. `classchange` cuts on character
//! class transitions and is the default for hierarchical identifiers;
//! `delimiter` splits on the path separators `/ _ . -`; `char` degrades
//! to one token per character for adversarial inputs. All methods
//! lowercase their output and share the short-token merging rule.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::StructuredRow;
use crate::Error;

/// Characters treated as token boundaries by the `delimiter` method and
/// as truncation points by refinement and expansion.
pub const DELIMITERS: [char; 4] = ['/', '_', '.', '-'];

/// A lowercased token with the index of its source chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub index: usize,
}

impl Token {
    fn new(text: String, index: usize) -> Self {
        Token {
            text: text.to_lowercase(),
            index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    #[default]
    #[serde(rename = "classchange")]
    ClassChange,
    Delimiter,
    Char,
}

impl FromStr for SplitMethod {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "classchange" => Ok(SplitMethod::ClassChange),
            "delimiter" => Ok(SplitMethod::Delimiter),
            "char" => Ok(SplitMethod::Char),
            other => Err(Error::InvalidOption(format!(
                "unknown split method '{other}' (expected classchange, delimiter, or char)"
            ))),
        }
    }
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMethod::ClassChange => write!(f, "classchange"),
            SplitMethod::Delimiter => write!(f, "delimiter"),
            SplitMethod::Char => write!(f, "char"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Alpha,
    Digit,
    Other,
}

fn class_of(ch: char) -> CharClass {
    if ch.is_alphabetic() {
        CharClass::Alpha
    } else if ch.is_ascii_digit() {
        CharClass::Digit
    } else {
        CharClass::Other
    }
}

/// Split `text` into maximal runs of a single character class.
fn split_classchange(text: &str) -> Vec<(String, CharClass)> {
    let mut chunks: Vec<(String, CharClass)> = Vec::new();
    for ch in text.chars() {
        let class = class_of(ch);
        match chunks.last_mut() {
            Some((buf, prev)) if *prev == class => buf.push(ch),
            _ => chunks.push((ch.to_string(), class)),
        }
    }
    chunks
}

/// Tokenize one string.
///
/// `min_token_len` is the length floor for emitted tokens; `char` mode
/// forces it to 1. Short tokens absorb the raw text through the next
/// multi-character token (delimiter spans included) until they meet the
/// floor, and are dropped when no completion exists. Single-character
/// alphanumeric chunks never start a token.
pub fn tokenize(text: &str, method: SplitMethod, min_token_len: usize) -> Vec<Token> {
    match method {
        SplitMethod::Char => text
            .chars()
            .enumerate()
            .map(|(idx, ch)| Token::new(ch.to_string(), idx))
            .collect(),
        SplitMethod::ClassChange => tokenize_classchange(text, min_token_len),
        SplitMethod::Delimiter => tokenize_delimiter(text, min_token_len),
    }
}

fn tokenize_classchange(text: &str, min_token_len: usize) -> Vec<Token> {
    let chunks = split_classchange(text);
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;
    while i < chunks.len() {
        let (chunk, class) = &chunks[i];
        let chunk_len = chunk.chars().count();
        if *class == CharClass::Other || chunk_len == 1 {
            i += 1;
            continue;
        }
        if chunk_len >= min_token_len {
            tokens.push(Token::new(chunk.clone(), i));
            i += 1;
            continue;
        }
        // Too short: absorb the source span up to the next multi-character
        // token, repeating until the floor is met.
        let mut merged = chunk.clone();
        let mut j = i + 1;
        let mut completed = false;
        while j < chunks.len() {
            let (next, next_class) = &chunks[j];
            merged.push_str(next);
            let is_token = *next_class != CharClass::Other && next.chars().count() > 1;
            j += 1;
            if is_token && merged.chars().count() >= min_token_len {
                completed = true;
                break;
            }
        }
        if completed {
            tokens.push(Token::new(merged, i));
            i = j;
        } else {
            i += 1;
        }
    }
    tokens
}

fn tokenize_delimiter(text: &str, min_token_len: usize) -> Vec<Token> {
    let parts: Vec<&str> = text.split(DELIMITERS).collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;
    while i < parts.len() {
        let part = parts[i];
        if part.is_empty() {
            i += 1;
            continue;
        }
        if part.chars().count() >= min_token_len {
            tokens.push(Token::new(part.to_string(), i));
            i += 1;
            continue;
        }
        let mut merged = part.to_string();
        let mut j = i + 1;
        let mut completed = false;
        while j < parts.len() {
            let next = parts[j];
            j += 1;
            if next.is_empty() {
                continue;
            }
            merged.push('_');
            merged.push_str(next);
            if merged.chars().count() >= min_token_len {
                completed = true;
                break;
            }
        }
        if completed {
            tokens.push(Token::new(merged, i));
            i = j;
        } else {
            i += 1;
        }
    }
    tokens
}

/// Tokenize every item, yielding `(row_index, token)` pairs in row order.
pub fn iter_tokens<S: AsRef<str>>(
    items: &[S],
    method: SplitMethod,
    min_token_len: usize,
) -> Vec<(usize, Token)> {
    let mut out = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        for token in tokenize(item.as_ref(), method, min_token_len) {
            out.push((idx, token));
        }
    }
    out
}

/// Per-field tokenizer configuration for structured rows.
#[derive(Debug, Clone, Copy)]
pub struct FieldTokenizer {
    pub method: SplitMethod,
    pub min_token_len: usize,
}

impl FieldTokenizer {
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        tokenize(text, self.method, self.min_token_len)
    }
}

/// Tokenize structured rows field by field, yielding
/// `(row_index, token, field_name)` triples. Fields without a tokenizer
/// entry are skipped; missing or null values yield no tokens.
pub fn iter_structured_tokens_with_fields(
    rows: &[StructuredRow],
    tokenizers: &BTreeMap<String, FieldTokenizer>,
    field_order: &[String],
) -> Vec<(usize, Token, String)> {
    let mut out = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        for name in field_order {
            let Some(tok) = tokenizers.get(name) else {
                continue;
            };
            let value = row
                .iter()
                .find(|(field, _)| field == name)
                .and_then(|(_, value)| value.as_deref())
                .unwrap_or("");
            for token in tok.tokenize(value) {
                out.push((idx, token, name.clone()));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_classchange_basic() {
        let tokens = tokenize("alpha/module1/mem", SplitMethod::ClassChange, 3);
        assert_eq!(texts(&tokens), vec!["alpha", "module", "mem"]);
    }

    #[test]
    fn test_classchange_merges_short_tokens() {
        // "ab" is below the floor and absorbs through "def".
        let tokens = tokenize("ab_def/ghi", SplitMethod::ClassChange, 3);
        assert_eq!(texts(&tokens), vec!["ab_def", "ghi"]);
    }

    #[test]
    fn test_classchange_drops_single_chars() {
        let tokens = tokenize("a/bcd/e", SplitMethod::ClassChange, 3);
        assert_eq!(texts(&tokens), vec!["bcd"]);
    }

    #[test]
    fn test_classchange_drops_unmergeable_tail() {
        let tokens = tokenize("alpha/xy", SplitMethod::ClassChange, 3);
        assert_eq!(texts(&tokens), vec!["alpha"]);
    }

    #[test]
    fn test_delimiter_method() {
        let tokens = tokenize("cpu/c0/execute/alu_int", SplitMethod::Delimiter, 3);
        assert_eq!(texts(&tokens), vec!["cpu", "c0_execute", "alu", "int"]);
    }

    #[test]
    fn test_char_method() {
        let tokens = tokenize("A/b", SplitMethod::Char, 3);
        assert_eq!(texts(&tokens), vec!["a", "/", "b"]);
    }

    #[test]
    fn test_lowercasing_and_indexes() {
        let tokens = tokenize("SRAM/Cache", SplitMethod::ClassChange, 3);
        assert_eq!(texts(&tokens), vec!["sram", "cache"]);
        assert_eq!(tokens[0].index, 0);
        assert_eq!(tokens[1].index, 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("", SplitMethod::ClassChange, 3).is_empty());
        assert!(tokenize("", SplitMethod::Char, 3).is_empty());
    }
}

//! Tokenizer behavior through the public API, including the
//! per-field structured iteration.

use std::collections::BTreeMap;

use patternforge::tokens::{
    iter_structured_tokens_with_fields, iter_tokens, tokenize, FieldTokenizer,
};
use patternforge::{SplitMethod, StructuredRow};

fn texts(tokens: &[(usize, patternforge::tokens::Token)]) -> Vec<(usize, String)> {
    tokens
        .iter()
        .map(|(idx, token)| (*idx, token.text.clone()))
        .collect()
}

#[test]
fn test_iter_tokens_tags_rows() {
    let items = ["alpha/mem", "beta/cache"];
    let tokens = iter_tokens(&items, SplitMethod::ClassChange, 3);
    assert_eq!(
        texts(&tokens),
        vec![
            (0, "alpha".to_string()),
            (0, "mem".to_string()),
            (1, "beta".to_string()),
            (1, "cache".to_string()),
        ]
    );
}

#[test]
fn test_split_method_parsing() {
    assert_eq!(
        "classchange".parse::<SplitMethod>().unwrap(),
        SplitMethod::ClassChange
    );
    assert_eq!(
        "delimiter".parse::<SplitMethod>().unwrap(),
        SplitMethod::Delimiter
    );
    assert_eq!("char".parse::<SplitMethod>().unwrap(), SplitMethod::Char);
    assert!(matches!(
        "words".parse::<SplitMethod>(),
        Err(patternforge::Error::InvalidOption(_))
    ));
}

#[test]
fn test_char_method_forces_unit_tokens() {
    let tokens = tokenize("Ab/c", SplitMethod::Char, 5);
    let all: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(all, vec!["a", "b", "/", "c"]);
}

#[test]
fn test_structured_iteration_respects_field_tokenizers() {
    let rows: Vec<StructuredRow> = vec![vec![
        ("id".to_string(), Some("AB".to_string())),
        ("path".to_string(), Some("cpu/cache".to_string())),
        ("unused".to_string(), Some("zzz".to_string())),
    ]];
    let tokenizers: BTreeMap<String, FieldTokenizer> = [
        (
            "id".to_string(),
            FieldTokenizer {
                method: SplitMethod::Char,
                min_token_len: 1,
            },
        ),
        (
            "path".to_string(),
            FieldTokenizer {
                method: SplitMethod::ClassChange,
                min_token_len: 3,
            },
        ),
    ]
    .into_iter()
    .collect();
    let field_order = vec!["id".to_string(), "path".to_string()];

    let tokens = iter_structured_tokens_with_fields(&rows, &tokenizers, &field_order);

    let summary: Vec<(usize, &str, &str)> = tokens
        .iter()
        .map(|(idx, token, field)| (*idx, token.text.as_str(), field.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, "a", "id"),
            (0, "b", "id"),
            (0, "cpu", "path"),
            (0, "cache", "path"),
        ]
    );
}

#[test]
fn test_structured_iteration_skips_null_values() {
    let rows: Vec<StructuredRow> = vec![vec![("pin".to_string(), None)]];
    let tokenizers: BTreeMap<String, FieldTokenizer> = [(
        "pin".to_string(),
        FieldTokenizer {
            method: SplitMethod::ClassChange,
            min_token_len: 3,
        },
    )]
    .into_iter()
    .collect();
    let tokens =
        iter_structured_tokens_with_fields(&rows, &tokenizers, &["pin".to_string()]);
    assert!(tokens.is_empty());
}

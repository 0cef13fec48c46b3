//! Structured (multi-field) solving: per-field atoms, conjunction
//! terms, don't-care excludes, and the strategy dispatcher.

use patternforge::{
    propose_solution_structured, rows_from_json, Effort, PerField, SolveOptions, SplitMethod,
    StructuredRow,
};
use serde_json::json;

fn row(pairs: &[(&str, &str)]) -> StructuredRow {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), Some(value.to_string())))
        .collect()
}

fn sram_dataset() -> (Vec<StructuredRow>, Vec<StructuredRow>) {
    let include = vec![
        row(&[("module", "SRAM"), ("instance", "cpu/cache"), ("pin", "DIN")]),
        row(&[("module", "SRAM"), ("instance", "cpu/cache"), ("pin", "DOUT")]),
    ];
    let exclude = vec![
        row(&[("module", "SRAM"), ("instance", "cpu/cache"), ("pin", "CLK")]),
        row(&[("module", "SRAM"), ("instance", "cpu/l2"), ("pin", "DIN")]),
    ];
    (include, exclude)
}

#[test]
fn test_multi_field_conjunction() {
    let (include, exclude) = sram_dataset();
    let solution =
        propose_solution_structured(&include, &exclude, None, &SolveOptions::default()).unwrap();

    assert_eq!(solution.metrics.covered, 2);
    assert_eq!(solution.metrics.fp, 0);
    assert!(solution
        .atoms
        .iter()
        .any(|a| matches!(a.field.as_deref(), Some("pin") | Some("instance"))));
    // The DIN row needs a conjunction; a single field cannot separate it
    // from the excludes.
    assert!(solution
        .terms
        .iter()
        .any(|t| t.fields.as_ref().is_some_and(|f| f.len() >= 2)));
}

#[test]
fn test_bounded_enumerator_matches_exact_contract() {
    let (include, exclude) = sram_dataset();
    let options = SolveOptions {
        effort: Effort::Exhaustive,
        ..SolveOptions::default()
    };
    let solution = propose_solution_structured(&include, &exclude, None, &options).unwrap();
    assert_eq!(solution.metrics.covered, 2);
    assert_eq!(solution.metrics.fp, 0);
}

#[test]
fn test_low_effort_stays_single_field() {
    let (include, exclude) = sram_dataset();
    let options = SolveOptions {
        effort: Effort::Low,
        ..SolveOptions::default()
    };
    let solution = propose_solution_structured(&include, &exclude, None, &options).unwrap();
    assert_eq!(solution.metrics.fp, 0);
    for term in &solution.terms {
        assert!(term.fields.as_ref().is_some_and(|f| f.len() == 1));
    }
}

#[test]
fn test_dont_care_exclude_blocks_the_field() {
    // Excluding pin=DIN with every other field a don't-care makes the
    // DIN include row uncoverable at zero FP.
    let include = vec![
        row(&[("module", "SRAM"), ("pin", "DIN")]),
        row(&[("module", "SRAM"), ("pin", "DOUT")]),
    ];
    let exclude = vec![vec![
        ("module".to_string(), None),
        ("pin".to_string(), Some("DIN".to_string())),
    ]];
    let solution =
        propose_solution_structured(&include, &exclude, None, &SolveOptions::default()).unwrap();
    assert_eq!(solution.metrics.fp, 0);
    assert_eq!(solution.metrics.covered, 1);
    assert_eq!(solution.metrics.fn_count, 1);
}

#[test]
fn test_field_values_are_matched_lowercase() {
    let include = vec![row(&[("module", "SRAM")])];
    let exclude = vec![row(&[("module", "ROM")])];
    let solution =
        propose_solution_structured(&include, &exclude, None, &SolveOptions::default()).unwrap();
    assert_eq!(solution.metrics.covered, 1);
    for atom in &solution.atoms {
        assert_eq!(atom.text, atom.text.to_lowercase());
    }
}

#[test]
fn test_fields_inferred_from_first_row() {
    let (include, exclude) = sram_dataset();
    let solution =
        propose_solution_structured(&include, &exclude, None, &SolveOptions::default()).unwrap();
    for atom in &solution.atoms {
        assert!(matches!(
            atom.field.as_deref(),
            Some("module") | Some("instance") | Some("pin")
        ));
    }
}

#[test]
fn test_per_field_tokenizer_options() {
    let include = vec![
        row(&[("id", "ab"), ("path", "cpu/cache/bank0")]),
        row(&[("id", "cd"), ("path", "cpu/cache/bank1")]),
    ];
    let exclude = vec![row(&[("id", "ef"), ("path", "cpu/debug/bank0")])];
    let options = SolveOptions {
        splitmethod: PerField::ByField(
            [("id".to_string(), SplitMethod::Char)].into_iter().collect(),
        ),
        min_token_len: PerField::ByField([("id".to_string(), 1usize)].into_iter().collect()),
        ..SolveOptions::default()
    };
    let solution = propose_solution_structured(&include, &exclude, None, &options).unwrap();
    assert_eq!(solution.metrics.fp, 0);
    assert_eq!(solution.metrics.covered, 2);
}

#[test]
fn test_empty_include_rows() {
    let solution =
        propose_solution_structured(&[], &[], None, &SolveOptions::default()).unwrap();
    assert_eq!(solution.expr, "FALSE");
    assert_eq!(solution.metrics.total_positive, 0);
}

#[test]
fn test_rows_from_json_objects_and_arrays() {
    let objects = [
        json!({"module": "SRAM", "pin": "DIN"}),
        json!({"module": "SRAM", "pin": null}),
    ];
    let rows = rows_from_json(&objects, None).unwrap();
    assert_eq!(rows[0].len(), 2);
    assert_eq!(rows[1][1].1, None);

    let fields = vec!["module".to_string(), "pin".to_string()];
    let arrays = [json!(["SRAM", "DIN"]), json!(["ROM", null])];
    let rows = rows_from_json(&arrays, Some(&fields)).unwrap();
    assert_eq!(rows[0][0], ("module".to_string(), Some("SRAM".to_string())));
    assert_eq!(rows[1][1], ("pin".to_string(), None));
}

#[test]
fn test_rows_from_json_shape_errors() {
    let arrays = [json!(["SRAM", "DIN"])];
    assert!(matches!(
        rows_from_json(&arrays, None),
        Err(patternforge::Error::InputShape(_))
    ));
    let scalars = [json!("just-a-string")];
    assert!(matches!(
        rows_from_json(&scalars, None),
        Err(patternforge::Error::InputShape(_))
    ));
}

#[test]
fn test_structured_determinism() {
    let (include, exclude) = sram_dataset();
    let first =
        propose_solution_structured(&include, &exclude, None, &SolveOptions::default()).unwrap();
    let second =
        propose_solution_structured(&include, &exclude, None, &SolveOptions::default()).unwrap();
    assert_eq!(first, second);
}

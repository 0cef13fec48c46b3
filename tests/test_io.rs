//! Reader/writer formats used by the CLI: plain text, JSON lines, CSV
//! (item column and composite), schema JSON, and solution round trips.

use std::io::Write;

use patternforge::{io, propose_solution, Error, SolveOptions};
use tempfile::NamedTempFile;

fn temp_file(name_suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(name_suffix)
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn path(file: &NamedTempFile) -> String {
    file.path().to_str().unwrap().to_string()
}

#[test]
fn test_plain_text_drops_blank_lines() {
    let file = temp_file(".txt", "alpha/m1\n\n  \nbeta/m2\n");
    let items = io::read_items(&path(&file)).unwrap();
    assert_eq!(items, vec!["alpha/m1", "beta/m2"]);
}

#[test]
fn test_jsonl_scalars_and_objects() {
    let file = temp_file(".jsonl", "\"alpha/m1\"\n{\"item\": \"beta/m2\"}\n42\n");
    let items = io::read_items(&path(&file)).unwrap();
    assert_eq!(items, vec!["alpha/m1", "beta/m2", "42"]);
}

#[test]
fn test_jsonl_object_without_item_is_input_shape() {
    let file = temp_file(".jsonl", "{\"thing\": \"x\"}\n");
    assert!(matches!(
        io::read_items(&path(&file)),
        Err(Error::InputShape(_))
    ));
}

#[test]
fn test_csv_item_column() {
    let file = temp_file(".csv", "item,other\nalpha/m1,x\nbeta/m2,y\n");
    let items = io::read_items(&path(&file)).unwrap();
    assert_eq!(items, vec!["alpha/m1", "beta/m2"]);
}

#[test]
fn test_csv_composite_columns() {
    let file = temp_file(
        ".csv",
        "module,instance,pin,signal\nSRAM,cpu/cache,DIN,d0\nSRAM,cpu/l2,,d1\n",
    );
    let items = io::read_items(&path(&file)).unwrap();
    assert_eq!(items, vec!["SRAM/cpu/cache/DIN/d0", "SRAM/cpu/l2/d1"]);
}

#[test]
fn test_csv_without_known_columns_is_input_shape() {
    let file = temp_file(".csv", "a,b\n1,2\n");
    assert!(matches!(
        io::read_items(&path(&file)),
        Err(Error::InputShape(_))
    ));
}

#[test]
fn test_schema_round_trip() {
    let file = temp_file(
        ".json",
        "{\"name\": \"pins\", \"delimiter\": \"/\", \"fields\": [\"module\", \"pin\"]}",
    );
    let schema = io::load_schema(&path(&file)).unwrap();
    assert_eq!(schema.name, "pins");
    assert_eq!(schema.fields, vec!["module", "pin"]);
}

#[test]
fn test_structured_rows_from_csv() {
    let file = temp_file(".csv", "module,pin\nSRAM,DIN\nSRAM,\n");
    let rows = io::read_structured_rows(&path(&file), None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], ("module".to_string(), Some("SRAM".to_string())));
    // Empty cells become don't-care values.
    assert_eq!(rows[1][1], ("pin".to_string(), None));
}

#[test]
fn test_structured_rows_from_jsonl() {
    let file = temp_file(
        ".jsonl",
        "{\"module\": \"SRAM\", \"pin\": \"DIN\"}\n{\"module\": \"ROM\", \"pin\": null}\n",
    );
    let rows = io::read_structured_rows(&path(&file), None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].iter().find(|(f, _)| f == "pin").unwrap().1, None);
}

#[test]
fn test_solution_save_and_load() {
    let include = ["alpha/m1", "alpha/m2"];
    let exclude = ["beta/m1"];
    let solution = propose_solution(&include, &exclude, &SolveOptions::default()).unwrap();

    let file = NamedTempFile::new().unwrap();
    let file_path = path(&file);
    io::save_solution(&solution, &file_path).unwrap();
    let loaded = io::load_solution(&file_path).unwrap();
    assert_eq!(loaded, solution);
}

#[test]
fn test_write_text_appends_newline() {
    let file = NamedTempFile::new().unwrap();
    let file_path = path(&file);
    io::write_text("no newline", &file_path).unwrap();
    let written = std::fs::read_to_string(&file_path).unwrap();
    assert_eq!(written, "no newline\n");
}

//! File readers and writers for the command-line tooling.
//!
//! The core never touches the filesystem; everything here serves the
//! binary. Formats are fixed for compatibility: plain text (one item per
//! line), JSON lines (bare scalar or `{"item": …}`), CSV (an `item`
//! column or the composite `module,instance,pin,signal` join), and the
//! schema JSON `{name, delimiter, fields}`.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{Solution, StructuredRow};
use crate::structured::rows_from_json;
use crate::Error;

/// Columns joined with `/` when a CSV has no `item` column.
const COMPOSITE_COLUMNS: [&str; 4] = ["module", "instance", "pin", "signal"];

/// Field roster for structured inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub delimiter: String,
    pub fields: Vec<String>,
}

pub fn load_schema(path: &str) -> Result<Schema, Error> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Read one item per line, dispatching on the file extension:
/// `.json`/`.jsonl` as JSON lines, `.csv` as CSV, anything else as
/// plain text with blank lines dropped.
pub fn read_items(path: &str) -> Result<Vec<String>, Error> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let file = File::open(path)?;
    match extension.as_deref() {
        Some("json") | Some("jsonl") => read_jsonl(BufReader::new(file)),
        Some("csv") => read_csv(file),
        _ => read_text_lines(BufReader::new(file)),
    }
}

fn read_text_lines<R: BufRead>(reader: R) -> Result<Vec<String>, Error> {
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            items.push(line.trim_end_matches(['\r', '\n']).to_string());
        }
    }
    Ok(items)
}

fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<String>, Error> {
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line)?;
        let item = match &value {
            serde_json::Value::Object(map) => match map.get("item") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => {
                    return Err(Error::InputShape(
                        "JSON line object is missing the 'item' key".to_string(),
                    ))
                }
            },
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            other => {
                return Err(Error::InputShape(format!(
                    "JSON line must be a scalar or an object with 'item', got {other}"
                )))
            }
        };
        items.push(item);
    }
    Ok(items)
}

fn read_csv<R: Read>(reader: R) -> Result<Vec<String>, Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    if let Some(item_idx) = headers.iter().position(|h| h == "item") {
        let mut items = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if let Some(value) = record.get(item_idx) {
                if !value.is_empty() {
                    items.push(value.to_string());
                }
            }
        }
        return Ok(items);
    }
    let indexes: Vec<usize> = COMPOSITE_COLUMNS
        .iter()
        .filter_map(|name| headers.iter().position(|h| h == *name))
        .collect();
    if indexes.is_empty() {
        return Err(Error::InputShape(
            "CSV needs an 'item' column or module/instance/pin/signal columns".to_string(),
        ));
    }
    let mut items = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let parts: Vec<&str> = indexes
            .iter()
            .filter_map(|idx| record.get(*idx))
            .filter(|v| !v.is_empty())
            .collect();
        if !parts.is_empty() {
            items.push(parts.join("/"));
        }
    }
    Ok(items)
}

/// Read structured rows: JSON lines of objects/arrays, or CSV where the
/// header row names the fields (restricted to `fields` when given).
pub fn read_structured_rows(
    path: &str,
    fields: Option<&[String]>,
) -> Result<Vec<StructuredRow>, Error> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let file = File::open(path)?;
    match extension.as_deref() {
        Some("csv") => read_structured_csv(file, fields),
        _ => {
            let mut values = Vec::new();
            for line in BufReader::new(file).lines() {
                let line = line?;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                values.push(serde_json::from_str(line)?);
            }
            rows_from_json(&values, fields)
        }
    }
}

fn read_structured_csv<R: Read>(
    reader: R,
    fields: Option<&[String]>,
) -> Result<Vec<StructuredRow>, Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let selected: Vec<(String, usize)> = match fields {
        Some(fields) => fields
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .map(|idx| (name.clone(), idx))
                    .ok_or_else(|| {
                        Error::InputShape(format!("CSV is missing the '{name}' column"))
                    })
            })
            .collect::<Result<_, _>>()?,
        None => headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.to_string(), idx))
            .collect(),
    };
    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(
            selected
                .iter()
                .map(|(name, idx)| {
                    let value = record.get(*idx).unwrap_or_default();
                    let value = if value.is_empty() {
                        None
                    } else {
                        Some(value.to_string())
                    };
                    (name.clone(), value)
                })
                .collect(),
        );
    }
    Ok(rows)
}

pub fn load_solution(path: &str) -> Result<Solution, Error> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn save_solution(solution: &Solution, path: &str) -> Result<(), Error> {
    write_json(&solution.to_json(), path)
}

/// Pretty-print JSON to a file, or stdout for `-`.
pub fn write_json(value: &serde_json::Value, path: &str) -> Result<(), Error> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    write_text(&text, path)
}

/// Write text to a file, or stdout for `-`. A trailing newline is
/// guaranteed.
pub fn write_text(text: &str, path: &str) -> Result<(), Error> {
    let mut owned = text.to_string();
    if !owned.ends_with('\n') {
        owned.push('\n');
    }
    if path == "-" {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(owned.as_bytes())?;
        handle.flush()?;
    } else {
        let mut file = File::create(path)?;
        file.write_all(owned.as_bytes())?;
    }
    Ok(())
}

use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::frame::{Cell, DataFrame};

/// Loads a delimited-text file into a dataset. The header row becomes the
/// column names; cell types are inferred per value.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(PipelineError::EmptyInput(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut frame = DataFrame::new(columns);

    for result in reader.records() {
        let record = result?;
        let row = record.iter().map(infer_cell).collect();
        frame.push_row(row)?;
    }

    debug!(rows = frame.row_count(), "loaded CSV from {}", path.display());
    Ok(frame)
}

/// Loads a semi-structured record file: either a bare list of records, or
/// an object whose first list-valued field holds the records. Columns are
/// the union of record keys; absent keys become nulls.
pub fn load_json(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;

    let records: &[Value] = match &value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .values()
            .find_map(|v| v.as_array())
            .map(Vec::as_slice)
            .ok_or_else(|| {
                PipelineError::Shape(format!("no record list in {}", path.display()))
            })?,
        _ => {
            return Err(PipelineError::Shape(format!(
                "expected a record list or an object containing one in {}",
                path.display()
            )))
        }
    };

    let mut columns: Vec<String> = Vec::new();
    for record in records {
        if let Some(object) = record.as_object() {
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut frame = DataFrame::new(columns.clone());
    for record in records {
        let object = record.as_object().ok_or_else(|| {
            PipelineError::Shape(format!("non-object record in {}", path.display()))
        })?;
        let row = columns
            .iter()
            .map(|column| object.get(column).map(cell_from_json).unwrap_or(Cell::Null))
            .collect();
        frame.push_row(row)?;
    }

    debug!(rows = frame.row_count(), "loaded JSON from {}", path.display());
    Ok(frame)
}

/// Loads the first worksheet of a spreadsheet file into a dataset. The
/// first row becomes the column names.
pub fn load_excel(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(PipelineError::EmptyInput(path.to_path_buf())),
    };
    if range.is_empty() {
        return Err(PipelineError::EmptyInput(path.to_path_buf()));
    }

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
        None => return Err(PipelineError::EmptyInput(path.to_path_buf())),
    };

    let mut frame = DataFrame::new(columns);
    for row in rows {
        frame.push_row(row.iter().map(cell_from_excel).collect())?;
    }

    debug!(rows = frame.row_count(), "loaded spreadsheet from {}", path.display());
    Ok(frame)
}

/// Writes a dataset to a delimited-text file. Nulls serialize as empty
/// fields, dates as `YYYY-MM-DD`.
pub fn write_csv(frame: &DataFrame, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(frame.column_names())?;
    for row in frame.rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

fn infer_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Cell::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Cell::Float(f);
    }
    Cell::Str(raw.to_string())
}

fn cell_from_json(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(Cell::Int)
            .or_else(|| n.as_f64().map(Cell::Float))
            .unwrap_or(Cell::Null),
        Value::String(s) => Cell::Str(s.clone()),
        // Nested structures keep their compact JSON text
        other => Cell::Str(other.to_string()),
    }
}

fn cell_from_excel(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Null,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Null
            } else {
                Cell::Str(s.clone())
            }
        }
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Cell::Date(d.date()))
            .unwrap_or(Cell::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Str(s.clone()),
        Data::Error(_) => Cell::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_csv_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "id,name,value\n1,Alice,10\n2,Bob,20").unwrap();

        let frame = load_csv(&path).unwrap();
        assert_eq!(frame.column_names(), ["id", "name", "value"]);
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.cell(0, "id"), Some(&Cell::Int(1)));
        assert_eq!(frame.cell(1, "name"), Some(&Cell::Str("Bob".to_string())));
    }

    #[test]
    fn test_load_csv_infers_nulls_and_floats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "id,score\n1,2.5\n2,").unwrap();

        let frame = load_csv(&path).unwrap();
        assert_eq!(frame.cell(0, "score"), Some(&Cell::Float(2.5)));
        assert_eq!(frame.cell(1, "score"), Some(&Cell::Null));
    }

    #[test]
    fn test_load_csv_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_csv(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(PipelineError::FileNotFound(_))));
    }

    #[test]
    fn test_load_csv_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();

        let result = load_csv(&path);
        assert!(matches!(result, Err(PipelineError::EmptyInput(_))));
    }

    #[test]
    fn test_load_csv_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("header.csv");
        fs::write(&path, "id,name\n").unwrap();

        let frame = load_csv(&path).unwrap();
        assert_eq!(frame.column_names(), ["id", "name"]);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_load_json_wrapped_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");
        fs::write(
            &path,
            r#"{"events": [{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]}"#,
        )
        .unwrap();

        let frame = load_json(&path).unwrap();
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.cell(1, "id"), Some(&Cell::Int(2)));
    }

    #[test]
    fn test_load_json_column_union() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");
        fs::write(
            &path,
            r#"[{"id": 1, "name": "Alice"}, {"id": 2, "venue": "Central"}]"#,
        )
        .unwrap();

        let frame = load_json(&path).unwrap();
        let mut columns: Vec<&str> = frame.column_names().iter().map(String::as_str).collect();
        columns.sort_unstable();
        assert_eq!(columns, ["id", "name", "venue"]);
        // Keys absent from a record come through as nulls
        assert_eq!(frame.cell(0, "venue"), Some(&Cell::Null));
        assert_eq!(frame.cell(1, "name"), Some(&Cell::Null));
    }

    #[test]
    fn test_load_json_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{invalid: json}").unwrap();

        let result = load_json(&path);
        assert!(matches!(result, Err(PipelineError::Json(_))));
    }

    #[test]
    fn test_load_json_object_without_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("norecords.json");
        fs::write(&path, r#"{"count": 3}"#).unwrap();

        let result = load_json(&path);
        assert!(matches!(result, Err(PipelineError::Shape(_))));
    }

    #[test]
    fn test_load_json_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_json(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(PipelineError::FileNotFound(_))));
    }

    #[test]
    fn test_load_excel_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_excel(&dir.path().join("missing.xlsx"));
        assert!(matches!(result, Err(PipelineError::FileNotFound(_))));
    }

    #[test]
    fn test_write_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut frame = DataFrame::new(vec!["id".to_string(), "note".to_string()]);
        frame
            .push_row(vec![Cell::Int(1), Cell::Str("ok".to_string())])
            .unwrap();
        frame.push_row(vec![Cell::Int(2), Cell::Null]).unwrap();
        write_csv(&frame, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "id,note\n1,ok\n2,\n");

        let reloaded = load_csv(&path).unwrap();
        assert_eq!(reloaded.cell(1, "note"), Some(&Cell::Null));
    }
}

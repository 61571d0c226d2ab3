use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::frame::{Cell, DataFrame};

/// Date text representations accepted by `standardize_dates`, tried in
/// order. Month comes first in the slash form.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y"];

/// Keeps the first occurrence of each distinct key-tuple in original row
/// order. The key is the `subset` columns when given, all columns
/// otherwise.
pub fn remove_duplicates(frame: &DataFrame, subset: Option<&[&str]>) -> Result<DataFrame> {
    let key_indices: Vec<usize> = match subset {
        Some(columns) => columns
            .iter()
            .map(|name| {
                frame.column_index(name).ok_or_else(|| {
                    PipelineError::InvalidArgument(format!(
                        "unknown column in duplicate subset: {name}"
                    ))
                })
            })
            .collect::<Result<_>>()?,
        None => (0..frame.column_count()).collect(),
    };

    let mut seen = HashSet::new();
    let mut result = DataFrame::new(frame.column_names().to_vec());
    for row in frame.rows() {
        let key: Vec<_> = key_indices.iter().map(|&i| row[i].key()).collect();
        if seen.insert(key) {
            result.push_row(row.to_vec())?;
        }
    }

    debug!(
        kept = result.row_count(),
        dropped = frame.row_count() - result.row_count(),
        "removed duplicates"
    );
    Ok(result)
}

/// Applies a missing-value strategy: `"drop"` removes every row containing
/// at least one null, `"fill"` replaces every null with `fill_value`.
pub fn handle_missing_values(
    frame: &DataFrame,
    strategy: &str,
    fill_value: Option<Cell>,
) -> Result<DataFrame> {
    let mut result = DataFrame::new(frame.column_names().to_vec());
    match strategy {
        "drop" => {
            for row in frame.rows() {
                if !row.iter().any(Cell::is_null) {
                    result.push_row(row.to_vec())?;
                }
            }
        }
        "fill" => {
            let fill = fill_value.ok_or_else(|| {
                PipelineError::InvalidArgument(
                    "fill strategy requires a fill value".to_string(),
                )
            })?;
            for row in frame.rows() {
                let filled = row
                    .iter()
                    .map(|cell| if cell.is_null() { fill.clone() } else { cell.clone() })
                    .collect();
                result.push_row(filled)?;
            }
        }
        other => {
            return Err(PipelineError::InvalidArgument(format!(
                "unknown missing-value strategy: {other}"
            )))
        }
    }
    Ok(result)
}

/// Parses heterogeneous date text in the named columns into a uniform
/// date-or-null column. Parsing is best-effort per cell; values that match
/// no known format become nulls, never errors.
pub fn standardize_dates(frame: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let targets: Vec<usize> = columns
        .iter()
        .map(|name| {
            frame.column_index(name).ok_or_else(|| {
                PipelineError::InvalidArgument(format!("unknown date column: {name}"))
            })
        })
        .collect::<Result<_>>()?;

    let mut result = DataFrame::new(frame.column_names().to_vec());
    for row in frame.rows() {
        let mut row = row.to_vec();
        for &index in &targets {
            row[index] = parse_date_cell(&row[index]);
        }
        result.push_row(row)?;
    }
    Ok(result)
}

fn parse_date_cell(cell: &Cell) -> Cell {
    match cell {
        Cell::Date(d) => Cell::Date(*d),
        Cell::Str(s) => {
            let text = s.trim();
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .map(Cell::Date)
                .unwrap_or(Cell::Null)
        }
        _ => Cell::Null,
    }
}

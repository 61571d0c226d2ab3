use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// A single nullable cell value in a dataset.
///
/// `Null` marks an absent value and is distinct from an empty string or
/// zero; transforms must treat the three differently.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Hashable key for duplicate detection. Floats key by bit pattern so
    /// whole rows can live in a `HashSet`.
    pub(crate) fn key(&self) -> CellKey {
        match self {
            Cell::Null => CellKey::Null,
            Cell::Int(i) => CellKey::Int(*i),
            Cell::Float(f) => CellKey::Float(f.to_bits()),
            Cell::Bool(b) => CellKey::Bool(*b),
            Cell::Str(s) => CellKey::Str(s.clone()),
            Cell::Date(d) => CellKey::Date(*d),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Str(s) => write!(f, "{s}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum CellKey {
    Null,
    Int(i64),
    Float(u64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
}

/// Summary statistics for one dataset, computed fresh on demand.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CleaningSummary {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub duplicate_rows: usize,
}

/// An in-memory tabular dataset: ordered named columns over row-major
/// storage. Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl DataFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[index])
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::Shape(format!(
                "row has {} cells, expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a computed column. The new column must hold one cell per
    /// existing row.
    pub fn add_column(&mut self, name: &str, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.rows.len() {
            return Err(PipelineError::Shape(format!(
                "column '{}' has {} cells, expected {}",
                name,
                cells.len(),
                self.rows.len()
            )));
        }
        if self.column_index(name).is_some() {
            return Err(PipelineError::InvalidArgument(format!(
                "column '{name}' already exists"
            )));
        }
        self.columns.push(name.to_string());
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row.push(cell);
        }
        Ok(())
    }

    pub fn missing_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|cell| cell.is_null()).count())
            .sum()
    }

    pub fn duplicate_rows(&self) -> usize {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| !seen.insert(row.iter().map(Cell::key).collect::<Vec<_>>()))
            .count()
    }

    pub fn summary(&self) -> CleaningSummary {
        CleaningSummary {
            rows: self.row_count(),
            columns: self.column_count(),
            missing_cells: self.missing_cells(),
            duplicate_rows: self.duplicate_rows(),
        }
    }
}

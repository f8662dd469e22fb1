//! Row and cell types handed to presentation sinks

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// A single report value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(u64),
    /// Percentage in the 0-100 range
    Percent(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(n) => write!(f, "{}", n),
            Cell::Percent(p) => write!(f, "{:.2}", p),
        }
    }
}

/// One report row: column names paired with values, in column order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<(&'static str, Cell)>,
}

impl Row {
    pub(crate) fn new(columns: &'static [&'static str], cells: Vec<Cell>) -> Self {
        debug_assert_eq!(columns.len(), cells.len(), "row width must match columns");
        Self {
            cells: columns.iter().copied().zip(cells).collect(),
        }
    }

    /// Value of a column
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, cell)| cell)
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().map(|(_, cell)| cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Cell)> {
        self.cells.iter().map(|(name, cell)| (*name, cell))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, cell) in &self.cells {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

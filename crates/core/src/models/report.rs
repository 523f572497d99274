use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// `Empty` for a missing value.
    pub fn number_or_empty(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, Cell::Number)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Empty => Ok(()),
        }
    }
}

/// One named sheet: rows of cells plus column widths in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
    pub column_widths: Vec<u16>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, column_widths: Vec<u16>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            column_widths,
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn push_blank(&mut self) {
        self.rows.push(Vec::new());
    }

    /// First row whose first cell is the given text.
    pub fn find_row(&self, label: &str) -> Option<&[Cell]> {
        self.rows
            .iter()
            .find(|row| row.first().and_then(Cell::as_text) == Some(label))
            .map(|row| row.as_slice())
    }
}

/// A complete report ready to hand to a spreadsheet writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    /// File name without extension: `{apartment}_{area}_{YYYYMMDD}`
    pub file_stem: String,

    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// File name with the given extension (e.g., "xlsx").
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.file_stem)
    }

    /// JSON form for a host-side spreadsheet library.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize workbook: {e}")))
    }
}

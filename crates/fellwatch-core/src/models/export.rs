//! Tabular export model, independent of the spreadsheet writer.

use super::attribute::AttributeValue;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<AttributeValue>>,
}

impl ExportSheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self { name: name.into(), columns, rows: Vec::new() }
    }

    pub fn push_row(&mut self, row: Vec<AttributeValue>) {
        self.rows.push(row);
    }
}

/// Ordered collection of sheets written as one file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportWorkbook {
    pub sheets: Vec<ExportSheet>,
}

impl ExportWorkbook {
    pub fn sheet(&self, name: &str) -> Option<&ExportSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

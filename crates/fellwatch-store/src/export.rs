//! Spreadsheet export writer

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{AttributeValue, ExportWorkbook};
use fellwatch_core::ports::ExportWriter;

/// Writes each export sheet as a worksheet of one `.xlsx` file
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxExportWriter;

impl XlsxExportWriter {
    fn build(workbook: &ExportWorkbook) -> std::result::Result<Workbook, XlsxError> {
        let mut xlsx = Workbook::new();
        let header = Format::new().set_bold();

        for sheet in &workbook.sheets {
            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for (col, name) in sheet.columns.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, name, &header)?;
            }

            for (i, row) in sheet.rows.iter().enumerate() {
                let row_index = (i + 1) as u32;
                for (col, value) in row.iter().enumerate() {
                    let col = col as u16;
                    match value {
                        AttributeValue::Null => {}
                        AttributeValue::Bool(b) => {
                            worksheet.write_boolean(row_index, col, *b)?;
                        }
                        AttributeValue::Number(n) if n.is_finite() => {
                            worksheet.write_number(row_index, col, *n)?;
                        }
                        AttributeValue::Number(_) => {}
                        AttributeValue::Text(s) => {
                            worksheet.write_string(row_index, col, s)?;
                        }
                    }
                }
            }
        }

        Ok(xlsx)
    }
}

impl ExportWriter for XlsxExportWriter {
    fn write(&self, path: &Path, workbook: &ExportWorkbook) -> Result<()> {
        let mut xlsx = Self::build(workbook).map_err(|e| FellwatchError::Export(e.to_string()))?;

        xlsx.save(path)
            .map_err(|e| FellwatchError::Export(format!("Failed to save {}: {}", path.display(), e)))?;

        tracing::debug!(
            path = %path.display(),
            sheets = workbook.sheets.len(),
            "Wrote export workbook"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fellwatch_core::models::ExportSheet;

    #[test]
    fn test_write_workbook() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("analysis_results.xlsx");

        let mut sheet = ExportSheet::new(
            "AllFindings",
            vec!["Artnamn".to_string(), "Antal".to_string(), "Rödlistade".to_string()],
        );
        sheet.push_row(vec![
            AttributeValue::from("Tallticka"),
            AttributeValue::Number(3.0),
            AttributeValue::Null,
        ]);
        let workbook = ExportWorkbook { sheets: vec![sheet, ExportSheet::new("Matches_executed", vec![])] };

        XlsxExportWriter.write(&path, &workbook).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_invalid_sheet_name() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out.xlsx");
        let workbook = ExportWorkbook { sheets: vec![ExportSheet::new("bad/name", vec![])] };

        assert!(matches!(XlsxExportWriter.write(&path, &workbook), Err(FellwatchError::Export(_))));
    }
}

use std::path::Path;

use crate::error::Result;
use crate::models::ExportWorkbook;

/// Port for writing the detail export
pub trait ExportWriter {
    fn write(&self, path: &Path, workbook: &ExportWorkbook) -> Result<()>;
}

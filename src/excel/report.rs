//! Error report workbook

use crate::error::{ErrorRecord, SyncError, SyncResult};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

use super::KEY_HEADER;

/// Save `errors` as a two-column workbook: element id and description
pub fn write_error_report(errors: &[ErrorRecord], path: &Path) -> SyncResult<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    let result = (|| -> Result<(), XlsxError> {
        worksheet.set_name("Errors")?;
        worksheet.write_string_with_format(0, 0, KEY_HEADER, &bold)?;
        worksheet.write_string_with_format(0, 1, "Description", &bold)?;
        for (i, record) in errors.iter().enumerate() {
            let row = i as u32 + 1;
            worksheet.write_string(row, 0, &record.key)?;
            worksheet.write_string(row, 1, record.description())?;
        }
        worksheet.set_column_width(0, 16)?;
        worksheet.set_column_width(1, 90)?;
        Ok(())
    })();
    result.map_err(|e| SyncError::Export(format!("Failed to write error report: {}", e)))?;

    workbook.save(path).map_err(|e| match e {
        XlsxError::IoError(io) => SyncError::from_io(path, io),
        other => SyncError::Export(format!("Failed to save error report: {}", other)),
    })
}

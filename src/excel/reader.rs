//! Workbook reader: cell text via calamine, cell fill via umya-spreadsheet
//!
//! calamine does not expose styles, so the workbook is opened twice and the
//! two views are merged into one plain grid per sheet.

use crate::core::codec::format_number;
use crate::core::palette::parse_argb;
use crate::error::{SyncError, SyncResult};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::fs::File;
use std::path::Path;
use tracing::debug;

use super::column_letter;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    pub text: String,
    /// Fill RGB, when the cell has a parseable solid fill
    pub fill: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetCells {
    pub name: String,
    /// Rows from A1, each padded to the sheet's used width
    pub rows: Vec<Vec<CellData>>,
}

impl SheetCells {
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellData> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Every sheet of a workbook, in workbook order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookContents {
    pub sheets: Vec<SheetCells>,
}

impl WorkbookContents {
    pub fn sheet(&self, name: &str) -> Option<&SheetCells> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Read values and fills of every sheet
pub fn read_workbook(path: &Path) -> SyncResult<WorkbookContents> {
    // Surface "open in another application" before the parsers hide it
    File::open(path).map_err(|e| SyncError::from_io(path, e))?;

    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| SyncError::SpreadsheetRead(format!("Failed to open Excel file: {}", e)))?;
    let styled = umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| SyncError::SpreadsheetRead(format!("Failed to read cell styles: {}", e)))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| SyncError::SpreadsheetRead(format!("Sheet '{}': {}", name, e)))?;
        let fills = styled.get_sheet_by_name(&name);

        let mut rows = Vec::new();
        if let Some((last_row, last_col)) = range.end() {
            for r in 0..=last_row {
                let mut row = Vec::with_capacity(last_col as usize + 1);
                for c in 0..=last_col {
                    let text = range.get_value((r, c)).map(cell_text).unwrap_or_default();
                    let fill = fills.and_then(|sheet| {
                        let address = format!("{}{}", column_letter(c as usize), r + 1);
                        sheet.get_cell(address.as_str()).and_then(fill_rgb)
                    });
                    row.push(CellData { text, fill });
                }
                rows.push(row);
            }
        }

        debug!(sheet = %name, rows = rows.len(), "read sheet");
        sheets.push(SheetCells { name, rows });
    }

    Ok(WorkbookContents { sheets })
}

fn cell_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

/// Solid fills store the visible color as the pattern foreground
fn fill_rgb(cell: &umya_spreadsheet::Cell) -> Option<u32> {
    let pattern = cell.get_style().get_fill()?.get_pattern_fill()?;
    [pattern.get_foreground_color(), pattern.get_background_color()]
        .into_iter()
        .flatten()
        .find_map(|color| parse_argb(color.get_argb()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::palette::CellColor;
    use rust_xlsxwriter::{Color, Format, Workbook};
    use tempfile::TempDir;

    #[test]
    fn test_reads_text_and_fill() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("colors.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Walls").unwrap();
        let editable = Format::new().set_background_color(Color::RGB(CellColor::Editable.rgb()));
        sheet.write_string(0, 0, "Element ID").unwrap();
        sheet.write_number(1, 0, 100.0).unwrap();
        sheet
            .write_string_with_format(1, 1, "W1", &editable)
            .unwrap();
        sheet.write_string(1, 2, "plain").unwrap();
        workbook.save(&path).unwrap();

        let contents = read_workbook(&path).unwrap();
        let walls = contents.sheet("Walls").unwrap();
        assert_eq!(walls.cell(1, 0).unwrap().text, "100");
        let w1 = walls.cell(1, 1).unwrap();
        assert_eq!(w1.text, "W1");
        assert_eq!(w1.fill.and_then(CellColor::from_rgb), Some(CellColor::Editable));
        assert_eq!(walls.cell(1, 2).unwrap().fill.and_then(CellColor::from_rgb), None);
    }

    #[test]
    fn test_missing_file() {
        let result = read_workbook(Path::new("/nonexistent/book.xlsx"));
        assert!(matches!(result, Err(SyncError::Io(_))));
    }
}

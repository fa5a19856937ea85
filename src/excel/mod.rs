//! Excel import/export
//!
//! - Export: element grids or schedule snapshots → .xlsx with a color legend
//! - Import: .xlsx → per-row attribute updates, filtered by cell color

mod exporter;
mod grid;
mod importer;
mod reader;
mod report;

pub use exporter::{ExcelExporter, ExportSource};
pub use grid::{build_category_grid, GridCell, GridRow, GridSnapshot, HeaderCell};
pub use importer::{
    apply_row, plan_categories, plan_schedules, resolve_row_key, CellUpdate, ImportPlan,
    ImportReport, RowOutcome, RowUpdate, SheetPlan, WriteLog,
};
pub use reader::{read_workbook, CellData, SheetCells, WorkbookContents};
pub use report::write_error_report;

/// First sheet of every exported workbook
pub const LEGEND_SHEET: &str = "Color Legend";

/// Header of the key column in category sheets
pub const KEY_HEADER: &str = "Element ID";

/// Excel's sheet name length limit
pub const MAX_SHEET_NAME: usize = 31;

/// Sheet name for a category or schedule. Collisions after truncation are not
/// resolved here.
pub fn sheet_name(source: &str) -> String {
    source.chars().take(MAX_SHEET_NAME).collect()
}

/// Convert column index to Excel column letter (0→A, 1→B, 25→Z, 26→AA, etc.)
pub fn column_letter(n: usize) -> String {
    let mut result = String::new();
    let mut num = n;

    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_sheet_name_truncates_to_31_chars() {
        let long = "Structural Framing Elements By Level And Phase";
        assert_eq!(sheet_name(long).chars().count(), 31);
        assert_eq!(sheet_name(long), "Structural Framing Elements By ");
        assert_eq!(sheet_name("Walls"), "Walls");
    }
}

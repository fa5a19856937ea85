//! Excel exporter: grids and schedule snapshots → .xlsx

use crate::core::palette::{CellColor, HEADER_RGB, SUMMARY_RGB};
use crate::core::schedule::ScheduleSnapshot;
use crate::error::{SyncError, SyncResult};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::debug;

use super::grid::GridSnapshot;
use super::{sheet_name, KEY_HEADER, LEGEND_SHEET};

/// What a workbook is built from
#[derive(Debug, Clone)]
pub enum ExportSource {
    Categories(Vec<GridSnapshot>),
    Schedules(Vec<ScheduleSnapshot>),
}

/// Cell formats shared by every sheet of one workbook
struct Formats {
    header: Format,
    title: Format,
    summary: Format,
    cells: [Format; 4],
}

impl Formats {
    fn new() -> Self {
        let cell = |color: CellColor| {
            Format::new()
                .set_background_color(Color::RGB(color.rgb()))
                .set_border(FormatBorder::Thin)
        };
        Self {
            header: Format::new()
                .set_bold()
                .set_text_wrap()
                .set_align(FormatAlign::Top)
                .set_background_color(Color::RGB(HEADER_RGB))
                .set_border(FormatBorder::Thin),
            title: Format::new().set_bold().set_font_size(14),
            summary: Format::new()
                .set_italic()
                .set_background_color(Color::RGB(SUMMARY_RGB))
                .set_border(FormatBorder::Thin),
            cells: CellColor::ALL.map(cell),
        }
    }

    fn cell(&self, color: CellColor) -> &Format {
        let index = CellColor::ALL
            .iter()
            .position(|c| *c == color)
            .unwrap_or_default();
        &self.cells[index]
    }
}

/// Excel exporter for category grids and schedule snapshots
pub struct ExcelExporter {
    source: ExportSource,
}

impl ExcelExporter {
    /// Create a new Excel exporter
    pub fn new(source: ExportSource) -> Self {
        Self { source }
    }

    /// Write the workbook. The legend is always the first sheet.
    pub fn export(&self, output_path: &Path) -> SyncResult<()> {
        let mut workbook = Workbook::new();
        let formats = Formats::new();

        self.export_legend(&mut workbook, &formats)?;

        match &self.source {
            ExportSource::Categories(grids) => {
                for grid in grids {
                    self.export_grid(&mut workbook, &formats, grid)?;
                }
            }
            ExportSource::Schedules(snapshots) => {
                for snapshot in snapshots {
                    self.export_schedule(&mut workbook, &formats, snapshot)?;
                }
            }
        }

        workbook.save(output_path).map_err(|e| match e {
            XlsxError::IoError(io) => SyncError::from_io(output_path, io),
            other => SyncError::Export(format!("Failed to save Excel file: {}", other)),
        })?;

        debug!(path = %output_path.display(), "workbook saved");
        Ok(())
    }

    fn export_legend(&self, workbook: &mut Workbook, formats: &Formats) -> SyncResult<()> {
        let worksheet = new_sheet(workbook, LEGEND_SHEET)?;

        worksheet
            .write_string_with_format(0, 0, "Color", &formats.header)
            .map_err(write_error)?;
        worksheet
            .write_string_with_format(0, 1, "Meaning", &formats.header)
            .map_err(write_error)?;

        for (i, color) in CellColor::ALL.iter().enumerate() {
            let row = i as u32 + 1;
            worksheet
                .write_string_with_format(row, 0, color.label(), formats.cell(*color))
                .map_err(write_error)?;
            worksheet
                .write_string(row, 1, color.meaning())
                .map_err(write_error)?;
        }

        let note_row = CellColor::ALL.len() as u32 + 2;
        worksheet
            .write_string(
                note_row,
                0,
                "Only cells colored as Editable or Type parameter are written back on import.",
            )
            .map_err(write_error)?;

        worksheet.set_column_width(0, 18).map_err(write_error)?;
        worksheet.set_column_width(1, 80).map_err(write_error)?;
        Ok(())
    }

    /// One sheet per category: key column A, two-line headers in row 1
    fn export_grid(
        &self,
        workbook: &mut Workbook,
        formats: &Formats,
        grid: &GridSnapshot,
    ) -> SyncResult<()> {
        let worksheet = new_sheet(workbook, &grid.sheet_name)?;

        worksheet
            .write_string_with_format(0, 0, KEY_HEADER, &formats.header)
            .map_err(write_error)?;
        for (i, header) in grid.headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, i as u16 + 1, header.text(), &formats.header)
                .map_err(write_error)?;
        }

        for (r, row) in grid.rows.iter().enumerate() {
            let excel_row = r as u32 + 1;
            worksheet
                .write_number(excel_row, 0, row.key.0 as f64)
                .map_err(write_error)?;
            for (c, cell) in row.cells.iter().enumerate() {
                write_colored(
                    worksheet,
                    excel_row,
                    c as u16 + 1,
                    &cell.text,
                    formats.cell(cell.color),
                )?;
            }
        }

        worksheet.set_row_height(0, 32).map_err(write_error)?;
        worksheet.set_column_width(0, 12).map_err(write_error)?;
        for c in 0..grid.headers.len() {
            worksheet
                .set_column_width(c as u16 + 1, 22)
                .map_err(write_error)?;
        }
        worksheet.set_freeze_panes(1, 1).map_err(write_error)?;

        debug!(sheet = %grid.sheet_name, rows = grid.rows.len(), "exported category");
        Ok(())
    }

    /// One sheet per schedule: title row, optional header row, body, summary
    fn export_schedule(
        &self,
        workbook: &mut Workbook,
        formats: &Formats,
        snapshot: &ScheduleSnapshot,
    ) -> SyncResult<()> {
        let name = sheet_name(&snapshot.name);
        let worksheet = new_sheet(workbook, &name)?;
        let columns = snapshot.column_count().max(1) as u16;

        if columns > 1 {
            worksheet
                .merge_range(0, 0, 0, columns - 1, &snapshot.title, &formats.title)
                .map_err(write_error)?;
        } else {
            worksheet
                .write_string_with_format(0, 0, &snapshot.title, &formats.title)
                .map_err(write_error)?;
        }

        let mut row: u32 = 1;
        if !snapshot.headers.is_empty() {
            for (c, header) in snapshot.headers.iter().enumerate() {
                worksheet
                    .write_string_with_format(row, c as u16, header, &formats.header)
                    .map_err(write_error)?;
            }
            row += 1;
        }

        for body_row in &snapshot.body {
            for (c, text) in body_row.iter().enumerate() {
                let color = snapshot
                    .editability
                    .get(c)
                    .copied()
                    .unwrap_or(CellColor::ReadOnly);
                write_colored(worksheet, row, c as u16, text, formats.cell(color))?;
            }
            row += 1;
        }

        for summary_row in &snapshot.summary {
            for c in 0..columns {
                let text = summary_row.get(c as usize).map(String::as_str).unwrap_or("");
                write_colored(worksheet, row, c, text, &formats.summary)?;
            }
            row += 1;
        }

        for c in 0..columns {
            worksheet.set_column_width(c, 20).map_err(write_error)?;
        }
        let frozen = if snapshot.headers.is_empty() { 1 } else { 2 };
        worksheet.set_freeze_panes(frozen, 0).map_err(write_error)?;

        debug!(
            sheet = %name,
            rows = snapshot.body.len(),
            summary = snapshot.summary.len(),
            "exported schedule"
        );
        Ok(())
    }
}

fn new_sheet<'a>(workbook: &'a mut Workbook, name: &str) -> SyncResult<&'a mut Worksheet> {
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(name)
        .map_err(|e| SyncError::Export(format!("Failed to set worksheet name '{}': {}", name, e)))?;
    Ok(worksheet)
}

/// Empty cells still carry their fill, so the color survives the round trip
fn write_colored(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    text: &str,
    format: &Format,
) -> SyncResult<()> {
    if text.is_empty() {
        worksheet.write_blank(row, col, format).map_err(write_error)?;
    } else {
        worksheet
            .write_string_with_format(row, col, text, format)
            .map_err(write_error)?;
    }
    Ok(())
}

fn write_error(e: XlsxError) -> SyncError {
    SyncError::Export(format!("Failed to write cell: {}", e))
}

//! Excel importer: workbook rows → attribute writes
//!
//! Import runs in two halves. Planning reads the workbook and drops every cell
//! whose color says it cannot be written; it needs no host and runs on the
//! worker. [`apply_row`] resolves the row key and writes the remaining cells;
//! it runs wherever the host lives.

use crate::core::codec::{decode, encode, LinkLookup};
use crate::core::palette::{CellColor, HEADER_RGB, SUMMARY_RGB};
use crate::core::resolver::resolve;
use crate::error::{ErrorKind, ErrorRecord};
use crate::host::{HostDocument, ScheduleDefinition};
use crate::types::{EntityId, SlotRef, ValueKind};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::reader::{CellData, SheetCells, WorkbookContents};
use super::{sheet_name, LEGEND_SHEET};

/// One cell that passed the color filter
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    pub attribute: String,
    pub text: String,
}

/// One data row, ready to be applied to the host
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdate {
    pub sheet: String,
    /// 1-based row number as shown in Excel
    pub row: usize,
    pub key: String,
    /// Attribute matched against the key when it is neither an id nor a name
    pub key_attribute: String,
    pub cells: Vec<CellUpdate>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowOutcome {
    pub written: usize,
    pub skipped: usize,
    pub errors: Vec<ErrorRecord>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetPlan {
    pub name: String,
    pub rows: Vec<RowUpdate>,
}

/// Everything an import will attempt, decided before the host is touched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportPlan {
    pub sheets: Vec<SheetPlan>,
    /// Cells dropped by the color filter
    pub skipped: usize,
    /// Problems found while planning (missing schedule sheets)
    pub errors: Vec<ErrorRecord>,
}

impl ImportPlan {
    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }
}

/// Values slots held before the open transaction first wrote them.
///
/// A type attribute appears on every row of that type; later rows are
/// compared against the exported value, not the one an earlier row wrote.
#[derive(Debug, Clone, Default)]
pub struct WriteLog {
    before: HashMap<SlotRef, String>,
}

impl WriteLog {
    /// Forget everything; call at every transaction boundary
    pub fn clear(&mut self) {
        self.before.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty()
    }
}

/// Result of a whole import
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ImportReport {
    pub sheets: usize,
    pub rows: usize,
    pub written: usize,
    pub skipped: usize,
    pub errors: Vec<ErrorRecord>,
}

impl ImportReport {
    pub fn absorb(&mut self, outcome: RowOutcome) {
        self.rows += 1;
        self.written += outcome.written;
        self.skipped += outcome.skipped;
        self.errors.extend(outcome.errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Plan an import of category sheets.
///
/// Empty `categories` or `attributes` select everything in the workbook.
pub fn plan_categories(
    contents: &WorkbookContents,
    categories: &[String],
    attributes: &[String],
    fallback_key: &str,
) -> ImportPlan {
    let mut plan = ImportPlan::default();

    for sheet in &contents.sheets {
        if sheet.name == LEGEND_SHEET {
            continue;
        }
        if !categories.is_empty() && !categories.iter().any(|c| sheet_name(c) == sheet.name) {
            continue;
        }
        let Some(header) = sheet.rows.first() else {
            continue;
        };

        // Column index → attribute name, from the first line of each header
        let columns: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(col, cell)| {
                let name = cell.text.lines().next().unwrap_or("").trim();
                (!name.is_empty()).then(|| (col, name.to_string()))
            })
            .filter(|(_, name)| attributes.is_empty() || attributes.contains(name))
            .collect();

        let mut sheet_plan = SheetPlan {
            name: sheet.name.clone(),
            rows: Vec::new(),
        };
        for (r, row) in sheet.rows.iter().enumerate().skip(1) {
            if is_blank(row) {
                continue;
            }
            let cells = eligible_cells(row, &columns, &mut plan.skipped);
            sheet_plan.rows.push(RowUpdate {
                sheet: sheet.name.clone(),
                row: r + 1,
                key: key_text(row),
                key_attribute: fallback_key.to_string(),
                cells,
            });
        }

        debug!(sheet = %sheet.name, rows = sheet_plan.rows.len(), "planned category sheet");
        plan.sheets.push(sheet_plan);
    }

    plan
}

/// Plan an import of schedule sheets.
///
/// Column meaning comes from the live definitions, not the header text, since
/// schedule headings may be abbreviated. The first column is the row key and
/// is never written.
pub fn plan_schedules(contents: &WorkbookContents, definitions: &[ScheduleDefinition]) -> ImportPlan {
    let mut plan = ImportPlan::default();

    for definition in definitions {
        let Some(sheet) = find_schedule_sheet(contents, &definition.name) else {
            warn!(schedule = %definition.name, "no matching sheet in workbook");
            plan.errors.push(ErrorRecord::new(
                ErrorKind::SheetNotFound,
                definition.name.clone(),
                "",
                "no sheet for this schedule in the workbook",
            ));
            continue;
        };

        let columns: Vec<(usize, String)> = definition
            .fields
            .iter()
            .cloned()
            .enumerate()
            .skip(1)
            .collect();
        let key_attribute = definition.fields.first().cloned().unwrap_or_default();

        let mut sheet_plan = SheetPlan {
            name: sheet.name.clone(),
            rows: Vec::new(),
        };
        // Row 0 is the title
        for (r, row) in sheet.rows.iter().enumerate().skip(1) {
            if is_blank(row) || is_decoration(row) {
                continue;
            }
            let key = key_text(row);
            // Header row without the header fill, e.g. after a copy-paste
            if r == 1 && key == definition.heading(0) {
                continue;
            }
            let cells = eligible_cells(row, &columns, &mut plan.skipped);
            sheet_plan.rows.push(RowUpdate {
                sheet: sheet.name.clone(),
                row: r + 1,
                key,
                key_attribute: key_attribute.clone(),
                cells,
            });
        }

        debug!(sheet = %sheet.name, rows = sheet_plan.rows.len(), "planned schedule sheet");
        plan.sheets.push(sheet_plan);
    }

    plan
}

fn find_schedule_sheet<'a>(contents: &'a WorkbookContents, schedule: &str) -> Option<&'a SheetCells> {
    contents
        .sheet(schedule)
        .or_else(|| contents.sheet(&sheet_name(schedule)))
}

fn is_blank(row: &[CellData]) -> bool {
    row.iter().all(|c| c.text.trim().is_empty())
}

/// Header and summary rows are recognised by their fill
fn is_decoration(row: &[CellData]) -> bool {
    matches!(
        row.first().and_then(|c| c.fill),
        Some(HEADER_RGB) | Some(SUMMARY_RGB)
    )
}

fn key_text(row: &[CellData]) -> String {
    row.first().map(|c| c.text.trim().to_string()).unwrap_or_default()
}

/// Cells whose fill allows a write. A fill outside the palette (or none)
/// leaves the cell a candidate; the host still rejects read-only slots.
fn eligible_cells(row: &[CellData], columns: &[(usize, String)], skipped: &mut usize) -> Vec<CellUpdate> {
    let mut cells = Vec::with_capacity(columns.len());
    for (col, attribute) in columns {
        let Some(cell) = row.get(*col) else {
            continue;
        };
        if let Some(color) = cell.fill.and_then(CellColor::from_rgb) {
            if !color.is_writable() {
                *skipped += 1;
                continue;
            }
        }
        cells.push(CellUpdate {
            attribute: attribute.clone(),
            text: cell.text.clone(),
        });
    }
    cells
}

/// Find the element a row key refers to: numeric id, then display name, then
/// the value of `fallback_attribute`.
pub fn resolve_row_key<H: HostDocument + ?Sized>(
    host: &H,
    key: &str,
    fallback_attribute: &str,
) -> Option<EntityId> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    if let Ok(n) = key.parse::<i64>() {
        let id = EntityId(n);
        if host.exists(id) && !host.is_type(id) {
            return Some(id);
        }
    }
    if let Some(id) = host.find_by_name(key) {
        return Some(id);
    }
    if fallback_attribute.is_empty() {
        return None;
    }
    host.all_entities().into_iter().find(|&id| {
        resolve(host, id, fallback_attribute)
            .map(|slot| decode(host, &slot) == key)
            .unwrap_or(false)
    })
}

/// Apply one row inside the caller's open transaction.
///
/// Only cells whose text differs from the current value are written. Blank
/// cells clear text attributes and are ignored for every other kind. A slot
/// already written in this transaction is left alone when the cell still
/// shows its earlier value, and reported as a conflict when it shows a third.
pub fn apply_row<H: HostDocument + ?Sized>(
    host: &mut H,
    row: &RowUpdate,
    log: &mut WriteLog,
) -> RowOutcome {
    let mut outcome = RowOutcome::default();

    let Some(id) = resolve_row_key(&*host, &row.key, &row.key_attribute) else {
        outcome.errors.push(ErrorRecord::new(
            ErrorKind::RowKeyUnresolved,
            row.key.clone(),
            format!("{} row {}", row.sheet, row.row),
            "no element matches this key",
        ));
        return outcome;
    };

    for cell in &row.cells {
        let Some(slot) = resolve(&*host, id, &cell.attribute) else {
            outcome.skipped += 1;
            continue;
        };
        if slot.kind != ValueKind::Text && cell.text.trim().is_empty() {
            outcome.skipped += 1;
            continue;
        }
        let current = decode(&*host, &slot);
        if current == cell.text {
            outcome.skipped += 1;
            continue;
        }
        if let Some(before) = log.before.get(&slot.slot) {
            if *before == cell.text {
                outcome.skipped += 1;
            } else {
                warn!(element = %id, attribute = %cell.attribute, "conflicting write to shared value");
                outcome.errors.push(ErrorRecord::new(
                    ErrorKind::Conflict,
                    id.to_string(),
                    cell.attribute.clone(),
                    format!(
                        "'{}' conflicts with '{}' written by an earlier row of the same type",
                        cell.text, current
                    ),
                ));
            }
            continue;
        }
        match encode(host, &slot, &cell.text, LinkLookup::ByName) {
            Ok(()) => {
                log.before.insert(slot.slot.clone(), current);
                outcome.written += 1;
            }
            Err(err) => outcome.errors.push(ErrorRecord::codec(id.to_string(), &err)),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::reader::SheetCells;
    use crate::host::{Attribute, Element, MemoryDocument};
    use crate::types::AttrValue;
    use pretty_assertions::assert_eq;

    fn cell(text: &str, color: Option<CellColor>) -> CellData {
        CellData {
            text: text.to_string(),
            fill: color.map(CellColor::rgb),
        }
    }

    fn plain(text: &str) -> CellData {
        cell(text, None)
    }

    fn doc() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_element(
            Element::instance(100, "Wall 1", "Walls")
                .with(Attribute::new("Mark", AttrValue::Text(Some("W1".into()))))
                .with(Attribute::new("Count", AttrValue::Integer(3))),
        );
        doc.add_element(
            Element::instance(101, "Wall 2", "Walls")
                .with(Attribute::new("Mark", AttrValue::Text(Some("W2".into())))),
        );
        doc
    }

    fn row(key: &str, cells: &[(&str, &str)]) -> RowUpdate {
        RowUpdate {
            sheet: "Walls".to_string(),
            row: 2,
            key: key.to_string(),
            key_attribute: "Mark".to_string(),
            cells: cells
                .iter()
                .map(|(a, t)| CellUpdate {
                    attribute: a.to_string(),
                    text: t.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_row_key_resolution_order() {
        let doc = doc();
        assert_eq!(resolve_row_key(&doc, "100", "Mark"), Some(EntityId(100)));
        assert_eq!(resolve_row_key(&doc, "Wall 2", "Mark"), Some(EntityId(101)));
        assert_eq!(resolve_row_key(&doc, "W1", "Mark"), Some(EntityId(100)));
        assert_eq!(resolve_row_key(&doc, "W9", "Mark"), None);
        assert_eq!(resolve_row_key(&doc, "W1", ""), None);
        assert_eq!(resolve_row_key(&doc, "  ", "Mark"), None);
    }

    #[test]
    fn test_apply_row_writes_changed_cells_only() {
        let mut doc = doc();
        doc.begin_transaction("test").unwrap();
        let outcome = apply_row(
            &mut doc,
            &row("100", &[("Mark", "W1"), ("Count", "4")]),
            &mut WriteLog::default(),
        );
        doc.commit_transaction().unwrap();

        assert_eq!(outcome.written, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_apply_row_unresolved_key() {
        let mut doc = doc();
        doc.begin_transaction("test").unwrap();
        let outcome = apply_row(
            &mut doc,
            &row("9999", &[("Mark", "X")]),
            &mut WriteLog::default(),
        );
        doc.rollback_transaction();

        assert_eq!(outcome.written, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ErrorKind::RowKeyUnresolved);
        assert_eq!(outcome.errors[0].key, "9999");
    }

    #[test]
    fn test_apply_row_codec_error_keyed_by_id() {
        let mut doc = doc();
        doc.begin_transaction("test").unwrap();
        let outcome = apply_row(
            &mut doc,
            &row("W1", &[("Count", "many"), ("Mark", "W1-a")]),
            &mut WriteLog::default(),
        );
        doc.commit_transaction().unwrap();

        assert_eq!(outcome.written, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].key, "100");
        assert_eq!(outcome.errors[0].field, "Count");
    }

    /// Two walls sharing type 10, which carries Fire Rating
    fn typed_doc() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_element(
            Element::type_of(10, "Generic - 200mm", "Basic Wall", "Walls")
                .with(Attribute::new("Fire Rating", AttrValue::Text(Some("1 HR".into())))),
        );
        for (id, mark) in [(100, "W1"), (101, "W2")] {
            doc.add_element(
                Element::instance(id, format!("Wall {}", id), "Walls")
                    .with_type(10)
                    .with(Attribute::new("Mark", AttrValue::Text(Some(mark.into())))),
            );
        }
        doc
    }

    fn fire_rating(doc: &MemoryDocument) -> String {
        let slot = resolve(doc, EntityId(10), "Fire Rating").unwrap();
        decode(doc, &slot)
    }

    #[test]
    fn test_untouched_sibling_keeps_type_edit() {
        let mut doc = typed_doc();
        let mut log = WriteLog::default();
        doc.begin_transaction("test").unwrap();
        let first = apply_row(&mut doc, &row("100", &[("Fire Rating", "90 MIN")]), &mut log);
        let second = apply_row(&mut doc, &row("101", &[("Fire Rating", "1 HR")]), &mut log);
        doc.commit_transaction().unwrap();

        assert_eq!(first.written, 1);
        assert_eq!(second.written, 0);
        assert_eq!(second.skipped, 1);
        assert!(second.errors.is_empty());
        assert_eq!(fire_rating(&doc), "90 MIN");
    }

    #[test]
    fn test_conflicting_type_edits_reported() {
        let mut doc = typed_doc();
        let mut log = WriteLog::default();
        doc.begin_transaction("test").unwrap();
        apply_row(&mut doc, &row("100", &[("Fire Rating", "90 MIN")]), &mut log);
        let second = apply_row(&mut doc, &row("101", &[("Fire Rating", "2 HR")]), &mut log);
        doc.commit_transaction().unwrap();

        assert_eq!(second.written, 0);
        assert_eq!(second.errors.len(), 1);
        assert_eq!(second.errors[0].kind, ErrorKind::Conflict);
        assert_eq!(second.errors[0].key, "101");
        assert_eq!(second.errors[0].field, "Fire Rating");
        assert_eq!(fire_rating(&doc), "90 MIN");
    }

    #[test]
    fn test_cleared_log_compares_live_value() {
        let mut doc = typed_doc();
        let mut log = WriteLog::default();
        doc.begin_transaction("first").unwrap();
        apply_row(&mut doc, &row("100", &[("Fire Rating", "90 MIN")]), &mut log);
        doc.commit_transaction().unwrap();
        assert!(!log.is_empty());

        log.clear();
        doc.begin_transaction("second").unwrap();
        let outcome = apply_row(&mut doc, &row("101", &[("Fire Rating", "2 HR")]), &mut log);
        doc.commit_transaction().unwrap();
        assert_eq!(outcome.written, 1);
        assert_eq!(fire_rating(&doc), "2 HR");
    }

    #[test]
    fn test_numeric_key_skips_type_elements() {
        let doc = typed_doc();
        assert_eq!(resolve_row_key(&doc, "10", "Mark"), None);
        assert_eq!(resolve_row_key(&doc, "101", "Mark"), Some(EntityId(101)));
    }

    #[test]
    fn test_blank_cell_ignored_for_numbers() {
        let mut doc = doc();
        doc.begin_transaction("test").unwrap();
        let outcome = apply_row(
            &mut doc,
            &row("100", &[("Count", "")]),
            &mut WriteLog::default(),
        );
        doc.commit_transaction().unwrap();
        assert_eq!(outcome.written, 0);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_plan_categories_filters_by_color() {
        let contents = WorkbookContents {
            sheets: vec![
                SheetCells {
                    name: LEGEND_SHEET.to_string(),
                    rows: vec![vec![plain("Color"), plain("Meaning")]],
                },
                SheetCells {
                    name: "Walls".to_string(),
                    rows: vec![
                        vec![plain("Element ID"), plain("Mark\nInstance · Text"), plain("Area\nBuilt-in · Number")],
                        vec![
                            plain("100"),
                            cell("W1", Some(CellColor::Editable)),
                            cell("12", Some(CellColor::ReadOnly)),
                        ],
                        vec![plain(""), plain(""), plain("")],
                        vec![
                            plain("101"),
                            cell("", Some(CellColor::Unavailable)),
                            plain("7"),
                        ],
                    ],
                },
            ],
        };

        let plan = plan_categories(&contents, &[], &[], "Mark");
        assert_eq!(plan.sheets.len(), 1);
        assert_eq!(plan.skipped, 2);
        let rows = &plan.sheets[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].cells, vec![CellUpdate { attribute: "Mark".into(), text: "W1".into() }]);
        // No fill: still a candidate
        assert_eq!(rows[1].row, 4);
        assert_eq!(rows[1].cells[0].attribute, "Area");

        let only_area = plan_categories(&contents, &[], &["Area".to_string()], "Mark");
        assert_eq!(only_area.sheets[0].rows[0].cells.len(), 0);

        let doors = plan_categories(&contents, &["Doors".to_string()], &[], "Mark");
        assert!(doors.sheets.is_empty());
    }

    #[test]
    fn test_plan_schedules_uses_live_columns() {
        let definition = ScheduleDefinition {
            name: "Wall Schedule".into(),
            category: "Walls".into(),
            fields: vec!["Mark".into(), "Comments".into()],
            headings: vec!["Mark".into(), "Cmt".into()],
            grand_totals: true,
        };
        let header = |t: &str| CellData {
            text: t.to_string(),
            fill: Some(HEADER_RGB),
        };
        let summary = |t: &str| CellData {
            text: t.to_string(),
            fill: Some(SUMMARY_RGB),
        };
        let contents = WorkbookContents {
            sheets: vec![SheetCells {
                name: "Wall Schedule".into(),
                rows: vec![
                    vec![plain("Wall Schedule"), plain("")],
                    vec![header("Mark"), header("Cmt")],
                    vec![cell("W1", Some(CellColor::Editable)), cell("new", Some(CellColor::Editable))],
                    vec![summary("Grand total: 1"), summary("")],
                ],
            }],
        };

        let plan = plan_schedules(&contents, std::slice::from_ref(&definition));
        assert!(plan.errors.is_empty());
        let rows = &plan.sheets[0].rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "W1");
        assert_eq!(rows[0].key_attribute, "Mark");
        assert_eq!(rows[0].cells, vec![CellUpdate { attribute: "Comments".into(), text: "new".into() }]);

        let missing = plan_schedules(&WorkbookContents::default(), &[definition]);
        assert_eq!(missing.errors.len(), 1);
        assert_eq!(missing.errors[0].kind, ErrorKind::SheetNotFound);
    }
}

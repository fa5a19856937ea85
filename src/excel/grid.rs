//! Category grids: one sheet worth of values and colors, read from the host
//!
//! Grids are built on the thread that owns the host and handed to the
//! exporter as plain data.

use crate::core::codec::decode;
use crate::core::palette::{classify, CellColor};
use crate::core::resolver::resolve;
use crate::host::HostDocument;
use crate::types::EntityId;

use super::sheet_name;

/// Column header: attribute name plus a type/tier annotation taken from the
/// first element of the category
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub name: String,
    pub annotation: String,
}

impl HeaderCell {
    /// Two-line header text; the importer reads the first line back
    pub fn text(&self) -> String {
        format!("{}\n{}", self.name, self.annotation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub text: String,
    pub color: CellColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub key: EntityId,
    /// One cell per header, in header order
    pub cells: Vec<GridCell>,
}

/// Snapshot of one category sheet. Every row has exactly one cell per header.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSnapshot {
    pub sheet_name: String,
    pub category: String,
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<GridRow>,
}

impl GridSnapshot {
    /// Columns including the key column
    pub fn column_count(&self) -> usize {
        self.headers.len() + 1
    }
}

/// Build the grid for `entities` of one category. `on_row` runs once per
/// element, after its row is complete.
pub fn build_category_grid<H, F>(
    host: &H,
    category: &str,
    entities: &[EntityId],
    attributes: &[String],
    mut on_row: F,
) -> GridSnapshot
where
    H: HostDocument + ?Sized,
    F: FnMut(),
{
    let headers = attributes
        .iter()
        .map(|name| {
            let annotation = entities
                .first()
                .and_then(|&sample| resolve(host, sample, name))
                .map(|slot| slot.describe())
                .unwrap_or_else(|| CellColor::Unavailable.label().to_string());
            HeaderCell {
                name: name.clone(),
                annotation,
            }
        })
        .collect();

    let mut rows = Vec::with_capacity(entities.len());
    for &id in entities {
        let cells = attributes
            .iter()
            .map(|name| {
                let slot = resolve(host, id, name);
                GridCell {
                    color: classify(name, slot.as_ref()),
                    text: slot.map(|s| decode(host, &s)).unwrap_or_default(),
                }
            })
            .collect();
        rows.push(GridRow { key: id, cells });
        on_row();
    }

    GridSnapshot {
        sheet_name: sheet_name(category),
        category: category.to_string(),
        headers,
        rows,
    }
}

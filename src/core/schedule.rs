//! Schedule snapshots
//!
//! Schedules are read from the host on the coordination thread and copied
//! into plain values, so that workbook formatting can run elsewhere without
//! touching the host again.

use super::palette::{classify, CellColor};
use super::resolver::resolve;
use crate::host::HostDocument;
use tracing::{debug, warn};

/// A self-contained copy of one rendered schedule
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleSnapshot {
    pub name: String,
    pub title: String,
    /// Column headings; empty when headers were not requested
    pub headers: Vec<String>,
    /// Per-column editability, one entry per schedule field
    pub editability: Vec<CellColor>,
    /// Body text exactly as the host renders it
    pub body: Vec<Vec<String>>,
    /// Grand total rows; empty when totals were not requested
    pub summary: Vec<Vec<String>>,
}

impl ScheduleSnapshot {
    pub fn column_count(&self) -> usize {
        self.editability.len()
    }
}

/// Snapshot the named schedules. Unknown names are skipped with a warning.
///
/// Must run on the thread that owns the host.
pub fn extract<H: HostDocument + ?Sized>(
    host: &H,
    schedules: &[String],
    include_headers: bool,
    include_grand_totals: bool,
) -> Vec<ScheduleSnapshot> {
    let definitions = host.schedules();
    let mut snapshots = Vec::with_capacity(schedules.len());

    for name in schedules {
        let Some(definition) = definitions.iter().find(|d| &d.name == name) else {
            warn!(schedule = %name, "schedule not found, skipping");
            continue;
        };
        let Some(rendered) = host.render_schedule(name) else {
            warn!(schedule = %name, "schedule could not be rendered, skipping");
            continue;
        };

        // An empty schedule cannot prove any column editable
        let editability = match rendered.entities.first() {
            Some(&sample) => definition
                .fields
                .iter()
                .map(|field| classify(field, resolve(host, sample, field).as_ref()))
                .collect(),
            None => vec![CellColor::ReadOnly; definition.fields.len()],
        };

        debug!(
            schedule = %name,
            rows = rendered.body.len(),
            columns = definition.fields.len(),
            "extracted schedule"
        );

        snapshots.push(ScheduleSnapshot {
            name: name.clone(),
            title: rendered.title,
            headers: if include_headers {
                rendered.headers
            } else {
                Vec::new()
            },
            editability,
            body: rendered.body,
            summary: if include_grand_totals {
                rendered.summary
            } else {
                Vec::new()
            },
        });
    }

    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Attribute, Element, MemoryDocument, ScheduleDefinition};
    use crate::types::AttrValue;

    fn doc(with_walls: bool) -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_element(
            Element::type_of(10, "Generic - 200mm", "Basic Wall", "Walls")
                .with(Attribute::new("Fire Rating", AttrValue::Text(Some("1 HR".into())))),
        );
        if with_walls {
            doc.add_element(
                Element::instance(100, "Wall 1", "Walls")
                    .with_type(10)
                    .with(Attribute::new("Mark", AttrValue::Text(Some("W1".into()))))
                    .with(Attribute::new("Length", AttrValue::Real(20.0)).read_only()),
            );
        }
        doc.add_schedule(ScheduleDefinition {
            name: "Wall Schedule".into(),
            category: "Walls".into(),
            fields: vec![
                "Mark".into(),
                "Fire Rating".into(),
                "Length".into(),
                "Family and Type".into(),
                "Acoustic".into(),
            ],
            headings: vec!["Mark".into(), "FR".into()],
            grand_totals: true,
        });
        doc
    }

    #[test]
    fn test_editability_from_sample_element() {
        let snapshots = extract(&doc(true), &["Wall Schedule".to_string()], true, true);
        assert_eq!(snapshots.len(), 1);
        let snapshot = &snapshots[0];
        assert_eq!(
            snapshot.editability,
            vec![
                CellColor::Editable,
                CellColor::InheritedFromType,
                CellColor::ReadOnly,
                CellColor::ReadOnly,
                CellColor::Unavailable,
            ]
        );
        assert_eq!(snapshot.headers[1], "FR");
        assert_eq!(snapshot.headers[2], "Length");
        assert_eq!(snapshot.body[0][0], "W1");
        assert_eq!(snapshot.summary[0][0], "Grand total: 1");
    }

    #[test]
    fn test_empty_schedule_defaults_to_read_only() {
        let snapshots = extract(&doc(false), &["Wall Schedule".to_string()], true, true);
        assert!(snapshots[0].body.is_empty());
        assert!(snapshots[0]
            .editability
            .iter()
            .all(|c| *c == CellColor::ReadOnly));
    }

    #[test]
    fn test_headers_and_totals_optional() {
        let snapshots = extract(&doc(true), &["Wall Schedule".to_string()], false, false);
        assert!(snapshots[0].headers.is_empty());
        assert!(snapshots[0].summary.is_empty());
        assert_eq!(snapshots[0].column_count(), 5);
    }

    #[test]
    fn test_unknown_schedule_skipped() {
        let snapshots = extract(&doc(true), &["Door Schedule".to_string()], true, true);
        assert!(snapshots.is_empty());
    }
}

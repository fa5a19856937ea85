//! Project file writing: [`MemoryDocument`] → YAML

use crate::error::{SyncError, SyncResult};
use crate::host::{Attribute, Element, MemoryDocument};
use crate::parser::{AttributeRecord, DocumentFile, ElementRecord, NamedItemRecord, ViewRecord};
use crate::types::AttrValue;
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Write the document back to `path`.
/// Creates a backup (.yaml.bak) of the existing file before writing.
pub fn write_document(path: &Path, doc: &MemoryDocument) -> SyncResult<()> {
    if path.exists() {
        let backup_path = path.with_extension("yaml.bak");
        fs::copy(path, &backup_path).map_err(|e| SyncError::from_io(path, e))?;
        debug!(backup = %backup_path.display(), "backup written");
    }

    let content = serde_yaml::to_string(&document_file(doc))?;
    fs::write(path, content).map_err(|e| SyncError::from_io(path, e))?;
    Ok(())
}

/// On-disk form of a document
pub fn document_file(doc: &MemoryDocument) -> DocumentFile {
    DocumentFile {
        worksets: doc
            .worksets()
            .iter()
            .map(|w| NamedItemRecord {
                id: w.id.0,
                name: w.name.clone(),
            })
            .collect(),
        views: doc
            .views()
            .iter()
            .map(|v| ViewRecord {
                name: v.name.clone(),
                elements: v.elements.iter().map(|id| id.0).collect(),
            })
            .collect(),
        elements: doc.elements().iter().map(element_record).collect(),
        schedules: doc.schedule_definitions().to_vec(),
    }
}

fn element_record(element: &Element) -> ElementRecord {
    ElementRecord {
        id: element.id.0,
        name: element.name.clone(),
        category: element.category.clone(),
        type_id: element.type_id.map(|t| t.0),
        family: element.family.clone(),
        is_type: element.is_type,
        attributes: element.attributes.iter().map(attribute_record).collect(),
    }
}

/// Kinds are always written out so that reals like `3.0` survive a reload
fn attribute_record(attribute: &Attribute) -> AttributeRecord {
    let value = match &attribute.value {
        AttrValue::Text(None) => Value::Null,
        AttrValue::Text(Some(s)) => Value::String(s.clone()),
        AttrValue::Integer(n) => Value::Number((*n).into()),
        AttrValue::Real(x) => Value::Number((*x).into()),
        AttrValue::Link(id) => Value::Number(id.0.into()),
    };
    AttributeRecord {
        name: attribute.name.clone(),
        builtin: attribute.builtin,
        kind: Some(attribute.value.storage()),
        value,
        read_only: attribute.read_only,
        unit: attribute.unit,
    }
}

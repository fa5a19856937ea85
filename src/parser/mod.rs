//! Project file parsing: YAML → [`MemoryDocument`]
//!
//! ```yaml
//! worksets:
//!   - { id: 1, name: Shared Levels }
//! elements:
//!   - id: 10
//!     name: Generic - 200mm
//!     category: Walls
//!     family: Basic Wall
//!     is_type: true
//!     attributes:
//!       - { name: Width, builtin: wall_attr_width_param, kind: real, value: 0.656, unit: mm }
//!   - id: 100
//!     name: Wall 1
//!     category: Walls
//!     type_id: 10
//!     attributes:
//!       - { name: Mark, value: W1 }
//! schedules:
//!   - { name: Wall Schedule, category: Walls, fields: [Mark, Width] }
//! ```

use crate::core::names::WellKnown;
use crate::core::units::DisplayUnit;
use crate::error::{SyncError, SyncResult};
use crate::host::{Attribute, Element, MemoryDocument, ScheduleDefinition, View};
use crate::types::{AttrValue, EntityId, StorageKind};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

/// On-disk layout of a project file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentFile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub worksets: Vec<NamedItemRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<ViewRecord>,
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<ScheduleDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedItemRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub name: String,
    #[serde(default)]
    pub elements: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_type: bool,
    #[serde(default)]
    pub attributes: Vec<AttributeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<WellKnown>,
    /// Storage kind; inferred from `value` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StorageKind>,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<DisplayUnit>,
}

/// Parse a project file into a document
pub fn parse_document(path: &Path) -> SyncResult<MemoryDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| SyncError::from_io(path, e))?;
    parse_document_str(&content)
}

pub fn parse_document_str(content: &str) -> SyncResult<MemoryDocument> {
    let file: DocumentFile = serde_yaml::from_str(content)?;
    build_document(file)
}

fn build_document(file: DocumentFile) -> SyncResult<MemoryDocument> {
    let mut doc = MemoryDocument::new();

    for workset in file.worksets {
        doc.add_workset(workset.id, workset.name);
    }

    for record in file.elements {
        if doc.element(EntityId(record.id)).is_some() {
            return Err(SyncError::Parse(format!(
                "Duplicate element id {}",
                record.id
            )));
        }
        let mut element = if record.is_type {
            Element::type_of(
                record.id,
                record.name,
                record.family.unwrap_or_default(),
                record.category,
            )
        } else {
            Element::instance(record.id, record.name, record.category)
        };
        if let Some(type_id) = record.type_id {
            element = element.with_type(type_id);
        }
        for attribute in record.attributes {
            element = element.with(build_attribute(record.id, attribute)?);
        }
        doc.add_element(element);
    }

    // Type references are checked once every element is known
    for element in doc.elements() {
        if let Some(type_id) = element.type_id {
            let valid = doc.element(type_id).is_some_and(|t| t.is_type);
            if !valid {
                return Err(SyncError::Parse(format!(
                    "Element {} refers to missing type {}",
                    element.id, type_id
                )));
            }
        }
    }

    for view in file.views {
        doc.add_view(View {
            name: view.name,
            elements: view.elements.into_iter().map(EntityId).collect(),
        });
    }

    for schedule in file.schedules {
        doc.add_schedule(schedule);
    }

    Ok(doc)
}

fn build_attribute(owner: i64, record: AttributeRecord) -> SyncResult<Attribute> {
    let value = convert_value(&record.value, record.kind).ok_or_else(|| {
        SyncError::Parse(format!(
            "Element {}: attribute '{}' has value {:?} that does not fit kind {}",
            owner,
            record.name,
            record.value,
            record.kind.map(StorageKind::name).unwrap_or("(inferred)")
        ))
    })?;

    let mut attribute = Attribute::new(record.name, value);
    if let Some(builtin) = record.builtin {
        attribute = attribute.builtin(builtin);
    }
    if let Some(unit) = record.unit {
        attribute = attribute.unit(unit);
    }
    if record.read_only {
        attribute = attribute.read_only();
    }
    Ok(attribute)
}

/// YAML scalar → stored value. Booleans become 1/0 integers, as the host
/// stores them.
fn convert_value(value: &Value, kind: Option<StorageKind>) -> Option<AttrValue> {
    match kind {
        None => match value {
            Value::Null => Some(AttrValue::Text(None)),
            Value::Bool(b) => Some(AttrValue::Integer(i64::from(*b))),
            Value::Number(n) => n
                .as_i64()
                .map(AttrValue::Integer)
                .or_else(|| n.as_f64().map(AttrValue::Real)),
            Value::String(s) => Some(AttrValue::Text(Some(s.clone()))),
            _ => None,
        },
        Some(StorageKind::Text) => match value {
            Value::Null => Some(AttrValue::Text(None)),
            Value::String(s) => Some(AttrValue::Text(Some(s.clone()))),
            Value::Number(n) => Some(AttrValue::Text(Some(n.to_string()))),
            Value::Bool(b) => Some(AttrValue::Text(Some(b.to_string()))),
            _ => None,
        },
        Some(StorageKind::Integer) => match value {
            Value::Bool(b) => Some(AttrValue::Integer(i64::from(*b))),
            Value::Number(n) => n.as_i64().map(AttrValue::Integer),
            _ => None,
        },
        Some(StorageKind::Real) => match value {
            Value::Number(n) => n.as_f64().map(AttrValue::Real),
            _ => None,
        },
        Some(StorageKind::Link) => match value {
            Value::Null => Some(AttrValue::Link(EntityId::INVALID)),
            Value::Number(n) => n.as_i64().map(|id| AttrValue::Link(EntityId(id))),
            _ => None,
        },
    }
}

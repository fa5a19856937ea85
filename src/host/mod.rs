//! Host document boundary
//!
//! The CAD document is an external collaborator. Everything the sync engine
//! needs from it goes through [`HostDocument`]: element enumeration, attribute
//! lookup by name or built-in id, reads, writes inside a transaction, and the
//! host's own rendering of schedules.

mod memory;

pub use memory::{Attribute, Element, MemoryDocument, NamedItem, View};

use crate::core::names::WellKnown;
use crate::error::HostError;
use crate::types::{AttrValue, AttributeInfo, EntityId, SlotRef};
use serde::{Deserialize, Serialize};

/// Which elements an export covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Document,
    /// Only elements visible in the named view
    View(String),
}

/// A schedule as defined in the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDefinition {
    pub name: String,
    pub category: String,
    /// Attribute names, in column order
    pub fields: Vec<String>,
    /// Column headings as displayed; may abbreviate the field names
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub grand_totals: bool,
}

impl ScheduleDefinition {
    pub fn heading(&self, index: usize) -> &str {
        self.headings
            .get(index)
            .or_else(|| self.fields.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A schedule exactly as the host renders it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedSchedule {
    pub title: String,
    pub headers: Vec<String>,
    pub body: Vec<Vec<String>>,
    pub summary: Vec<Vec<String>>,
    /// Elements listed in the body, in row order
    pub entities: Vec<EntityId>,
}

/// Read/write attribute store provided by the host application.
///
/// Calls must be made from the coordination thread; implementations need not
/// be `Send` or `Sync`.
pub trait HostDocument {
    /// Category names present in the document
    fn categories(&self) -> Vec<String>;

    /// Instances of `category` within `scope`, in document order
    fn entities(&self, category: &str, scope: &Scope) -> Vec<EntityId>;

    /// Every instance in the document, in document order
    fn all_entities(&self) -> Vec<EntityId>;

    fn exists(&self, id: EntityId) -> bool;

    /// True for type (definition) elements, which are never rows of a sheet
    fn is_type(&self, id: EntityId) -> bool;

    fn category_of(&self, id: EntityId) -> Option<String>;

    /// The type (definition) an instance was placed from
    fn type_of(&self, id: EntityId) -> Option<EntityId>;

    /// Name shown to users for an element or a named item such as a workset
    fn display_name(&self, id: EntityId) -> Option<String>;

    fn find_by_name(&self, name: &str) -> Option<EntityId>;

    /// Exact-name lookup of a user-visible attribute on one element
    fn lookup_named(&self, id: EntityId, name: &str) -> Option<AttributeInfo>;

    /// Built-in attribute lookup on one element
    fn lookup_builtin(&self, id: EntityId, key: WellKnown) -> Option<AttributeInfo>;

    fn read(&self, slot: &SlotRef) -> Option<AttrValue>;

    /// Store a value. Only valid inside a transaction.
    fn write(&mut self, slot: &SlotRef, value: AttrValue) -> Result<(), HostError>;

    /// Resolve a name within the sub-collection a link slot points into
    /// (worksets for the workset attribute). `None` when the slot has no
    /// named collection or the name is unknown.
    fn named_link(&self, slot: &SlotRef, name: &str) -> Option<EntityId>;

    fn begin_transaction(&mut self, name: &str) -> Result<(), HostError>;

    fn commit_transaction(&mut self) -> Result<(), HostError>;

    fn rollback_transaction(&mut self);

    fn schedules(&self) -> Vec<ScheduleDefinition>;

    fn render_schedule(&self, name: &str) -> Option<RenderedSchedule>;
}

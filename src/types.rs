use crate::core::names::WellKnown;
use crate::core::units::DisplayUnit;
use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Element handles
//==============================================================================

/// Opaque handle into the host document. Negative ids mean "no element".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    pub const INVALID: EntityId = EntityId(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//==============================================================================
// Attribute storage
//==============================================================================

/// How the host physically stores an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Text,
    Integer,
    Real,
    #[serde(alias = "entity_link")]
    Link,
}

impl StorageKind {
    pub fn name(self) -> &'static str {
        match self {
            StorageKind::Text => "Text",
            StorageKind::Integer => "Integer",
            StorageKind::Real => "Number",
            StorageKind::Link => "ElementId",
        }
    }
}

/// A stored value. Real values are in the host's internal units.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(Option<String>),
    Integer(i64),
    Real(f64),
    Link(EntityId),
}

impl AttrValue {
    pub fn storage(&self) -> StorageKind {
        match self {
            AttrValue::Text(_) => StorageKind::Text,
            AttrValue::Integer(_) => StorageKind::Integer,
            AttrValue::Real(_) => StorageKind::Real,
            AttrValue::Link(_) => StorageKind::Link,
        }
    }
}

/// Identifies a slot on one element: either a free-text name or a built-in id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrKey {
    Named(String),
    BuiltIn(WellKnown),
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrKey::Named(name) => write!(f, "{}", name),
            AttrKey::BuiltIn(id) => write!(f, "{}", id.as_str()),
        }
    }
}

/// A concrete slot: which element owns it and under which key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub owner: EntityId,
    pub key: AttrKey,
}

/// What the host reports about a slot it found
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub key: AttrKey,
    pub storage: StorageKind,
    pub read_only: bool,
    pub unit: Option<DisplayUnit>,
}

//==============================================================================
// Resolution results
//==============================================================================

/// Which lookup produced a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Exact name on the instance
    Instance,
    /// Exact name on the instance's type
    Type,
    /// Built-in id found on the instance
    BuiltInInstance,
    /// Built-in id found on the type
    BuiltInType,
}

impl Tier {
    pub fn is_type_level(self) -> bool {
        matches!(self, Tier::Type | Tier::BuiltInType)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Instance => "Instance",
            Tier::Type => "Type",
            Tier::BuiltInInstance => "Built-in",
            Tier::BuiltInType => "Built-in (Type)",
        }
    }
}

/// Codec variant selected for a slot at resolution time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Integer,
    BooleanLike,
    Real,
    EntityLink,
}

impl ValueKind {
    pub fn label(self) -> &'static str {
        match self {
            ValueKind::Text => "Text",
            ValueKind::Integer => "Integer",
            ValueKind::BooleanLike => "Yes/No",
            ValueKind::Real => "Number",
            ValueKind::EntityLink => "ElementId",
        }
    }
}

/// A resolved attribute. Valid only until the element set changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlot {
    /// Name the caller asked for
    pub name: String,
    pub slot: SlotRef,
    pub tier: Tier,
    pub kind: ValueKind,
    pub read_only: bool,
    pub unit: Option<DisplayUnit>,
}

impl ResolvedSlot {
    /// Header annotation: "Type · Number (mm)"
    pub fn describe(&self) -> String {
        match self.unit {
            Some(unit) => format!("{} · {} ({})", self.tier.label(), self.kind.label(), unit.symbol()),
            None => format!("{} · {}", self.tier.label(), self.kind.label()),
        }
    }
}

//! Attribute name → slot resolution
//!
//! Tiers are tried in order and the first hit wins:
//! 1. exact name on the instance
//! 2. exact name on the instance's type
//! 3. the built-in name table, on the instance and then on the type
//!
//! A miss on every tier is a normal outcome (the element simply does not have
//! the attribute) and is returned as `None`.

use super::names::{name_table, WellKnown};
use crate::host::HostDocument;
use crate::types::{AttrKey, AttributeInfo, EntityId, ResolvedSlot, SlotRef, StorageKind, Tier, ValueKind};

/// Substrings that mark an integer attribute as a yes/no flag
const BOOLEAN_HINTS: [&str; 6] = ["yes", "no", "structural", "bearing", "enabled", "disabled"];

/// Resolve `name` on element `id`
pub fn resolve<H: HostDocument + ?Sized>(host: &H, id: EntityId, name: &str) -> Option<ResolvedSlot> {
    if let Some(info) = host.lookup_named(id, name) {
        return Some(slot(name, id, info, Tier::Instance));
    }

    let type_id = host.type_of(id).filter(|t| host.exists(*t));
    if let Some(type_id) = type_id {
        if let Some(info) = host.lookup_named(type_id, name) {
            return Some(slot(name, type_id, info, Tier::Type));
        }
    }

    let category = host.category_of(id);
    let builtin = name_table().lookup(category.as_deref(), name)?;

    if let Some(info) = host.lookup_builtin(id, builtin) {
        return Some(slot(name, id, info, Tier::BuiltInInstance));
    }
    type_id.and_then(|type_id| {
        host.lookup_builtin(type_id, builtin)
            .map(|info| slot(name, type_id, info, Tier::BuiltInType))
    })
}

fn slot(name: &str, owner: EntityId, info: AttributeInfo, tier: Tier) -> ResolvedSlot {
    let builtin = match &info.key {
        AttrKey::BuiltIn(id) => Some(*id),
        AttrKey::Named(_) => None,
    };
    ResolvedSlot {
        name: name.to_string(),
        kind: value_kind(info.storage, name, builtin),
        slot: SlotRef {
            owner,
            key: info.key,
        },
        tier,
        read_only: info.read_only,
        unit: info.unit,
    }
}

/// Pick the codec variant for a slot
pub fn value_kind(storage: StorageKind, name: &str, builtin: Option<WellKnown>) -> ValueKind {
    match storage {
        StorageKind::Text => ValueKind::Text,
        StorageKind::Real => ValueKind::Real,
        StorageKind::Link => ValueKind::EntityLink,
        StorageKind::Integer => {
            if builtin.is_some_and(WellKnown::is_boolean) || is_boolean_name(name) {
                ValueKind::BooleanLike
            } else {
                ValueKind::Integer
            }
        }
    }
}

pub fn is_boolean_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    BOOLEAN_HINTS.iter().any(|hint| lower.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Attribute, Element, MemoryDocument};
    use crate::types::AttrValue;

    fn doc() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_element(
            Element::type_of(10, "Generic - 200mm", "Basic Wall", "Walls")
                .with(Attribute::new("Fire Rating", AttrValue::Text(Some("1 HR".into()))))
                .with(Attribute::new("Mark", AttrValue::Text(Some("TYPE".into()))))
                .with(
                    Attribute::new("Wall Width", AttrValue::Real(0.656))
                        .builtin(WellKnown::WallAttrWidthParam),
                ),
        );
        doc.add_element(
            Element::instance(100, "Wall 1", "Walls")
                .with_type(10)
                .with(Attribute::new("Mark", AttrValue::Text(Some("W1".into()))))
                .with(
                    Attribute::new("Unconnected Height", AttrValue::Real(10.0))
                        .builtin(WellKnown::WallUserHeightParam),
                )
                .with(Attribute::new("Load Bearing", AttrValue::Integer(1))),
        );
        doc
    }

    #[test]
    fn test_instance_tier_wins_over_type() {
        let slot = resolve(&doc(), EntityId(100), "Mark").unwrap();
        assert_eq!(slot.tier, Tier::Instance);
        assert_eq!(slot.slot.owner, EntityId(100));
    }

    #[test]
    fn test_type_tier() {
        let slot = resolve(&doc(), EntityId(100), "Fire Rating").unwrap();
        assert_eq!(slot.tier, Tier::Type);
        assert_eq!(slot.slot.owner, EntityId(10));
        assert_eq!(slot.kind, ValueKind::Text);
    }

    #[test]
    fn test_builtin_tier_on_instance() {
        let slot = resolve(&doc(), EntityId(100), "Height").unwrap();
        assert_eq!(slot.tier, Tier::BuiltInInstance);
        assert_eq!(slot.slot.key, AttrKey::BuiltIn(WellKnown::WallUserHeightParam));
    }

    #[test]
    fn test_builtin_tier_falls_back_to_type() {
        let doc = doc();
        let width = resolve(&doc, EntityId(100), "Width").unwrap();
        assert_eq!(width.tier, Tier::BuiltInType);
        assert_eq!(width.slot.owner, EntityId(10));
        // the stored name itself is an ordinary tier-2 hit
        assert_eq!(resolve(&doc, EntityId(100), "Wall Width").unwrap().tier, Tier::Type);
        // "Family" is only reachable as a built-in; the instance derives it
        let family = resolve(&doc, EntityId(100), "Family").unwrap();
        assert_eq!(family.tier, Tier::BuiltInInstance);
        assert!(family.read_only);
    }

    #[test]
    fn test_absent_is_none() {
        assert!(resolve(&doc(), EntityId(100), "Acoustic Rating").is_none());
        assert!(resolve(&doc(), EntityId(999), "Mark").is_none());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let doc = doc();
        let first = resolve(&doc, EntityId(100), "Height");
        let second = resolve(&doc, EntityId(100), "Height");
        assert_eq!(first, second);
    }

    #[test]
    fn test_boolean_heuristic_selects_kind() {
        let slot = resolve(&doc(), EntityId(100), "Load Bearing").unwrap();
        assert_eq!(slot.kind, ValueKind::BooleanLike);
        assert_eq!(
            value_kind(StorageKind::Integer, "Count", None),
            ValueKind::Integer
        );
        assert_eq!(
            value_kind(StorageKind::Integer, "Flag", Some(WellKnown::FloorParamIsStructural)),
            ValueKind::BooleanLike
        );
    }
}

//! In-memory host document
//!
//! Backs the CLI (loaded from a YAML project file) and the test-suite. It
//! behaves like a real host where it matters to the sync engine: writes need
//! an open transaction, rollback restores the state at `begin_transaction`,
//! and identity built-ins are derived from the element's type.

use super::{HostDocument, RenderedSchedule, ScheduleDefinition, Scope};
use crate::core::codec;
use crate::core::names::WellKnown;
use crate::core::resolver;
use crate::core::units::DisplayUnit;
use crate::error::HostError;
use crate::types::{AttrKey, AttrValue, AttributeInfo, EntityId, SlotRef, StorageKind};
use std::collections::HashMap;

/// A stored attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub builtin: Option<WellKnown>,
    pub value: AttrValue,
    pub read_only: bool,
    pub unit: Option<DisplayUnit>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: AttrValue) -> Self {
        Self {
            name: name.into(),
            builtin: None,
            value,
            read_only: false,
            unit: None,
        }
    }

    pub fn builtin(mut self, id: WellKnown) -> Self {
        self.builtin = Some(id);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn unit(mut self, unit: DisplayUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    fn info(&self, key: AttrKey) -> AttributeInfo {
        AttributeInfo {
            key,
            storage: self.value.storage(),
            read_only: self.read_only,
            unit: self.unit,
        }
    }
}

/// An instance or a type
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: EntityId,
    pub name: String,
    pub category: String,
    pub type_id: Option<EntityId>,
    /// Family name; meaningful on types
    pub family: Option<String>,
    pub is_type: bool,
    pub attributes: Vec<Attribute>,
}

impl Element {
    pub fn instance(id: i64, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: EntityId(id),
            name: name.into(),
            category: category.into(),
            type_id: None,
            family: None,
            is_type: false,
            attributes: Vec::new(),
        }
    }

    pub fn type_of(
        id: i64,
        name: impl Into<String>,
        family: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId(id),
            name: name.into(),
            category: category.into(),
            type_id: None,
            family: Some(family.into()),
            is_type: true,
            attributes: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_id: i64) -> Self {
        self.type_id = Some(EntityId(type_id));
        self
    }

    pub fn with(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    fn named(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn by_builtin(&self, id: WellKnown) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.builtin == Some(id))
    }

    fn slot_mut(&mut self, key: &AttrKey) -> Option<&mut Attribute> {
        match key {
            AttrKey::Named(name) => self.attributes.iter_mut().find(|a| &a.name == name),
            AttrKey::BuiltIn(id) => self.attributes.iter_mut().find(|a| a.builtin == Some(*id)),
        }
    }
}

/// A named sub-collection item (worksets)
#[derive(Debug, Clone, PartialEq)]
pub struct NamedItem {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub elements: Vec<EntityId>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: Vec<Element>,
    index: HashMap<EntityId, usize>,
    worksets: Vec<NamedItem>,
    views: Vec<View>,
    schedules: Vec<ScheduleDefinition>,
    /// State at `begin_transaction`, present while a transaction is open
    backup: Option<Vec<Element>>,
    commits: usize,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(&mut self, element: Element) {
        self.index.insert(element.id, self.elements.len());
        self.elements.push(element);
    }

    pub fn add_workset(&mut self, id: i64, name: impl Into<String>) {
        self.worksets.push(NamedItem {
            id: EntityId(id),
            name: name.into(),
        });
    }

    pub fn add_view(&mut self, view: View) {
        self.views.push(view);
    }

    pub fn add_schedule(&mut self, schedule: ScheduleDefinition) {
        self.schedules.push(schedule);
    }

    pub fn element(&self, id: EntityId) -> Option<&Element> {
        self.index.get(&id).map(|&i| &self.elements[i])
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn worksets(&self) -> &[NamedItem] {
        &self.worksets
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn schedule_definitions(&self) -> &[ScheduleDefinition] {
        &self.schedules
    }

    pub fn in_transaction(&self) -> bool {
        self.backup.is_some()
    }

    /// Number of committed transactions
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    fn element_mut(&mut self, id: EntityId) -> Option<&mut Element> {
        match self.index.get(&id) {
            Some(&i) => Some(&mut self.elements[i]),
            None => None,
        }
    }

    fn type_element(&self, id: EntityId) -> Option<&Element> {
        self.element(id)
            .and_then(|e| e.type_id)
            .and_then(|t| self.element(t))
    }

    /// Identity built-ins derived from the type rather than stored
    fn derived(&self, id: EntityId, key: WellKnown) -> Option<(AttrValue, bool)> {
        let element = self.element(id)?;
        if element.is_type {
            return match key {
                WellKnown::ElemFamilyParam => {
                    Some((AttrValue::Text(element.family.clone()), true))
                }
                _ => None,
            };
        }
        let ty = self.type_element(id)?;
        match key {
            WellKnown::ElemFamilyParam => Some((AttrValue::Text(ty.family.clone()), true)),
            WellKnown::ElemTypeParam => Some((AttrValue::Link(ty.id), false)),
            WellKnown::ElemFamilyAndTypeParam => {
                let text = match &ty.family {
                    Some(family) => format!("{}: {}", family, ty.name),
                    None => ty.name.clone(),
                };
                Some((AttrValue::Text(Some(text)), false))
            }
            _ => None,
        }
    }

    fn builtin_of(&self, slot: &SlotRef) -> Option<WellKnown> {
        match &slot.key {
            AttrKey::BuiltIn(id) => Some(*id),
            AttrKey::Named(name) => self
                .element(slot.owner)
                .and_then(|e| e.named(name))
                .and_then(|a| a.builtin),
        }
    }

    fn retype(&mut self, id: EntityId, target: EntityId) -> Result<(), HostError> {
        let category = self
            .element(id)
            .map(|e| e.category.clone())
            .ok_or(HostError::MissingEntity(id.0))?;
        let valid = self
            .element(target)
            .is_some_and(|t| t.is_type && t.category == category);
        if !valid {
            return Err(HostError::MissingEntity(target.0));
        }
        if let Some(element) = self.element_mut(id) {
            element.type_id = Some(target);
        }
        Ok(())
    }
}

impl HostDocument for MemoryDocument {
    fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for element in self.elements.iter().filter(|e| !e.is_type) {
            if !categories.contains(&element.category) {
                categories.push(element.category.clone());
            }
        }
        categories
    }

    fn entities(&self, category: &str, scope: &Scope) -> Vec<EntityId> {
        let visible = match scope {
            Scope::Document => None,
            Scope::View(name) => Some(
                self.views
                    .iter()
                    .find(|v| &v.name == name)
                    .map(|v| v.elements.as_slice())
                    .unwrap_or(&[]),
            ),
        };
        self.elements
            .iter()
            .filter(|e| !e.is_type && e.category == category)
            .filter(|e| visible.map_or(true, |ids| ids.contains(&e.id)))
            .map(|e| e.id)
            .collect()
    }

    fn all_entities(&self) -> Vec<EntityId> {
        self.elements
            .iter()
            .filter(|e| !e.is_type)
            .map(|e| e.id)
            .collect()
    }

    fn exists(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    fn is_type(&self, id: EntityId) -> bool {
        self.element(id).is_some_and(|e| e.is_type)
    }

    fn category_of(&self, id: EntityId) -> Option<String> {
        self.element(id).map(|e| e.category.clone())
    }

    fn type_of(&self, id: EntityId) -> Option<EntityId> {
        self.element(id).and_then(|e| e.type_id)
    }

    fn display_name(&self, id: EntityId) -> Option<String> {
        self.element(id).map(|e| e.name.clone()).or_else(|| {
            self.worksets
                .iter()
                .find(|w| w.id == id)
                .map(|w| w.name.clone())
        })
    }

    fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.elements
            .iter()
            .find(|e| !e.is_type && e.name == name)
            .map(|e| e.id)
    }

    fn lookup_named(&self, id: EntityId, name: &str) -> Option<AttributeInfo> {
        self.element(id)?
            .named(name)
            .map(|a| a.info(AttrKey::Named(name.to_string())))
    }

    fn lookup_builtin(&self, id: EntityId, key: WellKnown) -> Option<AttributeInfo> {
        let element = self.element(id)?;
        if let Some(attribute) = element.by_builtin(key) {
            return Some(attribute.info(AttrKey::BuiltIn(key)));
        }
        self.derived(id, key).map(|(value, read_only)| AttributeInfo {
            key: AttrKey::BuiltIn(key),
            storage: value.storage(),
            read_only,
            unit: None,
        })
    }

    fn read(&self, slot: &SlotRef) -> Option<AttrValue> {
        let element = self.element(slot.owner)?;
        match &slot.key {
            AttrKey::Named(name) => element.named(name).map(|a| a.value.clone()),
            AttrKey::BuiltIn(key) => element
                .by_builtin(*key)
                .map(|a| a.value.clone())
                .or_else(|| self.derived(slot.owner, *key).map(|(v, _)| v)),
        }
    }

    fn write(&mut self, slot: &SlotRef, value: AttrValue) -> Result<(), HostError> {
        if self.backup.is_none() {
            return Err(HostError::NoTransaction);
        }
        if let AttrKey::BuiltIn(key) = &slot.key {
            let stored = self
                .element(slot.owner)
                .is_some_and(|e| e.by_builtin(*key).is_some());
            if !stored {
                return match (*key, value) {
                    (WellKnown::ElemTypeParam | WellKnown::ElemFamilyAndTypeParam, AttrValue::Link(target)) => {
                        self.retype(slot.owner, target)
                    }
                    (WellKnown::ElemFamilyAndTypeParam, AttrValue::Text(Some(name))) => {
                        let target = self
                            .named_link(slot, &name)
                            .ok_or(HostError::UnknownType(name))?;
                        self.retype(slot.owner, target)
                    }
                    (WellKnown::ElemTypeParam, _) => Err(HostError::WrongStorage {
                        name: key.as_str().to_string(),
                        expected: StorageKind::Link.name(),
                    }),
                    (WellKnown::ElemFamilyAndTypeParam, _) => Err(HostError::WrongStorage {
                        name: key.as_str().to_string(),
                        expected: StorageKind::Text.name(),
                    }),
                    (WellKnown::ElemFamilyParam, _) => {
                        Err(HostError::ReadOnly(key.as_str().to_string()))
                    }
                    _ => Err(HostError::MissingAttribute(key.as_str().to_string())),
                };
            }
        }
        let element = self
            .element_mut(slot.owner)
            .ok_or(HostError::MissingEntity(slot.owner.0))?;
        let attribute = element
            .slot_mut(&slot.key)
            .ok_or_else(|| HostError::MissingAttribute(slot.key.to_string()))?;
        if attribute.read_only {
            return Err(HostError::ReadOnly(attribute.name.clone()));
        }
        if attribute.value.storage() != value.storage() {
            return Err(HostError::WrongStorage {
                name: attribute.name.clone(),
                expected: attribute.value.storage().name(),
            });
        }
        attribute.value = value;
        Ok(())
    }

    fn named_link(&self, slot: &SlotRef, name: &str) -> Option<EntityId> {
        match self.builtin_of(slot)? {
            WellKnown::ElemPartitionParam => self
                .worksets
                .iter()
                .find(|w| w.name == name)
                .map(|w| w.id),
            WellKnown::ElemTypeParam | WellKnown::ElemFamilyAndTypeParam => {
                let category = self.category_of(slot.owner)?;
                let type_name = name.rsplit(": ").next().unwrap_or(name);
                self.elements
                    .iter()
                    .find(|e| e.is_type && e.category == category && e.name == type_name)
                    .map(|e| e.id)
            }
            _ => None,
        }
    }

    fn begin_transaction(&mut self, _name: &str) -> Result<(), HostError> {
        if self.backup.is_some() {
            return Err(HostError::TransactionOpen);
        }
        self.backup = Some(self.elements.clone());
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), HostError> {
        self.backup.take().ok_or(HostError::NoTransaction)?;
        self.commits += 1;
        Ok(())
    }

    fn rollback_transaction(&mut self) {
        if let Some(saved) = self.backup.take() {
            self.elements = saved;
        }
    }

    fn schedules(&self) -> Vec<ScheduleDefinition> {
        self.schedules.clone()
    }

    fn render_schedule(&self, name: &str) -> Option<RenderedSchedule> {
        let definition = self.schedules.iter().find(|s| s.name == name)?;
        let entities = self.entities(&definition.category, &Scope::Document);

        let body = entities
            .iter()
            .map(|&id| {
                definition
                    .fields
                    .iter()
                    .map(|field| {
                        resolver::resolve(self, id, field)
                            .map(|slot| codec::decode(self, &slot))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        let summary = if definition.grand_totals {
            let mut row = vec![String::new(); definition.fields.len().max(1)];
            row[0] = format!("Grand total: {}", entities.len());
            vec![row]
        } else {
            Vec::new()
        };

        Some(RenderedSchedule {
            title: definition.name.clone(),
            headers: (0..definition.fields.len())
                .map(|i| definition.heading(i).to_string())
                .collect(),
            body,
            summary,
            entities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_workset(1, "Shell");
        doc.add_workset(2, "Interior");
        doc.add_element(
            Element::type_of(10, "Generic - 200mm", "Basic Wall", "Walls")
                .with(Attribute::new("Width", AttrValue::Real(0.656)).read_only()),
        );
        doc.add_element(Element::type_of(11, "Generic - 300mm", "Basic Wall", "Walls"));
        doc.add_element(
            Element::instance(100, "Wall 1", "Walls")
                .with_type(10)
                .with(
                    Attribute::new("Mark", AttrValue::Text(Some("W1".into())))
                        .builtin(WellKnown::AllModelMark),
                )
                .with(
                    Attribute::new("Workset", AttrValue::Link(EntityId(1)))
                        .builtin(WellKnown::ElemPartitionParam),
                ),
        );
        doc
    }

    fn slot(owner: i64, key: AttrKey) -> SlotRef {
        SlotRef {
            owner: EntityId(owner),
            key,
        }
    }

    #[test]
    fn test_write_requires_transaction() {
        let mut doc = doc();
        let mark = slot(100, AttrKey::Named("Mark".into()));
        let result = doc.write(&mark, AttrValue::Text(Some("W9".into())));
        assert_eq!(result, Err(HostError::NoTransaction));
    }

    #[test]
    fn test_rollback_restores_values() {
        let mut doc = doc();
        let mark = slot(100, AttrKey::Named("Mark".into()));
        doc.begin_transaction("edit").unwrap();
        doc.write(&mark, AttrValue::Text(Some("W9".into()))).unwrap();
        doc.rollback_transaction();
        assert_eq!(doc.read(&mark), Some(AttrValue::Text(Some("W1".into()))));
        assert_eq!(doc.commit_count(), 0);
    }

    #[test]
    fn test_builtin_key_reaches_named_attribute() {
        let doc = doc();
        let by_id = slot(100, AttrKey::BuiltIn(WellKnown::AllModelMark));
        assert_eq!(doc.read(&by_id), Some(AttrValue::Text(Some("W1".into()))));
    }

    #[test]
    fn test_identity_builtins_are_derived() {
        let doc = doc();
        let family = doc.lookup_builtin(EntityId(100), WellKnown::ElemFamilyParam).unwrap();
        assert!(family.read_only);
        let ty = slot(100, AttrKey::BuiltIn(WellKnown::ElemTypeParam));
        assert_eq!(doc.read(&ty), Some(AttrValue::Link(EntityId(10))));
        let family_and_type = slot(100, AttrKey::BuiltIn(WellKnown::ElemFamilyAndTypeParam));
        assert_eq!(
            doc.read(&family_and_type),
            Some(AttrValue::Text(Some("Basic Wall: Generic - 200mm".into())))
        );
        assert!(doc.is_type(EntityId(10)));
        assert!(!doc.is_type(EntityId(100)));
    }

    #[test]
    fn test_retype_through_family_and_type_text() {
        let mut doc = doc();
        let family_and_type = slot(100, AttrKey::BuiltIn(WellKnown::ElemFamilyAndTypeParam));
        doc.begin_transaction("retype").unwrap();
        doc.write(
            &family_and_type,
            AttrValue::Text(Some("Basic Wall: Generic - 300mm".into())),
        )
        .unwrap();
        assert_eq!(
            doc.write(&family_and_type, AttrValue::Text(Some("Basic Wall: Nope".into()))),
            Err(HostError::UnknownType("Basic Wall: Nope".into()))
        );
        doc.commit_transaction().unwrap();
        assert_eq!(doc.type_of(EntityId(100)), Some(EntityId(11)));
    }

    #[test]
    fn test_retype_through_type_builtin() {
        let mut doc = doc();
        let ty = slot(100, AttrKey::BuiltIn(WellKnown::ElemTypeParam));
        doc.begin_transaction("retype").unwrap();
        doc.write(&ty, AttrValue::Link(EntityId(11))).unwrap();
        doc.commit_transaction().unwrap();
        assert_eq!(doc.type_of(EntityId(100)), Some(EntityId(11)));
    }

    #[test]
    fn test_named_link_finds_worksets() {
        let doc = doc();
        let workset = slot(100, AttrKey::Named("Workset".into()));
        assert_eq!(doc.named_link(&workset, "Interior"), Some(EntityId(2)));
        assert_eq!(doc.named_link(&workset, "Nope"), None);
        let mark = slot(100, AttrKey::Named("Mark".into()));
        assert_eq!(doc.named_link(&mark, "Interior"), None);
    }

    #[test]
    fn test_read_only_write_rejected() {
        let mut doc = doc();
        let width = slot(10, AttrKey::Named("Width".into()));
        doc.begin_transaction("edit").unwrap();
        assert_eq!(
            doc.write(&width, AttrValue::Real(1.0)),
            Err(HostError::ReadOnly("Width".into()))
        );
    }

    #[test]
    fn test_view_scope_filters() {
        let mut doc = doc();
        doc.add_element(Element::instance(101, "Wall 2", "Walls").with_type(10));
        doc.add_view(View {
            name: "Level 1".into(),
            elements: vec![EntityId(101)],
        });
        assert_eq!(
            doc.entities("Walls", &Scope::Document),
            vec![EntityId(100), EntityId(101)]
        );
        assert_eq!(
            doc.entities("Walls", &Scope::View("Level 1".into())),
            vec![EntityId(101)]
        );
        assert!(doc.entities("Walls", &Scope::View("Missing".into())).is_empty());
    }
}

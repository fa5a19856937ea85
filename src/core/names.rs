//! Built-in attribute identifiers and the name → identifier table
//!
//! Built-ins are not reachable by their display name on every element, so the
//! resolver falls back to this table as its last tier. The table is compiled
//! once: category overlays first, then the category-agnostic base set, then
//! the computed-geometry set that applies to everything.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Fixed enumerated attribute keys exposed by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellKnown {
    // Identity
    ElemFamilyParam,
    ElemTypeParam,
    ElemFamilyAndTypeParam,
    // Descriptive / classification
    AllModelMark,
    AllModelInstanceComments,
    AllModelTypeMark,
    AllModelTypeComments,
    AllModelDescription,
    AllModelManufacturer,
    AllModelModel,
    AllModelUrl,
    AllModelCost,
    KeynoteParam,
    UniformatCode,
    UniformatDescription,
    ElemPartitionParam,
    PhaseCreated,
    PhaseDemolished,
    // Computed geometry
    HostAreaComputed,
    HostVolumeComputed,
    HostPerimeterComputed,
    LevelParam,
    // Walls
    WallUserHeightParam,
    WallBaseOffset,
    WallTopOffset,
    WallBaseConstraint,
    WallHeightType,
    WallStructuralSignificant,
    WallAttrWidthParam,
    CurveElemLength,
    // Floors, roofs, ceilings
    FloorAttrThicknessParam,
    FloorParamIsStructural,
    FloorHeightAboveLevelParam,
    RoofAttrThicknessParam,
    CeilingThicknessParam,
    CeilingHeightAboveLevelParam,
    // Doors, windows
    InstanceSillHeightParam,
    InstanceHeadHeightParam,
    FamilyWidthParam,
    FamilyHeightParam,
}

impl WellKnown {
    pub fn as_str(self) -> &'static str {
        match self {
            WellKnown::ElemFamilyParam => "ELEM_FAMILY_PARAM",
            WellKnown::ElemTypeParam => "ELEM_TYPE_PARAM",
            WellKnown::ElemFamilyAndTypeParam => "ELEM_FAMILY_AND_TYPE_PARAM",
            WellKnown::AllModelMark => "ALL_MODEL_MARK",
            WellKnown::AllModelInstanceComments => "ALL_MODEL_INSTANCE_COMMENTS",
            WellKnown::AllModelTypeMark => "ALL_MODEL_TYPE_MARK",
            WellKnown::AllModelTypeComments => "ALL_MODEL_TYPE_COMMENTS",
            WellKnown::AllModelDescription => "ALL_MODEL_DESCRIPTION",
            WellKnown::AllModelManufacturer => "ALL_MODEL_MANUFACTURER",
            WellKnown::AllModelModel => "ALL_MODEL_MODEL",
            WellKnown::AllModelUrl => "ALL_MODEL_URL",
            WellKnown::AllModelCost => "ALL_MODEL_COST",
            WellKnown::KeynoteParam => "KEYNOTE_PARAM",
            WellKnown::UniformatCode => "UNIFORMAT_CODE",
            WellKnown::UniformatDescription => "UNIFORMAT_DESCRIPTION",
            WellKnown::ElemPartitionParam => "ELEM_PARTITION_PARAM",
            WellKnown::PhaseCreated => "PHASE_CREATED",
            WellKnown::PhaseDemolished => "PHASE_DEMOLISHED",
            WellKnown::HostAreaComputed => "HOST_AREA_COMPUTED",
            WellKnown::HostVolumeComputed => "HOST_VOLUME_COMPUTED",
            WellKnown::HostPerimeterComputed => "HOST_PERIMETER_COMPUTED",
            WellKnown::LevelParam => "LEVEL_PARAM",
            WellKnown::WallUserHeightParam => "WALL_USER_HEIGHT_PARAM",
            WellKnown::WallBaseOffset => "WALL_BASE_OFFSET",
            WellKnown::WallTopOffset => "WALL_TOP_OFFSET",
            WellKnown::WallBaseConstraint => "WALL_BASE_CONSTRAINT",
            WellKnown::WallHeightType => "WALL_HEIGHT_TYPE",
            WellKnown::WallStructuralSignificant => "WALL_STRUCTURAL_SIGNIFICANT",
            WellKnown::WallAttrWidthParam => "WALL_ATTR_WIDTH_PARAM",
            WellKnown::CurveElemLength => "CURVE_ELEM_LENGTH",
            WellKnown::FloorAttrThicknessParam => "FLOOR_ATTR_THICKNESS_PARAM",
            WellKnown::FloorParamIsStructural => "FLOOR_PARAM_IS_STRUCTURAL",
            WellKnown::FloorHeightAboveLevelParam => "FLOOR_HEIGHTABOVELEVEL_PARAM",
            WellKnown::RoofAttrThicknessParam => "ROOF_ATTR_THICKNESS_PARAM",
            WellKnown::CeilingThicknessParam => "CEILING_THICKNESS",
            WellKnown::CeilingHeightAboveLevelParam => "CEILING_HEIGHTABOVELEVEL_PARAM",
            WellKnown::InstanceSillHeightParam => "INSTANCE_SILL_HEIGHT_PARAM",
            WellKnown::InstanceHeadHeightParam => "INSTANCE_HEAD_HEIGHT_PARAM",
            WellKnown::FamilyWidthParam => "FAMILY_WIDTH_PARAM",
            WellKnown::FamilyHeightParam => "FAMILY_HEIGHT_PARAM",
        }
    }

    /// Integer built-ins that hold a yes/no flag
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            WellKnown::WallStructuralSignificant | WellKnown::FloorParamIsStructural
        )
    }

    /// Identity fields are never written back, whatever the host says
    pub fn is_identity(self) -> bool {
        matches!(
            self,
            WellKnown::ElemFamilyParam | WellKnown::ElemTypeParam | WellKnown::ElemFamilyAndTypeParam
        )
    }
}

/// Attribute names that are exported read-only unconditionally
pub const IDENTITY_FIELDS: [&str; 3] = ["Family", "Family and Type", "Type"];

pub fn is_identity_field(name: &str) -> bool {
    IDENTITY_FIELDS.contains(&name)
}

type Table = HashMap<&'static str, WellKnown>;

/// Immutable lookup structure for the last resolution tier
#[derive(Debug)]
pub struct NameTable {
    overlays: HashMap<&'static str, Table>,
    base: Table,
    computed: Table,
}

impl NameTable {
    fn build() -> Self {
        let base: Table = [
            ("Family", WellKnown::ElemFamilyParam),
            ("Type", WellKnown::ElemTypeParam),
            ("Family and Type", WellKnown::ElemFamilyAndTypeParam),
            ("Mark", WellKnown::AllModelMark),
            ("Comments", WellKnown::AllModelInstanceComments),
            ("Type Mark", WellKnown::AllModelTypeMark),
            ("Type Comments", WellKnown::AllModelTypeComments),
            ("Description", WellKnown::AllModelDescription),
            ("Manufacturer", WellKnown::AllModelManufacturer),
            ("Model", WellKnown::AllModelModel),
            ("URL", WellKnown::AllModelUrl),
            ("Cost", WellKnown::AllModelCost),
            ("Keynote", WellKnown::KeynoteParam),
            ("Assembly Code", WellKnown::UniformatCode),
            ("Assembly Description", WellKnown::UniformatDescription),
            ("Workset", WellKnown::ElemPartitionParam),
            ("Phase Created", WellKnown::PhaseCreated),
            ("Phase Demolished", WellKnown::PhaseDemolished),
        ]
        .into_iter()
        .collect();

        let computed: Table = [
            ("Area", WellKnown::HostAreaComputed),
            ("Volume", WellKnown::HostVolumeComputed),
            ("Perimeter", WellKnown::HostPerimeterComputed),
            ("Level", WellKnown::LevelParam),
        ]
        .into_iter()
        .collect();

        let walls: Table = [
            ("Height", WellKnown::WallUserHeightParam),
            ("Unconnected Height", WellKnown::WallUserHeightParam),
            ("Base Offset", WellKnown::WallBaseOffset),
            ("Top Offset", WellKnown::WallTopOffset),
            ("Base Constraint", WellKnown::WallBaseConstraint),
            ("Top Constraint", WellKnown::WallHeightType),
            ("Structural", WellKnown::WallStructuralSignificant),
            ("Is Structural", WellKnown::WallStructuralSignificant),
            ("Width", WellKnown::WallAttrWidthParam),
            ("Length", WellKnown::CurveElemLength),
        ]
        .into_iter()
        .collect();

        let floors: Table = [
            ("Thickness", WellKnown::FloorAttrThicknessParam),
            ("Default Thickness", WellKnown::FloorAttrThicknessParam),
            ("Structural", WellKnown::FloorParamIsStructural),
            ("Is Structural", WellKnown::FloorParamIsStructural),
            ("Height Offset From Level", WellKnown::FloorHeightAboveLevelParam),
        ]
        .into_iter()
        .collect();

        let roofs: Table = [
            ("Thickness", WellKnown::RoofAttrThicknessParam),
            ("Default Thickness", WellKnown::RoofAttrThicknessParam),
        ]
        .into_iter()
        .collect();

        let ceilings: Table = [
            ("Thickness", WellKnown::CeilingThicknessParam),
            ("Height Offset From Level", WellKnown::CeilingHeightAboveLevelParam),
        ]
        .into_iter()
        .collect();

        let openings: Table = [
            ("Sill Height", WellKnown::InstanceSillHeightParam),
            ("Head Height", WellKnown::InstanceHeadHeightParam),
            ("Width", WellKnown::FamilyWidthParam),
            ("Height", WellKnown::FamilyHeightParam),
        ]
        .into_iter()
        .collect();

        let mut overlays = HashMap::new();
        overlays.insert("Walls", walls);
        overlays.insert("Floors", floors);
        overlays.insert("Roofs", roofs);
        overlays.insert("Ceilings", ceilings);
        overlays.insert("Doors", openings.clone());
        overlays.insert("Windows", openings);

        Self {
            overlays,
            base,
            computed,
        }
    }

    /// Look up `name` for an element of `category`
    pub fn lookup(&self, category: Option<&str>, name: &str) -> Option<WellKnown> {
        category
            .and_then(|c| self.overlays.get(c))
            .and_then(|overlay| overlay.get(name))
            .or_else(|| self.base.get(name))
            .or_else(|| self.computed.get(name))
            .copied()
    }
}

/// The process-wide table, built on first use
pub fn name_table() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(NameTable::build)
}

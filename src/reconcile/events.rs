//! Typed UI events consumed by the reconcilers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::{MaterialId, PropertyId, SelectionSet};

/// Raw value read from one rendered range control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBoundEdit {
    pub mat_id: MaterialId,
    pub property: PropertyId,
    /// Control payload, expected to be `[low, high]`
    pub value: Value,
}

impl RawBoundEdit {
    pub fn new(mat_id: MaterialId, property: impl Into<PropertyId>, value: Value) -> Self {
        Self {
            mat_id,
            property: property.into(),
            value,
        }
    }
}

/// Raw value read from one rendered target control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTargetValue {
    pub property: PropertyId,
    pub value: Value,
}

impl RawTargetValue {
    pub fn new(property: impl Into<PropertyId>, value: Value) -> Self {
        Self {
            property: property.into(),
            value,
        }
    }
}

/// One event for the bounds reducer
#[derive(Debug, Clone, PartialEq)]
pub enum BoundsEvent {
    /// The property selection changed. `edits` holds whatever range controls
    /// were rendered at the time.
    SelectionChanged {
        selection: SelectionSet,
        edits: Vec<RawBoundEdit>,
    },
    MaterialAdded,
    MaterialDeleted(MaterialId),
    /// Values collected from every currently rendered range control
    BoundsEdited(Vec<RawBoundEdit>),
}

impl BoundsEvent {
    /// Structural events add or remove entries and win over edits in a round
    pub fn is_structural(&self) -> bool {
        matches!(self, BoundsEvent::MaterialAdded | BoundsEvent::MaterialDeleted(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BoundsEvent::SelectionChanged { .. } => "selection_changed",
            BoundsEvent::MaterialAdded => "material_added",
            BoundsEvent::MaterialDeleted(_) => "material_deleted",
            BoundsEvent::BoundsEdited(_) => "bounds_edited",
        }
    }
}

/// Source of fresh material ids
pub trait IdSource {
    fn next_id(&mut self) -> MaterialId;
}

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&mut self) -> MaterialId {
        MaterialId::new_v4()
    }
}

/// Deterministic ids (`00000000-...-0001`, `...-0002`, ...), for replays and tests
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u128,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> MaterialId {
        let id = MaterialId::from_uuid(Uuid::from_u128(self.next));
        self.next += 1;
        id
    }
}

//! Material entries and the ordered bounds store

use std::fmt;

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::{BoundPair, PropertyId, SelectionSet};

/// Stable identity of a material entry. Never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(Uuid);

impl MaterialId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One candidate material: one bound pair per tracked property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialEntry {
    pub mat_id: MaterialId,
    pub bounds: IndexMap<PropertyId, BoundPair>,
}

impl MaterialEntry {
    /// Fresh entry with the default pair for every selected property
    pub fn with_defaults(mat_id: MaterialId, selection: &SelectionSet) -> Self {
        Self {
            mat_id,
            bounds: selection
                .iter()
                .map(|prop| (prop.clone(), BoundPair::default()))
                .collect(),
        }
    }

    pub fn bound(&self, prop: &PropertyId) -> Option<&BoundPair> {
        self.bounds.get(prop)
    }

    /// Whether this entry tracks exactly the selected properties, in order
    pub fn is_synced_with(&self, selection: &SelectionSet) -> bool {
        self.bounds.len() == selection.len()
            && self.bounds.keys().zip(selection.iter()).all(|(a, b)| a == b)
    }
}

/// Canonical store of material entries. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BoundsStore {
    entries: Vec<MaterialEntry>,
}

impl BoundsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MaterialEntry] {
        &self.entries
    }

    pub fn get(&self, id: &MaterialId) -> Option<&MaterialEntry> {
        self.entries.iter().find(|e| &e.mat_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = MaterialId> + '_ {
        self.entries.iter().map(|e| e.mat_id)
    }

    /// Append an entry. Returns false (and leaves the store alone) on a duplicate id.
    pub(crate) fn push(&mut self, entry: MaterialEntry) -> bool {
        if self.get(&entry.mat_id).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove by id. Returns whether anything was removed.
    pub(crate) fn remove(&mut self, id: &MaterialId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.mat_id != id);
        self.entries.len() != before
    }

    pub(crate) fn from_entries(entries: Vec<MaterialEntry>) -> Self {
        Self { entries }
    }
}

// Deserializing goes through `push`; a repeated id is an error.
impl<'de> Deserialize<'de> for BoundsStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<MaterialEntry>::deserialize(deserializer)?;
        let mut store = BoundsStore::new();
        for entry in entries {
            let id = entry.mat_id;
            if !store.push(entry) {
                return Err(de::Error::custom(format!("duplicate material id {}", id)));
            }
        }
        Ok(store)
    }
}

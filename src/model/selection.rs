//! Property identifiers and the ordered selection of tracked properties

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::PropertyCatalog;
use crate::error::Result;

/// Opaque catalog key, e.g. `bulk_modulus`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(String);

impl PropertyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Properties currently tracked, in the order the user picked them.
///
/// Only constructible from catalog-validated identifiers, so renderers can
/// rely on every member having a display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionSet(Vec<PropertyId>);

impl SelectionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate `ids` against the catalog. Repeats keep their first position.
    pub fn from_ids<I, P>(ids: I, catalog: &PropertyCatalog) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyId>,
    {
        let mut selected: Vec<PropertyId> = Vec::new();
        for id in ids {
            let id = id.into();
            catalog.display_name_of(&id)?;
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
        Ok(Self(selected))
    }

    pub fn contains(&self, id: &PropertyId) -> bool {
        self.0.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a PropertyId;
    type IntoIter = std::slice::Iter<'a, PropertyId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

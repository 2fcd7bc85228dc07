//! Property Catalog
//!
//! Read-only registry of the properties a material can be bounded on, each
//! with a human-readable display name. Built once and shared by reference.

use serde::{Deserialize, Serialize};

use crate::error::{DesignerError, Result};
use crate::model::PropertyId;

/// One catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOption {
    pub identifier: PropertyId,
    pub display_name: String,
}

impl PropertyOption {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identifier: PropertyId::new(identifier),
            display_name: display_name.into(),
        }
    }
}

/// Properties supported by the stock optimizer
const BUILTIN_PROPERTIES: &[(&str, &str)] = &[
    ("elec_cond_300k_low_doping", "Electrical Conductivity"),
    ("therm_cond_300k_low_doping", "Thermal Conductivity"),
    ("bulk_modulus", "Bulk Modulus"),
    ("shear_modulus", "Shear Modulus"),
    ("universal_anisotropy", "Universal Anisotropy"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyCatalog {
    options: Vec<PropertyOption>,
}

impl PropertyCatalog {
    /// Build a catalog from an explicit seed. Identifiers must be unique.
    pub fn new(options: Vec<PropertyOption>) -> Result<Self> {
        for (idx, option) in options.iter().enumerate() {
            if options[..idx].iter().any(|o| o.identifier == option.identifier) {
                return Err(DesignerError::validation(format!(
                    "duplicate catalog identifier: {}",
                    option.identifier
                )));
            }
        }
        Ok(Self { options })
    }

    /// All entries in seed order
    pub fn list_all(&self) -> &[PropertyOption] {
        &self.options
    }

    pub fn display_name_of(&self, id: &PropertyId) -> Result<&str> {
        self.options
            .iter()
            .find(|o| &o.identifier == id)
            .map(|o| o.display_name.as_str())
            .ok_or_else(|| DesignerError::NotFound(id.clone()))
    }

    pub fn contains(&self, id: &PropertyId) -> bool {
        self.options.iter().any(|o| &o.identifier == id)
    }
}

impl Default for PropertyCatalog {
    fn default() -> Self {
        Self {
            options: BUILTIN_PROPERTIES
                .iter()
                .map(|(id, name)| PropertyOption::new(*id, *name))
                .collect(),
        }
    }
}

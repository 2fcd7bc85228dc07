//! View projections of the canonical state
//!
//! Pure and idempotent: the same store and targets always produce the same
//! description. Views never feed back into reconciliation.

use serde::Serialize;

use crate::catalog::PropertyCatalog;
use crate::error::Result;
use crate::model::{BoundPair, BoundsStore, MaterialId, PropertyId, TargetEntry};

/// Slider limits offered for every bound
pub const SLIDER_MIN: f64 = 0.0;
pub const SLIDER_MAX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeControl {
    pub mat_id: MaterialId,
    pub property: PropertyId,
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub value: BoundPair,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPanel {
    pub mat_id: MaterialId,
    pub title: String,
    /// Id carried by the panel's delete button
    pub delete_target: MaterialId,
    pub ranges: Vec<RangeControl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetControl {
    pub property: PropertyId,
    pub label: String,
    pub value: f64,
}

pub fn render_store(store: &BoundsStore, catalog: &PropertyCatalog) -> Result<Vec<MaterialPanel>> {
    store
        .entries()
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let ranges = entry
                .bounds
                .iter()
                .map(|(prop, pair)| {
                    Ok(RangeControl {
                        mat_id: entry.mat_id,
                        property: prop.clone(),
                        label: catalog.display_name_of(prop)?.to_string(),
                        min: SLIDER_MIN,
                        max: SLIDER_MAX,
                        value: *pair,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(MaterialPanel {
                mat_id: entry.mat_id,
                title: format!("Material {}", idx),
                delete_target: entry.mat_id,
                ranges,
            })
        })
        .collect()
}

pub fn render_targets(targets: &[TargetEntry], catalog: &PropertyCatalog) -> Result<Vec<TargetControl>> {
    targets
        .iter()
        .map(|t| {
            Ok(TargetControl {
                property: t.property_id.clone(),
                label: catalog.display_name_of(&t.property_id)?.to_string(),
                value: t.value,
            })
        })
        .collect()
}

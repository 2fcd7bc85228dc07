use serde::{Deserialize, Serialize};

use super::PropertyId;

/// Desired mixture value for one selected property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEntry {
    pub property_id: PropertyId,
    pub value: f64,
}

impl TargetEntry {
    pub const DEFAULT_VALUE: f64 = 0.0;

    pub fn new(property_id: PropertyId, value: f64) -> Self {
        Self { property_id, value }
    }
}

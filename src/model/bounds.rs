//! Bound pairs constraining one property of one material

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DesignerError, Result};

/// Inclusive numeric range `(low, high)` with `low <= high`.
///
/// Serialized as a two-element array, matching the slider payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct BoundPair {
    low: f64,
    high: f64,
}

impl BoundPair {
    pub const DEFAULT_LOW: f64 = 0.0;
    pub const DEFAULT_HIGH: f64 = 100.0;

    /// Build a validated pair
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() {
            return Err(DesignerError::validation(format!(
                "bound pair must be finite, got ({}, {})",
                low, high
            )));
        }
        if low > high {
            return Err(DesignerError::validation(format!(
                "lower bound {} exceeds upper bound {}",
                low, high
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Parse a raw range-control payload such as `[10, 90]`.
    pub fn from_raw(raw: &Value) -> Result<Self> {
        let items = raw.as_array().ok_or_else(|| {
            DesignerError::validation(format!("expected a [low, high] array, got {}", raw))
        })?;
        if items.len() != 2 {
            return Err(DesignerError::validation(format!(
                "expected exactly two bounds, got {}",
                items.len()
            )));
        }
        let low = items[0]
            .as_f64()
            .ok_or_else(|| DesignerError::validation(format!("non-numeric lower bound: {}", items[0])))?;
        let high = items[1]
            .as_f64()
            .ok_or_else(|| DesignerError::validation(format!("non-numeric upper bound: {}", items[1])))?;
        Self::new(low, high)
    }
}

impl Default for BoundPair {
    fn default() -> Self {
        Self {
            low: Self::DEFAULT_LOW,
            high: Self::DEFAULT_HIGH,
        }
    }
}

impl TryFrom<[f64; 2]> for BoundPair {
    type Error = DesignerError;

    fn try_from(pair: [f64; 2]) -> Result<Self> {
        Self::new(pair[0], pair[1])
    }
}

impl From<BoundPair> for [f64; 2] {
    fn from(pair: BoundPair) -> Self {
        [pair.low, pair.high]
    }
}

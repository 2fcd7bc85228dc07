//! Data Model
//!
//! Bound pairs, material entries, the bounds store, the property selection
//! and target entries.

mod bounds;
mod material;
mod selection;
mod target;

pub use bounds::BoundPair;
pub use material::{BoundsStore, MaterialEntry, MaterialId};
pub use selection::{PropertyId, SelectionSet};
pub use target::TargetEntry;

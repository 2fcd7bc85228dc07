//! Reconciliation Engine
//!
//! Keeps the bounds store and the target list consistent with the property
//! selection as UI events arrive. Both reconcilers are pure functions.

mod bounds;
mod events;
mod targets;

pub use bounds::{reduce_bounds, reduce_round, Reconciliation, RejectedEdit};
pub use events::{BoundsEvent, IdSource, RawBoundEdit, RawTargetValue, SequentialIds, UuidSource};
pub use targets::{reconcile_targets, RejectedTarget, TargetReconciliation};

//! Composite Designer
//!
//! State core of an interactive composite-material design tool:
//! - Property catalog and per-material bound ranges
//! - Reconciliation of UI events into one canonical bounds store
//! - Target values kept in step with the property selection
//! - Optimization runs dispatched to an external optimizer service

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod optimizer;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod utils;

// Re-exports for convenience
pub use catalog::{PropertyCatalog, PropertyOption};
pub use config::DesignerConfig;
pub use error::{DesignerError, Result};
pub use optimizer::{Optimizer, RemoteOptimizer};
pub use session::{DesignerEvent, DesignerNotice, DesignerSession};

//! Optimizer Integration
//!
//! Wire types for the external optimizer, the collaborator trait, request
//! assembly, and the guarded background runner.

mod assembler;
mod remote;
mod request;

pub use assembler::{AssemblerSettings, OptimizationAssembler, RunId, RunOutcome, RunStatus, TriggerDecision};
pub use remote::RemoteOptimizer;
pub use request::{assemble_request, RunReport, MIXTURE_NAME};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::PropertyId;

/// Allowed range of one property for one candidate material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialProperty {
    pub property: PropertyId,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub name: String,
    pub properties: Vec<MaterialProperty>,
}

/// Desired value of one property of the mixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixtureProperty {
    pub property: PropertyId,
    pub desired_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureSpec {
    pub name: String,
    pub properties: Vec<MixtureProperty>,
}

/// Everything the optimizer needs for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub materials: Vec<MaterialSpec>,
    pub mixtures: Vec<MixtureSpec>,
}

/// One candidate design, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDesign {
    pub cost: f64,
    /// Design variables (property values and volume fractions) as reported by the optimizer
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvergencePoint {
    pub generation: u32,
    pub best_cost: f64,
    pub average_cost: f64,
}

/// Share of the best design's cost attributed to one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostContribution {
    pub property: PropertyId,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub ranked_designs: Vec<RankedDesign>,
    pub convergence_trace: Vec<ConvergencePoint>,
    pub best_composition: Vec<CostContribution>,
}

/// The external optimizer. Opaque and potentially slow.
#[async_trait]
pub trait Optimizer: Send + Sync {
    async fn optimize(&self, request: OptimizationRequest) -> Result<OptimizationResult>;
}

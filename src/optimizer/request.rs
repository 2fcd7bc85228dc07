//! Translation between canonical state and optimizer wire types

use serde::Serialize;

use super::{
    ConvergencePoint, CostContribution, MaterialProperty, MaterialSpec, MixtureProperty, MixtureSpec,
    OptimizationRequest, OptimizationResult, RankedDesign,
};
use crate::model::{BoundsStore, TargetEntry};

pub const MIXTURE_NAME: &str = "mixture";

/// Build the request: one material per store entry (`mat_0`, `mat_1`, ...)
/// and a single mixture holding every target.
pub fn assemble_request(store: &BoundsStore, targets: &[TargetEntry]) -> OptimizationRequest {
    let materials = store
        .entries()
        .iter()
        .enumerate()
        .map(|(idx, entry)| MaterialSpec {
            name: format!("mat_{}", idx),
            properties: entry
                .bounds
                .iter()
                .map(|(prop, pair)| MaterialProperty {
                    property: prop.clone(),
                    lower_bound: pair.low(),
                    upper_bound: pair.high(),
                })
                .collect(),
        })
        .collect();

    let mixture = MixtureSpec {
        name: MIXTURE_NAME.to_string(),
        properties: targets
            .iter()
            .map(|t| MixtureProperty {
                property: t.property_id.clone(),
                desired_value: t.value,
            })
            .collect(),
    };

    OptimizationRequest {
        materials,
        mixtures: vec![mixture],
    }
}

/// Display-ready summary of an optimizer result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub top_designs: Vec<RankedDesign>,
    pub convergence_trace: Vec<ConvergencePoint>,
    pub best_composition: Vec<CostContribution>,
}

fn round_to(value: f64, precision: usize) -> f64 {
    let scale = 10f64.powi(precision.min(15) as i32);
    (value * scale).round() / scale
}

impl RunReport {
    /// Keep the first `rows` designs, rounding their numbers to `precision` decimals
    pub fn from_result(result: OptimizationResult, rows: usize, precision: usize) -> Self {
        let top_designs = result
            .ranked_designs
            .into_iter()
            .take(rows)
            .map(|design| RankedDesign {
                cost: round_to(design.cost, precision),
                values: design.values.into_iter().map(|v| round_to(v, precision)).collect(),
            })
            .collect();

        Self {
            top_designs,
            convergence_trace: result.convergence_trace,
            best_composition: result.best_composition,
        }
    }
}

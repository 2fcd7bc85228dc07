//! Target Reconciler
//!
//! Maps the selection and the rendered target-control values to the ordered
//! target list. Deselected properties lose their value.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::events::RawTargetValue;
use crate::model::{PropertyId, SelectionSet, TargetEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedTarget {
    pub property: PropertyId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetReconciliation {
    pub targets: Vec<TargetEntry>,
    pub rejected: Vec<RejectedTarget>,
}

/// Numeric control payload. `null` means the input is empty.
fn parse_target(raw: &Value) -> Result<Option<f64>, String> {
    match raw {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| format!("target {} is not a finite number", n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| format!("target {:?} is not numeric", s)),
        other => Err(format!("target {} is not numeric", other)),
    }
}

pub fn reconcile_targets(selection: &SelectionSet, raw: &[RawTargetValue]) -> TargetReconciliation {
    let mut grouped: BTreeMap<&PropertyId, Vec<&Value>> = BTreeMap::new();
    for value in raw {
        grouped.entry(&value.property).or_default().push(&value.value);
    }

    let mut rejected = Vec::new();
    let targets = selection
        .iter()
        .map(|prop| {
            let value = match grouped.get(prop) {
                None => None,
                Some(values) => match values.iter().map(|v| parse_target(v)).collect::<Result<Vec<_>, _>>() {
                    Err(reason) => Some(Err(reason)),
                    Ok(parsed) if parsed.iter().any(|p| p != &parsed[0]) => {
                        Some(Err(format!("{} conflicting values in one round", parsed.len())))
                    }
                    Ok(parsed) => Some(Ok(parsed[0])),
                },
            };

            let value = match value {
                Some(Ok(Some(v))) => v,
                Some(Err(reason)) => {
                    warn!(property = %prop, %reason, "rejected target value");
                    rejected.push(RejectedTarget {
                        property: prop.clone(),
                        reason,
                    });
                    TargetEntry::DEFAULT_VALUE
                }
                Some(Ok(None)) | None => TargetEntry::DEFAULT_VALUE,
            };
            TargetEntry::new(prop.clone(), value)
        })
        .collect();

    TargetReconciliation { targets, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PropertyCatalog;
    use serde_json::json;

    fn select(ids: &[&str]) -> SelectionSet {
        SelectionSet::from_ids(ids.iter().copied(), &PropertyCatalog::default()).unwrap()
    }

    #[test]
    fn test_targets_follow_selection_order() {
        let selection = select(&["elec_cond_300k_low_doping", "bulk_modulus"]);
        let raw = vec![
            RawTargetValue::new("bulk_modulus", json!(7)),
            RawTargetValue::new("elec_cond_300k_low_doping", json!(5)),
        ];

        let out = reconcile_targets(&selection, &raw);
        assert_eq!(
            out.targets,
            vec![
                TargetEntry::new("elec_cond_300k_low_doping".into(), 5.0),
                TargetEntry::new("bulk_modulus".into(), 7.0),
            ]
        );
    }

    #[test]
    fn test_missing_and_empty_values_default_to_zero() {
        let selection = select(&["bulk_modulus", "shear_modulus"]);
        let raw = vec![RawTargetValue::new("shear_modulus", Value::Null)];

        let out = reconcile_targets(&selection, &raw);
        assert!(out.targets.iter().all(|t| t.value == 0.0));
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn test_deselected_values_are_dropped() {
        let selection = select(&["bulk_modulus"]);
        let raw = vec![
            RawTargetValue::new("bulk_modulus", json!(3.5)),
            RawTargetValue::new("shear_modulus", json!(9)),
        ];

        let out = reconcile_targets(&selection, &raw);
        assert_eq!(out.targets, vec![TargetEntry::new("bulk_modulus".into(), 3.5)]);
    }

    #[test]
    fn test_duplicate_values_compare_by_number() {
        let selection = select(&["bulk_modulus"]);
        let raw = vec![
            RawTargetValue::new("bulk_modulus", json!(5)),
            RawTargetValue::new("bulk_modulus", json!(5.0)),
            RawTargetValue::new("bulk_modulus", json!("5")),
        ];

        let out = reconcile_targets(&selection, &raw);
        assert_eq!(out.targets, vec![TargetEntry::new("bulk_modulus".into(), 5.0)]);
        assert!(out.rejected.is_empty());

        let differing = vec![
            RawTargetValue::new("bulk_modulus", json!(5)),
            RawTargetValue::new("bulk_modulus", json!(6)),
        ];
        let out = reconcile_targets(&selection, &differing);
        assert_eq!(out.targets[0].value, 0.0);
        assert_eq!(out.rejected.len(), 1);
    }

    #[test]
    fn test_non_numeric_value_is_rejected() {
        let selection = select(&["bulk_modulus"]);
        let raw = vec![RawTargetValue::new("bulk_modulus", json!("lots"))];

        let out = reconcile_targets(&selection, &raw);
        assert_eq!(out.targets[0].value, 0.0);
        assert_eq!(out.rejected.len(), 1);

        let numeric_text = vec![RawTargetValue::new("bulk_modulus", json!(" 12.5 "))];
        assert_eq!(reconcile_targets(&selection, &numeric_text).targets[0].value, 12.5);
    }
}

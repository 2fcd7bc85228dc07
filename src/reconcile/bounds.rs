//! Bounds Reconciler
//!
//! Pure reducer from (previous store, selection, event) to the next store.
//! Edits and selection changes recompute every entry in one pass; raw values
//! are looked up by `(material, property)` so the order in which controls were
//! collected never changes the result.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::events::{BoundsEvent, IdSource, RawBoundEdit};
use crate::model::{BoundPair, BoundsStore, MaterialEntry, MaterialId, PropertyId, SelectionSet};

/// How many fresh ids to draw before giving up on a colliding id source
const MAX_ID_ATTEMPTS: usize = 8;

/// A raw edit that was refused; the previous pair was kept
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedEdit {
    pub mat_id: MaterialId,
    pub property: PropertyId,
    pub reason: String,
}

/// Result of one reconciliation round
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub store: BoundsStore,
    pub selection: SelectionSet,
    pub rejected: Vec<RejectedEdit>,
    /// Id of the entry created by `MaterialAdded`
    pub added: Option<MaterialId>,
    /// Id of the entry removed by `MaterialDeleted`, if it existed
    pub removed: Option<MaterialId>,
}

impl Reconciliation {
    fn synced(store: BoundsStore, selection: SelectionSet, rejected: Vec<RejectedEdit>) -> Self {
        Self {
            store,
            selection,
            rejected,
            added: None,
            removed: None,
        }
    }
}

/// Apply a single event.
pub fn reduce_bounds(
    prev: &BoundsStore,
    selection: &SelectionSet,
    event: BoundsEvent,
    ids: &mut dyn IdSource,
) -> Reconciliation {
    debug!(event = event.kind(), materials = prev.len(), "reconciling bounds");

    match event {
        BoundsEvent::MaterialAdded => add_material(prev, selection, ids),
        BoundsEvent::MaterialDeleted(id) => delete_material(prev, selection, id),
        BoundsEvent::SelectionChanged {
            selection: next,
            edits,
        } => {
            let (store, rejected) = recompute(prev, &next, edits);
            Reconciliation::synced(store, next, rejected)
        }
        BoundsEvent::BoundsEdited(edits) => {
            let (store, rejected) = recompute(prev, selection, edits);
            Reconciliation::synced(store, selection.clone(), rejected)
        }
    }
}

/// Apply every trigger observed in one round.
///
/// The first structural event wins and ends the round; raw edits from the same
/// round are not folded in. Otherwise the last selection change and all raw
/// edits are merged into one recompute.
pub fn reduce_round(
    prev: &BoundsStore,
    selection: &SelectionSet,
    events: Vec<BoundsEvent>,
    ids: &mut dyn IdSource,
) -> Reconciliation {
    let total = events.len();
    if let Some(structural) = events.iter().position(BoundsEvent::is_structural) {
        let mut events = events;
        let event = events.swap_remove(structural);
        if total > 1 {
            debug!(discarded = total - 1, "structural event takes the round");
        }
        return reduce_bounds(prev, selection, event, ids);
    }

    let mut next_selection = selection.clone();
    let mut edits = Vec::new();
    for event in events {
        match event {
            BoundsEvent::SelectionChanged {
                selection,
                edits: batch,
            } => {
                next_selection = selection;
                edits.extend(batch);
            }
            BoundsEvent::BoundsEdited(batch) => edits.extend(batch),
            BoundsEvent::MaterialAdded | BoundsEvent::MaterialDeleted(_) => {}
        }
    }

    let (store, rejected) = recompute(prev, &next_selection, edits);
    Reconciliation::synced(store, next_selection, rejected)
}

fn add_material(prev: &BoundsStore, selection: &SelectionSet, ids: &mut dyn IdSource) -> Reconciliation {
    let (mut store, _) = recompute(prev, selection, Vec::new());

    let fresh = (0..MAX_ID_ATTEMPTS)
        .map(|_| ids.next_id())
        .find(|id| store.get(id).is_none());

    let added = match fresh {
        Some(id) => {
            store.push(MaterialEntry::with_defaults(id, selection));
            debug!(mat_id = %id, "material added");
            Some(id)
        }
        None => {
            warn!("id source kept producing existing ids; material not added");
            None
        }
    };

    Reconciliation {
        added,
        ..Reconciliation::synced(store, selection.clone(), Vec::new())
    }
}

fn delete_material(prev: &BoundsStore, selection: &SelectionSet, id: MaterialId) -> Reconciliation {
    let (mut store, _) = recompute(prev, selection, Vec::new());
    let removed = store.remove(&id).then_some(id);
    if removed.is_none() {
        debug!(mat_id = %id, "delete for unknown material ignored");
    }

    Reconciliation {
        removed,
        ..Reconciliation::synced(store, selection.clone(), Vec::new())
    }
}

/// Keyed view of one round's raw edits
enum EditSlot {
    Valid(BoundPair),
    Invalid(String),
}

fn index_edits(edits: Vec<RawBoundEdit>) -> BTreeMap<(MaterialId, PropertyId), EditSlot> {
    let mut grouped: BTreeMap<(MaterialId, PropertyId), Vec<Value>> = BTreeMap::new();
    for edit in edits {
        grouped
            .entry((edit.mat_id, edit.property))
            .or_default()
            .push(edit.value);
    }

    grouped
        .into_iter()
        .map(|(key, values)| {
            let parsed = values
                .iter()
                .map(BoundPair::from_raw)
                .collect::<crate::error::Result<Vec<_>>>();
            let slot = match parsed {
                Err(err) => EditSlot::Invalid(err.to_string()),
                Ok(pairs) if pairs.iter().any(|p| p != &pairs[0]) => {
                    EditSlot::Invalid(format!("{} conflicting values in one round", pairs.len()))
                }
                Ok(pairs) => EditSlot::Valid(pairs[0]),
            };
            (key, slot)
        })
        .collect()
}

/// Rebuild every entry against `selection`: fresh edit, else previous value,
/// else the default pair. Unselected properties are dropped.
fn recompute(
    prev: &BoundsStore,
    selection: &SelectionSet,
    edits: Vec<RawBoundEdit>,
) -> (BoundsStore, Vec<RejectedEdit>) {
    let lookup = index_edits(edits);
    let mut rejected = Vec::new();

    let entries = prev
        .entries()
        .iter()
        .map(|entry| {
            let bounds = selection
                .iter()
                .map(|prop| {
                    let previous = entry.bound(prop).copied();
                    let key = (entry.mat_id, prop.clone());
                    let bound = match lookup.get(&key) {
                        Some(EditSlot::Valid(pair)) => *pair,
                        Some(EditSlot::Invalid(reason)) => {
                            warn!(mat_id = %entry.mat_id, property = %prop, %reason, "rejected bound edit");
                            rejected.push(RejectedEdit {
                                mat_id: entry.mat_id,
                                property: prop.clone(),
                                reason: reason.clone(),
                            });
                            previous.unwrap_or_default()
                        }
                        None => previous.unwrap_or_default(),
                    };
                    (prop.clone(), bound)
                })
                .collect();
            MaterialEntry {
                mat_id: entry.mat_id,
                bounds,
            }
        })
        .collect();

    (BoundsStore::from_entries(entries), rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PropertyCatalog;
    use crate::reconcile::SequentialIds;
    use serde_json::json;

    const ELEC: &str = "elec_cond_300k_low_doping";
    const BULK: &str = "bulk_modulus";

    fn select(ids: &[&str]) -> SelectionSet {
        SelectionSet::from_ids(ids.iter().copied(), &PropertyCatalog::default()).unwrap()
    }

    fn pair(low: f64, high: f64) -> BoundPair {
        BoundPair::new(low, high).unwrap()
    }

    fn store_with(n: usize, selection: &SelectionSet, ids: &mut SequentialIds) -> BoundsStore {
        let mut store = BoundsStore::new();
        for _ in 0..n {
            store = reduce_bounds(&store, selection, BoundsEvent::MaterialAdded, ids).store;
        }
        store
    }

    #[test]
    fn test_add_material_uses_defaults() {
        let selection = select(&[ELEC]);
        let mut ids = SequentialIds::new();
        let out = reduce_bounds(&BoundsStore::new(), &selection, BoundsEvent::MaterialAdded, &mut ids);

        let id = out.added.unwrap();
        assert_eq!(out.store.len(), 1);
        assert_eq!(out.store.get(&id).unwrap().bound(&ELEC.into()), Some(&BoundPair::default()));
    }

    #[test]
    fn test_edit_applies_to_named_pair_only() {
        let selection = select(&[ELEC, BULK]);
        let mut ids = SequentialIds::new();
        let store = store_with(2, &selection, &mut ids);
        let first = store.entries()[0].mat_id;

        let edits = vec![RawBoundEdit::new(first, ELEC, json!([10, 90]))];
        let out = reduce_bounds(&store, &selection, BoundsEvent::BoundsEdited(edits), &mut ids);

        assert_eq!(out.store.entries()[0].bound(&ELEC.into()), Some(&pair(10.0, 90.0)));
        assert_eq!(out.store.entries()[0].bound(&BULK.into()), Some(&BoundPair::default()));
        assert_eq!(out.store.entries()[1], store.entries()[1]);
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn test_malformed_edit_keeps_previous_pair() {
        let selection = select(&[ELEC]);
        let mut ids = SequentialIds::new();
        let store = store_with(1, &selection, &mut ids);
        let id = store.entries()[0].mat_id;

        let ok = vec![RawBoundEdit::new(id, ELEC, json!([20, 30]))];
        let store = reduce_bounds(&store, &selection, BoundsEvent::BoundsEdited(ok), &mut ids).store;

        let bad = vec![RawBoundEdit::new(id, ELEC, json!([80, 10]))];
        let out = reduce_bounds(&store, &selection, BoundsEvent::BoundsEdited(bad), &mut ids);

        assert_eq!(out.store.entries()[0].bound(&ELEC.into()), Some(&pair(20.0, 30.0)));
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].mat_id, id);
    }

    #[test]
    fn test_conflicting_duplicates_are_rejected() {
        let selection = select(&[ELEC]);
        let mut ids = SequentialIds::new();
        let store = store_with(1, &selection, &mut ids);
        let id = store.entries()[0].mat_id;

        let edits = vec![
            RawBoundEdit::new(id, ELEC, json!([1, 2])),
            RawBoundEdit::new(id, ELEC, json!([3, 4])),
        ];
        let out = reduce_bounds(&store, &selection, BoundsEvent::BoundsEdited(edits), &mut ids);
        assert_eq!(out.store, store);
        assert_eq!(out.rejected.len(), 1);

        let same = vec![
            RawBoundEdit::new(id, ELEC, json!([1, 2])),
            RawBoundEdit::new(id, ELEC, json!([1, 2])),
        ];
        let out = reduce_bounds(&store, &selection, BoundsEvent::BoundsEdited(same), &mut ids);
        assert_eq!(out.store.entries()[0].bound(&ELEC.into()), Some(&pair(1.0, 2.0)));
    }

    #[test]
    fn test_equal_pairs_in_mixed_notation_agree() {
        let selection = select(&[BULK]);
        let mut ids = SequentialIds::new();
        let store = store_with(1, &selection, &mut ids);
        let id = store.entries()[0].mat_id;

        let edits = vec![
            RawBoundEdit::new(id, BULK, json!([10, 90])),
            RawBoundEdit::new(id, BULK, json!([10.0, 90.0])),
        ];
        let out = reduce_bounds(&store, &selection, BoundsEvent::BoundsEdited(edits), &mut ids);

        assert!(out.rejected.is_empty());
        assert_eq!(out.store.entries()[0].bound(&BULK.into()), Some(&pair(10.0, 90.0)));
    }

    #[test]
    fn test_invalid_duplicate_rejects_the_key() {
        let selection = select(&[BULK]);
        let mut ids = SequentialIds::new();
        let store = store_with(1, &selection, &mut ids);
        let id = store.entries()[0].mat_id;

        let edits = vec![
            RawBoundEdit::new(id, BULK, json!([10, 90])),
            RawBoundEdit::new(id, BULK, json!("wide")),
        ];
        let out = reduce_bounds(&store, &selection, BoundsEvent::BoundsEdited(edits), &mut ids);

        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.store, store);
    }

    #[test]
    fn test_edits_for_unknown_targets_are_ignored() {
        let selection = select(&[ELEC]);
        let mut ids = SequentialIds::new();
        let store = store_with(1, &selection, &mut ids);

        let edits = vec![
            RawBoundEdit::new(MaterialId::new_v4(), ELEC, json!([1, 2])),
            RawBoundEdit::new(store.entries()[0].mat_id, BULK, json!("garbage")),
        ];
        let out = reduce_bounds(&store, &selection, BoundsEvent::BoundsEdited(edits), &mut ids);
        assert_eq!(out.store, store);
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn test_selection_change_syncs_every_entry() {
        let selection = select(&[ELEC]);
        let mut ids = SequentialIds::new();
        let store = store_with(3, &selection, &mut ids);

        let next = select(&[BULK, ELEC]);
        let out = reduce_bounds(
            &store,
            &selection,
            BoundsEvent::SelectionChanged {
                selection: next.clone(),
                edits: vec![],
            },
            &mut ids,
        );

        assert_eq!(out.selection, next);
        assert!(out.store.entries().iter().all(|e| e.is_synced_with(&next)));

        let empty = reduce_bounds(
            &out.store,
            &next,
            BoundsEvent::SelectionChanged {
                selection: SelectionSet::empty(),
                edits: vec![],
            },
            &mut ids,
        );
        assert_eq!(empty.store.len(), 3);
        assert!(empty.store.entries().iter().all(|e| e.bounds.is_empty()));
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let selection = select(&[ELEC]);
        let mut ids = SequentialIds::new();
        let store = store_with(2, &selection, &mut ids);

        let out = reduce_bounds(&store, &selection, BoundsEvent::MaterialDeleted(MaterialId::new_v4()), &mut ids);
        assert_eq!(out.store, store);
        assert!(out.removed.is_none());
    }

    #[test]
    fn test_round_prefers_structural_events() {
        let selection = select(&[ELEC]);
        let mut ids = SequentialIds::new();
        let store = store_with(1, &selection, &mut ids);
        let id = store.entries()[0].mat_id;

        let out = reduce_round(
            &store,
            &selection,
            vec![
                BoundsEvent::BoundsEdited(vec![RawBoundEdit::new(id, ELEC, json!([5, 6]))]),
                BoundsEvent::MaterialAdded,
            ],
            &mut ids,
        );

        assert_eq!(out.store.len(), 2);
        assert!(out.added.is_some());
        assert_eq!(out.store.entries()[0].bound(&ELEC.into()), Some(&BoundPair::default()));
    }

    #[test]
    fn test_round_merges_selection_and_edits() {
        let selection = select(&[ELEC]);
        let mut ids = SequentialIds::new();
        let store = store_with(1, &selection, &mut ids);
        let id = store.entries()[0].mat_id;

        let next = select(&[ELEC, BULK]);
        let out = reduce_round(
            &store,
            &selection,
            vec![
                BoundsEvent::SelectionChanged {
                    selection: next.clone(),
                    edits: vec![],
                },
                BoundsEvent::BoundsEdited(vec![RawBoundEdit::new(id, ELEC, json!([5, 6]))]),
            ],
            &mut ids,
        );

        assert_eq!(out.selection, next);
        let entry = &out.store.entries()[0];
        assert_eq!(entry.bound(&ELEC.into()), Some(&pair(5.0, 6.0)));
        assert_eq!(entry.bound(&BULK.into()), Some(&BoundPair::default()));
    }
}

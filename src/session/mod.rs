//! Designer Session
//!
//! Owns the canonical state and runs one reconciliation round per UI event.
//! Rounds are synchronous; optimizer runs proceed in the background and are
//! collected with `poll_run` / `wait_for_run`.

mod notices;

pub use notices::{DesignerNotice, NoticeBus};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::catalog::PropertyCatalog;
use crate::error::{DesignerError, Result};
use crate::model::{BoundsStore, MaterialId, PropertyId, SelectionSet, TargetEntry};
use crate::optimizer::{AssemblerSettings, OptimizationAssembler, Optimizer, RunOutcome, TriggerDecision};
use crate::reconcile::{
    reconcile_targets, reduce_bounds, reduce_round, BoundsEvent, IdSource, RawBoundEdit, RawTargetValue,
    Reconciliation, RejectedEdit, RejectedTarget, UuidSource,
};
use crate::render::{render_store, render_targets, MaterialPanel, TargetControl};

/// Everything the UI can ask of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DesignerEvent {
    /// New dropdown value plus the range controls rendered at that moment
    SelectionChanged {
        properties: Vec<PropertyId>,
        #[serde(default)]
        edits: Vec<RawBoundEdit>,
    },
    MaterialAdded,
    MaterialDeleted {
        #[serde(rename = "matId")]
        mat_id: MaterialId,
    },
    BoundsEdited { edits: Vec<RawBoundEdit> },
    TargetsEdited { values: Vec<RawTargetValue> },
    /// Run button pressed; `clicks` is the button's running click count
    RunRequested { clicks: u64 },
    RunCancelled,
}

impl DesignerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DesignerEvent::SelectionChanged { .. } => "selection_changed",
            DesignerEvent::MaterialAdded => "material_added",
            DesignerEvent::MaterialDeleted { .. } => "material_deleted",
            DesignerEvent::BoundsEdited { .. } => "bounds_edited",
            DesignerEvent::TargetsEdited { .. } => "targets_edited",
            DesignerEvent::RunRequested { .. } => "run_requested",
            DesignerEvent::RunCancelled => "run_cancelled",
        }
    }
}

/// What one round did besides updating state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoundReport {
    pub rejected_edits: Vec<RejectedEdit>,
    pub rejected_targets: Vec<RejectedTarget>,
    pub added: Option<MaterialId>,
    pub removed: Option<MaterialId>,
    pub run_started: Option<crate::optimizer::RunId>,
    pub run_cancelled: Option<RunOutcome>,
}

/// Canonical serialized state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub selection: SelectionSet,
    pub materials: BoundsStore,
    pub targets: Vec<TargetEntry>,
}

pub struct DesignerSession {
    catalog: Arc<PropertyCatalog>,
    selection: SelectionSet,
    store: BoundsStore,
    targets: Vec<TargetEntry>,
    ids: Box<dyn IdSource + Send>,
    assembler: OptimizationAssembler,
    notices: NoticeBus,
    last_run: Option<RunOutcome>,
}

impl DesignerSession {
    pub fn new(catalog: Arc<PropertyCatalog>, optimizer: Arc<dyn Optimizer>, settings: AssemblerSettings) -> Self {
        Self {
            catalog,
            selection: SelectionSet::empty(),
            store: BoundsStore::new(),
            targets: Vec::new(),
            ids: Box::new(UuidSource),
            assembler: OptimizationAssembler::new(optimizer, settings),
            notices: NoticeBus::new(),
            last_run: None,
        }
    }

    /// Replace the material id generator
    pub fn with_id_source(mut self, ids: impl IdSource + Send + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn catalog(&self) -> &PropertyCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn store(&self) -> &BoundsStore {
        &self.store
    }

    pub fn targets(&self) -> &[TargetEntry] {
        &self.targets
    }

    pub fn last_run(&self) -> Option<&RunOutcome> {
        self.last_run.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.assembler.is_running()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DesignerNotice> {
        self.notices.subscribe()
    }

    /// Run one reconciliation round for `event`.
    ///
    /// On error the canonical state is left exactly as it was.
    pub fn handle(&mut self, event: DesignerEvent) -> Result<RoundReport> {
        debug!(event = event.kind(), "designer round");

        match event {
            DesignerEvent::SelectionChanged { properties, edits } => {
                let selection = SelectionSet::from_ids(properties, &self.catalog)?;
                let outcome = self.reduce(BoundsEvent::SelectionChanged { selection, edits });
                let current = self.current_target_values(&[]);
                let mut report = self.commit_bounds(outcome);
                report.rejected_targets = self.commit_targets(&current);
                Ok(report)
            }
            DesignerEvent::MaterialAdded => {
                let outcome = self.reduce(BoundsEvent::MaterialAdded);
                Ok(self.commit_bounds(outcome))
            }
            DesignerEvent::MaterialDeleted { mat_id } => {
                let outcome = self.reduce(BoundsEvent::MaterialDeleted(mat_id));
                Ok(self.commit_bounds(outcome))
            }
            DesignerEvent::BoundsEdited { edits } => {
                let outcome = self.reduce(BoundsEvent::BoundsEdited(edits));
                Ok(self.commit_bounds(outcome))
            }
            DesignerEvent::TargetsEdited { values } => {
                let raw = self.current_target_values(&values);
                let rejected_targets = self.commit_targets(&raw);
                Ok(RoundReport {
                    rejected_targets,
                    ..RoundReport::default()
                })
            }
            DesignerEvent::RunRequested { clicks } => {
                let decision = self.assembler.trigger(clicks, &self.store, &self.targets)?;
                let run_started = match decision {
                    TriggerDecision::Started(run_id) => {
                        self.notices.publish(DesignerNotice::RunStarted { run_id });
                        Some(run_id)
                    }
                    TriggerDecision::Ignored => None,
                };
                Ok(RoundReport {
                    run_started,
                    ..RoundReport::default()
                })
            }
            DesignerEvent::RunCancelled => {
                let run_cancelled = self.assembler.cancel().map(|outcome| self.record_run(outcome));
                Ok(RoundReport {
                    run_cancelled,
                    ..RoundReport::default()
                })
            }
        }
    }

    /// Run one round over every bounds trigger observed together.
    /// Structural events take precedence; see `reduce_round`.
    pub fn handle_bounds_round(&mut self, events: Vec<BoundsEvent>) -> RoundReport {
        let selection_before = self.selection.clone();
        let outcome = reduce_round(&self.store, &self.selection, events, self.ids.as_mut());
        let selection_changed = outcome.selection != selection_before;
        let current = self.current_target_values(&[]);
        let mut report = self.commit_bounds(outcome);
        if selection_changed {
            report.rejected_targets = self.commit_targets(&current);
        }
        report
    }

    /// Collect a finished run without waiting
    pub fn poll_run(&mut self) -> Option<RunOutcome> {
        let outcome = self.assembler.try_next_outcome()?;
        Some(self.record_run(outcome))
    }

    /// Wait for the in-flight run, if any
    pub async fn wait_for_run(&mut self) -> Option<RunOutcome> {
        let outcome = self.assembler.next_outcome().await?;
        Some(self.record_run(outcome))
    }

    pub fn render_store(&self) -> Result<Vec<MaterialPanel>> {
        render_store(&self.store, &self.catalog)
    }

    pub fn render_targets(&self) -> Result<Vec<TargetControl>> {
        render_targets(&self.targets, &self.catalog)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            selection: self.selection.clone(),
            materials: self.store.clone(),
            targets: self.targets.clone(),
        }
    }

    /// Snapshot as JSON
    pub fn snapshot_json(&self) -> Result<Value> {
        serde_json::to_value(self.snapshot()).map_err(DesignerError::from)
    }

    fn reduce(&mut self, event: BoundsEvent) -> Reconciliation {
        reduce_bounds(&self.store, &self.selection, event, self.ids.as_mut())
    }

    fn commit_bounds(&mut self, outcome: Reconciliation) -> RoundReport {
        let Reconciliation {
            store,
            selection,
            rejected,
            added,
            removed,
        } = outcome;

        if selection != self.selection {
            self.selection = selection;
            self.notices.publish(DesignerNotice::SelectionChanged {
                properties: self.selection.iter().cloned().collect(),
            });
        }
        if store != self.store {
            self.store = store;
            self.notices.publish(DesignerNotice::StoreChanged {
                materials: self.store.len(),
            });
        }
        if !rejected.is_empty() {
            self.notices.publish(DesignerNotice::EditsRejected { count: rejected.len() });
        }

        RoundReport {
            rejected_edits: rejected,
            added,
            removed,
            ..RoundReport::default()
        }
    }

    /// Current target values as raw control values, overlaid with `edits`
    fn current_target_values(&self, edits: &[RawTargetValue]) -> Vec<RawTargetValue> {
        let mut raw: Vec<RawTargetValue> = self
            .targets
            .iter()
            .filter(|t| !edits.iter().any(|e| e.property == t.property_id))
            .map(|t| RawTargetValue::new(t.property_id.clone(), Value::from(t.value)))
            .collect();
        raw.extend(edits.iter().cloned());
        raw
    }

    fn commit_targets(&mut self, raw: &[RawTargetValue]) -> Vec<RejectedTarget> {
        let outcome = reconcile_targets(&self.selection, raw);
        if outcome.targets != self.targets {
            self.targets = outcome.targets;
            self.notices.publish(DesignerNotice::TargetsChanged {
                targets: self.targets.len(),
            });
        }
        if !outcome.rejected.is_empty() {
            self.notices.publish(DesignerNotice::EditsRejected {
                count: outcome.rejected.len(),
            });
        }
        outcome.rejected
    }

    fn record_run(&mut self, outcome: RunOutcome) -> RunOutcome {
        self.notices.publish(DesignerNotice::RunFinished {
            run_id: outcome.run_id,
            success: outcome.status.is_success(),
        });
        self.last_run = Some(outcome.clone());
        outcome
    }
}

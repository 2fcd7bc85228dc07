//! Guarded optimizer runs
//!
//! A run starts only on a fresh user click, executes on the tokio runtime
//! under a timeout, and resolves to exactly one `RunOutcome`. While a run is
//! unresolved no other run can start. Reconciliation never waits on it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::request::{assemble_request, RunReport};
use super::Optimizer;
use crate::error::{DesignerError, Result};
use crate::model::{BoundsStore, TargetEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded(RunReport),
    Failed(String),
    TimedOut { after_secs: u64 },
    Cancelled,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Succeeded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    Started(RunId),
    /// No click since the last handled one
    Ignored,
}

#[derive(Debug, Clone)]
pub struct AssemblerSettings {
    pub timeout: Duration,
    pub report_rows: usize,
    pub report_precision: usize,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            report_rows: 10,
            report_precision: 2,
        }
    }
}

struct InFlight {
    run_id: RunId,
    started_at: DateTime<Utc>,
    handle: JoinHandle<(RunStatus, DateTime<Utc>)>,
}

pub struct OptimizationAssembler {
    optimizer: Arc<dyn Optimizer>,
    settings: AssemblerSettings,
    last_handled_clicks: u64,
    next_run: u64,
    in_flight: Option<InFlight>,
}

impl OptimizationAssembler {
    pub fn new(optimizer: Arc<dyn Optimizer>, settings: AssemblerSettings) -> Self {
        Self {
            optimizer,
            settings,
            last_handled_clicks: 0,
            next_run: 1,
            in_flight: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.in_flight.as_ref().map(|f| f.run_id)
    }

    /// Start a run if `clicks` is a click count not handled yet.
    ///
    /// A click that arrives while a run is unresolved is consumed and refused
    /// with `RunInFlight`, so it cannot start a run later on its own.
    pub fn trigger(
        &mut self,
        clicks: u64,
        store: &BoundsStore,
        targets: &[TargetEntry],
    ) -> Result<TriggerDecision> {
        if clicks == 0 || clicks <= self.last_handled_clicks {
            debug!(clicks, last = self.last_handled_clicks, "run trigger without a fresh click");
            return Ok(TriggerDecision::Ignored);
        }
        self.last_handled_clicks = clicks;

        if let Some(in_flight) = &self.in_flight {
            warn!(run = %in_flight.run_id, "run requested while another is in flight");
            return Err(DesignerError::RunInFlight);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DesignerError::optimizer(format!("no async runtime available: {}", e)))?;

        let request = assemble_request(store, targets);
        let run_id = RunId(self.next_run);
        self.next_run += 1;

        info!(
            run = %run_id,
            materials = request.materials.len(),
            targets = targets.len(),
            "starting optimization run"
        );

        let optimizer = self.optimizer.clone();
        let settings = self.settings.clone();
        let handle = runtime.spawn(async move {
            let status = match tokio::time::timeout(settings.timeout, optimizer.optimize(request)).await {
                Ok(Ok(result)) => RunStatus::Succeeded(RunReport::from_result(
                    result,
                    settings.report_rows,
                    settings.report_precision,
                )),
                Ok(Err(e)) => RunStatus::Failed(e.to_string()),
                Err(_) => RunStatus::TimedOut {
                    after_secs: settings.timeout.as_secs(),
                },
            };
            (status, Utc::now())
        });

        self.in_flight = Some(InFlight {
            run_id,
            started_at: Utc::now(),
            handle,
        });
        Ok(TriggerDecision::Started(run_id))
    }

    /// Abort the in-flight run, resolving it as cancelled.
    pub fn cancel(&mut self) -> Option<RunOutcome> {
        let in_flight = self.in_flight.take()?;
        in_flight.handle.abort();
        info!(run = %in_flight.run_id, "optimization run cancelled");
        Some(RunOutcome {
            run_id: in_flight.run_id,
            status: RunStatus::Cancelled,
            started_at: in_flight.started_at,
            finished_at: Utc::now(),
        })
    }

    /// Non-blocking poll for the in-flight run's outcome
    pub fn try_next_outcome(&mut self) -> Option<RunOutcome> {
        let in_flight = self.in_flight.as_mut()?;
        if !in_flight.handle.is_finished() {
            return None;
        }
        let joined = (&mut in_flight.handle).now_or_never()?;
        let in_flight = self.in_flight.take()?;
        Some(Self::resolve(in_flight.run_id, in_flight.started_at, joined))
    }

    /// Wait for the in-flight run. `None` when nothing is running.
    ///
    /// Cancel-safe: dropping the future leaves the run in flight.
    pub async fn next_outcome(&mut self) -> Option<RunOutcome> {
        let in_flight = self.in_flight.as_mut()?;
        let joined = (&mut in_flight.handle).await;
        let in_flight = self.in_flight.take()?;
        Some(Self::resolve(in_flight.run_id, in_flight.started_at, joined))
    }

    fn resolve(
        run_id: RunId,
        started_at: DateTime<Utc>,
        joined: std::result::Result<(RunStatus, DateTime<Utc>), tokio::task::JoinError>,
    ) -> RunOutcome {
        let (status, finished_at) = match joined {
            Ok(done) => done,
            Err(e) if e.is_cancelled() => (RunStatus::Cancelled, Utc::now()),
            Err(e) => (RunStatus::Failed(format!("optimizer task panicked: {}", e)), Utc::now()),
        };

        match &status {
            RunStatus::Succeeded(report) => {
                info!(run = %run_id, designs = report.top_designs.len(), "optimization run finished")
            }
            RunStatus::Failed(reason) => error!(run = %run_id, %reason, "optimization run failed"),
            RunStatus::TimedOut { after_secs } => {
                error!(run = %run_id, after_secs, "optimization run timed out")
            }
            RunStatus::Cancelled => info!(run = %run_id, "optimization run cancelled"),
        }

        RunOutcome {
            run_id,
            status,
            started_at,
            finished_at,
        }
    }
}

impl Drop for OptimizationAssembler {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}

//! Change notices for view layers
//!
//! Broadcast so any number of renderers can re-derive their views when the
//! canonical state actually changes.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::model::PropertyId;
use crate::optimizer::RunId;

const NOTICE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum DesignerNotice {
    SelectionChanged { properties: Vec<PropertyId> },
    StoreChanged { materials: usize },
    TargetsChanged { targets: usize },
    /// Raw control values that were refused this round
    EditsRejected { count: usize },
    RunStarted { run_id: RunId },
    RunFinished { run_id: RunId, success: bool },
}

pub struct NoticeBus {
    tx: broadcast::Sender<DesignerNotice>,
}

impl NoticeBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { tx }
    }

    /// Publish to current subscribers; dropped when nobody listens
    pub fn publish(&self, notice: DesignerNotice) {
        let _ = self.tx.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DesignerNotice> {
        self.tx.subscribe()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new()
    }
}

//! Composite Designer driver
//!
//! Reads one JSON command per line from stdin, applies it to a designer
//! session and writes the resulting views as JSON lines to stdout.
//!
//! ```text
//! {"cmd": "select", "properties": ["bulk_modulus"]}
//! {"cmd": "add"}
//! {"cmd": "edit", "edits": [{"matId": "...", "property": "bulk_modulus", "value": [10, 90]}]}
//! {"cmd": "targets", "values": [{"property": "bulk_modulus", "value": 42}]}
//! {"cmd": "run"}
//! {"cmd": "wait"}
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use composite_designer::config::{ConfigManager, DesignerConfig};
use composite_designer::error::DesignerError;
use composite_designer::model::{MaterialId, PropertyId};
use composite_designer::optimizer::{OptimizationRequest, OptimizationResult, Optimizer, RemoteOptimizer};
use composite_designer::reconcile::{RawBoundEdit, RawTargetValue};
use composite_designer::session::{DesignerEvent, DesignerSession};
use composite_designer::utils::init_logging;
use composite_designer::PropertyCatalog;

// ──────────────────────────────────────────────────────────────────────────────
// COMMANDS
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Command {
    Select {
        properties: Vec<PropertyId>,
    },
    Add,
    Delete {
        #[serde(rename = "matId")]
        mat_id: MaterialId,
    },
    Edit {
        edits: Vec<RawBoundEdit>,
    },
    Targets {
        values: Vec<RawTargetValue>,
    },
    Run,
    Cancel,
    Wait,
    Show,
    Catalog,
}

/// Stand-in used when no optimizer service is configured
struct UnconfiguredOptimizer;

#[async_trait]
impl Optimizer for UnconfiguredOptimizer {
    async fn optimize(&self, _request: OptimizationRequest) -> composite_designer::Result<OptimizationResult> {
        Err(DesignerError::optimizer(
            "no optimizer configured (set DESIGNER_OPTIMIZER_URL)",
        ))
    }
}

fn views(session: &DesignerSession) -> Result<Value> {
    Ok(json!({
        "materials": session.render_store()?,
        "targets": session.render_targets()?,
        "running": session.is_running(),
    }))
}

/// Apply one command. Session errors are reported inline so the loop keeps going.
async fn apply(session: &mut DesignerSession, command: Command, run_clicks: &mut u64) -> Result<Value> {
    let event = match command {
        Command::Select { properties } => DesignerEvent::SelectionChanged {
            properties,
            edits: Vec::new(),
        },
        Command::Add => DesignerEvent::MaterialAdded,
        Command::Delete { mat_id } => DesignerEvent::MaterialDeleted { mat_id },
        Command::Edit { edits } => DesignerEvent::BoundsEdited { edits },
        Command::Targets { values } => DesignerEvent::TargetsEdited { values },
        Command::Run => {
            *run_clicks += 1;
            DesignerEvent::RunRequested { clicks: *run_clicks }
        }
        Command::Cancel => DesignerEvent::RunCancelled,
        Command::Wait => return Ok(json!({ "run": session.wait_for_run().await })),
        Command::Catalog => return Ok(json!({ "catalog": session.catalog().list_all() })),
        Command::Show => return Ok(json!({ "snapshot": session.snapshot(), "views": views(session)? })),
    };

    match session.handle(event) {
        Ok(report) => Ok(json!({ "report": report, "views": views(session)? })),
        Err(e) => {
            warn!(error = %e, "command refused");
            Ok(json!({ "error": e.to_string() }))
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = match std::env::var("DESIGNER_CONFIG") {
        Ok(path) => ConfigManager::new(path).load().await?,
        Err(_) => DesignerConfig::default(),
    };
    let config = config.with_overrides(|name| std::env::var(name).ok())?;

    init_logging(&config.log_filter);
    info!(?config, "composite designer starting");

    let optimizer: Arc<dyn Optimizer> = match &config.optimizer_url {
        Some(url) => Arc::new(RemoteOptimizer::new(url.clone(), config.optimizer_api_key.clone())),
        None => {
            warn!("no optimizer URL configured; runs will fail");
            Arc::new(UnconfiguredOptimizer)
        }
    };

    let mut session = DesignerSession::new(
        Arc::new(PropertyCatalog::default()),
        optimizer,
        config.assembler_settings(),
    );

    let mut run_clicks: u64 = 0;
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<Command>(line) {
            Ok(command) => apply(&mut session, command, &mut run_clicks).await?,
            Err(e) => json!({ "error": format!("invalid command: {}", e) }),
        };

        let mut text = serde_json::to_string(&output)?;
        if let Some(outcome) = session.poll_run() {
            text.push('\n');
            text.push_str(&serde_json::to_string(&json!({ "run": outcome }))?);
        }
        text.push('\n');
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await?;
    }

    if session.is_running() {
        info!("stdin closed; waiting for the in-flight run");
        if let Some(outcome) = session.wait_for_run().await {
            let text = format!("{}\n", serde_json::to_string(&json!({ "run": outcome }))?);
            stdout.write_all(text.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::adapter::ExecutionAdapter;
use super::events::EventLog;
use super::telemetry::{Telemetry, TelemetrySnapshot, format_latency};

#[derive(Debug, Error)]
pub enum RunError {
    /// A run is already in flight; re-entrant triggers are rejected rather
    /// than queued or interleaved.
    #[error("a run is already in progress")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

/// Terminal report for one run. The run itself is not retained; its outcome
/// has already been folded into telemetry and the event log by the time this
/// is returned.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub elapsed_ms: Option<f64>,
    pub output: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorState {
    Ready,
    Running,
    Warning,
}

/// Externally visible status projection: controller state, last-run label,
/// and the error surface.
#[derive(Debug, Clone, Serialize)]
pub struct RunIndicators {
    pub state: IndicatorState,
    pub last_run_ms: Option<f64>,
    pub last_run_display: String,
    pub error: Option<String>,
}

impl RunIndicators {
    fn initial() -> Self {
        Self {
            state: IndicatorState::Ready,
            last_run_ms: None,
            last_run_display: "—".to_string(),
            error: None,
        }
    }
}

/// Ephemeral value for one in-flight run. The source is an immutable
/// snapshot; later editor changes cannot affect it.
struct Run {
    id: Uuid,
    started_at: DateTime<Utc>,
    source: String,
}

/// Orchestrates one run end to end: snapshot in, adapter dispatch, elapsed
/// measurement, then outcome routing into telemetry, the event log, and the
/// status indicators.
///
/// Single-writer discipline: the sink and telemetry are mutated only here.
/// The gate guarantees at most one run is in flight; a second trigger during
/// a run gets `RunError::Busy`.
pub struct RunController {
    adapter: ExecutionAdapter,
    telemetry: Mutex<Telemetry>,
    events: Arc<EventLog>,
    indicators: RwLock<RunIndicators>,
    gate: Mutex<()>,
}

impl RunController {
    pub fn new(adapter: ExecutionAdapter, events: Arc<EventLog>) -> Self {
        Self {
            adapter,
            telemetry: Mutex::new(Telemetry::new()),
            events,
            indicators: RwLock::new(RunIndicators::initial()),
            gate: Mutex::new(()),
        }
    }

    /// Run a source snapshot through the sandboxed interpreter.
    pub async fn trigger(&self, source: String) -> Result<RunReport, RunError> {
        let Ok(_guard) = self.gate.try_lock() else {
            self.events
                .record("Run rejected: a run is already in progress")
                .await;
            return Err(RunError::Busy);
        };

        let run = Run {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            source,
        };
        tracing::info!(
            run_id = %run.id,
            started_at = %run.started_at,
            bytes = run.source.len(),
            "run started"
        );

        self.indicators.write().await.state = IndicatorState::Running;
        self.adapter.reset_output();
        let start = Instant::now();
        let result = self.adapter.execute(&run.source).await;
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(()) => {
                self.telemetry.lock().await.record_success(elapsed);
                self.events
                    .record(format!("Ran script in {}", format_latency(elapsed)))
                    .await;
                {
                    let mut indicators = self.indicators.write().await;
                    indicators.state = IndicatorState::Ready;
                    indicators.last_run_ms = Some(elapsed);
                    indicators.last_run_display =
                        format!("Last run: {}", format_latency(elapsed));
                    indicators.error = None;
                }
                tracing::info!(run_id = %run.id, elapsed_ms = format_args!("{elapsed:.1}"), "run succeeded");
                Ok(RunReport {
                    run_id: run.id.to_string(),
                    outcome: RunOutcome::Succeeded,
                    elapsed_ms: Some(elapsed),
                    output: self.adapter.read_output(),
                    error: None,
                })
            }
            Err(e) => {
                let message = e.to_string();
                self.telemetry.lock().await.record_failure();
                self.events.record("Script execution error").await;
                {
                    let mut indicators = self.indicators.write().await;
                    indicators.state = IndicatorState::Warning;
                    indicators.last_run_display = "Last run failed".to_string();
                    indicators.error = Some(message.clone());
                }
                tracing::warn!(run_id = %run.id, error = %message, "run failed");
                Ok(RunReport {
                    run_id: run.id.to_string(),
                    outcome: RunOutcome::Failed,
                    elapsed_ms: None,
                    output: self.adapter.read_output(),
                    error: Some(message),
                })
            }
        }
    }

    pub async fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.telemetry.lock().await.snapshot()
    }

    pub async fn indicators(&self) -> RunIndicators {
        self.indicators.read().await.clone()
    }

    pub fn output(&self) -> String {
        self.adapter.read_output()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }
}

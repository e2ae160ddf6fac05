//! Interval-driven repetition of the pipeline.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineState, RunOutcome, RunReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub interval: Duration,
    /// Stop after this many completed runs.
    pub max_runs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSummary {
    pub ticks: u64,
    pub runs: u64,
    /// Ticks dropped because a run was still in flight.
    pub skipped: u64,
    pub failures: u64,
    pub written: u64,
    pub partially_written: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<RunReport>,
}

impl WatchSummary {
    fn record(&mut self, result: Result<RunReport>) {
        self.runs += 1;
        match result {
            Ok(report) => {
                match report.outcome {
                    RunOutcome::Written => self.written += 1,
                    RunOutcome::PartiallyWritten => self.partially_written += 1,
                    RunOutcome::Stopped | RunOutcome::Cancelled => {}
                }
                self.last = Some(report);
            }
            Err(e) => {
                error!(error = %e, "run failed");
                self.failures += 1;
            }
        }
    }
}

/// Run the pipeline on every tick until cancelled or `max_runs` is reached.
///
/// A tick that finds the state locked is skipped, never queued. In-flight
/// runs are awaited before returning; they observe `cancel` between stages.
pub async fn watch(
    pipeline: Arc<Pipeline>,
    state: Arc<Mutex<PipelineState>>,
    options: WatchOptions,
    cancel: CancellationToken,
) -> WatchSummary {
    let mut summary = WatchSummary::default();
    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let (tx, mut rx) = mpsc::unbounded_channel::<Result<RunReport>>();
    let mut started = 0u64;
    let mut in_flight = 0u64;
    let reached = |count: u64| options.max_runs.is_some_and(|max| count >= max);

    info!(interval = ?options.interval, max_runs = ?options.max_runs, "watching");
    loop {
        if reached(summary.runs) {
            break;
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(result) = rx.recv() => {
                in_flight -= 1;
                summary.record(result);
            }
            _ = ticker.tick() => {
                summary.ticks += 1;
                if reached(started) {
                    continue;
                }
                match Arc::clone(&state).try_lock_owned() {
                    Ok(mut guard) => {
                        started += 1;
                        in_flight += 1;
                        let pipeline = Arc::clone(&pipeline);
                        let cancel = cancel.child_token();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let result = pipeline.run(&mut guard, &cancel).await;
                            let _ = tx.send(result);
                        });
                    }
                    Err(_) => {
                        info!(tick = summary.ticks, "run in flight; skipping tick");
                        summary.skipped += 1;
                    }
                }
            }
        }
    }

    while in_flight > 0 {
        match rx.recv().await {
            Some(result) => {
                in_flight -= 1;
                summary.record(result);
            }
            None => break,
        }
    }
    info!(ticks = summary.ticks, runs = summary.runs, skipped = summary.skipped, "watch finished");
    summary
}

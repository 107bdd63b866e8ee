//! Run progress: the 0–100 completion value and the events observers receive.

use crate::domain::model::SubmissionResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Share of the progress bar owned by the submission phase.
const SUBMISSION_SHARE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Submission,
    Enrichment,
}

/// Maps a phase and its counters to a completion value in `[0, 100]`.
///
/// Submission covers 0–50 and enrichment 50–100. An empty run counts as a
/// finished phase.
pub fn compute_progress(phase: Phase, completed: usize, total: usize) -> f64 {
    let fraction = if total == 0 {
        1.0
    } else {
        completed as f64 / total as f64
    };

    let value = match phase {
        Phase::Submission => fraction * SUBMISSION_SHARE,
        Phase::Enrichment => SUBMISSION_SHARE + fraction * (100.0 - SUBMISSION_SHARE),
    };

    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Enriched,
    Failed,
    Skipped,
}

/// Events emitted while a run is in flight.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A run was accepted and its input decoded
    RunStarted { input: String, total: usize },

    /// One submit call resolved
    RecordSubmitted {
        index: usize,
        name: String,
        success: bool,
    },

    /// Every record has been submitted; the intermediate table is ready
    SubmissionComplete { results: Vec<SubmissionResult> },

    /// Waiting for the scan service before fetching metrics
    CooldownStarted { duration: Duration },

    /// One result went through the enrichment loop
    RecordEnriched {
        index: usize,
        job_id: String,
        outcome: EnrichmentOutcome,
    },

    /// The progress value changed
    Progress { phase: Phase, percent: f64 },

    /// Both phases finished
    Completed {
        succeeded: usize,
        failed: usize,
        enriched: usize,
    },

    /// Progress went back to zero because a new input was selected
    Reset,
}

pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Renders progress events as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { input, total } => {
                tracing::info!(input = %input, total, "🚀 Starting bulk scan");
            }
            ProgressEvent::RecordSubmitted {
                index,
                name,
                success,
            } => {
                if *success {
                    tracing::debug!(index, name = %name, "Record submitted");
                } else {
                    tracing::debug!(index, name = %name, "Record submission failed");
                }
            }
            ProgressEvent::SubmissionComplete { results } => {
                let succeeded = results.iter().filter(|r| r.success).count();
                tracing::info!(
                    submitted = succeeded,
                    failed = results.len() - succeeded,
                    "📤 Submission phase complete"
                );
            }
            ProgressEvent::CooldownStarted { duration } => {
                tracing::info!(
                    cooldown_secs = duration.as_secs(),
                    "⏳ Waiting for scans to finish"
                );
            }
            ProgressEvent::RecordEnriched {
                index,
                job_id,
                outcome,
            } => {
                tracing::debug!(index, job_id = %job_id, ?outcome, "Enrichment step done");
            }
            ProgressEvent::Progress { phase, percent } => {
                tracing::debug!(?phase, percent, "Progress");
            }
            ProgressEvent::Completed {
                succeeded,
                failed,
                enriched,
            } => {
                tracing::info!(succeeded, failed, enriched, "✅ Bulk scan complete");
            }
            ProgressEvent::Reset => {
                tracing::debug!("Progress reset");
            }
        }
    }
}

/// Owns the progress value of an engine and publishes every change.
///
/// The value is recomputed from the counters on each update, never
/// accumulated. Subscribers get a [`watch::Receiver`] that always holds the
/// latest value.
pub struct ProgressTracker {
    tx: watch::Sender<f64>,
    handler: Arc<dyn ProgressHandler>,
}

impl ProgressTracker {
    pub fn new(handler: Arc<dyn ProgressHandler>) -> Self {
        let (tx, _rx) = watch::channel(0.0);
        Self { tx, handler }
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> f64 {
        *self.tx.borrow()
    }

    pub fn update(&self, phase: Phase, completed: usize, total: usize) -> f64 {
        let percent = compute_progress(phase, completed, total);
        self.tx.send_replace(percent);
        self.handler
            .on_progress(&ProgressEvent::Progress { phase, percent });
        percent
    }

    pub fn reset(&self) {
        self.tx.send_replace(0.0);
        self.handler.on_progress(&ProgressEvent::Reset);
    }

    pub fn emit(&self, event: ProgressEvent) {
        self.handler.on_progress(&event);
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(Arc::new(NoOpHandler))
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("current", &self.current())
            .finish()
    }
}

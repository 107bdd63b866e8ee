use crate::utils::error::{Result, ScanError};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle of a run: `Idle → Submitting → Cooling → Enriching → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Submitting,
    Cooling,
    Enriching,
    Done,
}

impl RunState {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            RunState::Submitting | RunState::Cooling | RunState::Enriching
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunState::Idle => "idle",
            RunState::Submitting => "submitting",
            RunState::Cooling => "cooling",
            RunState::Enriching => "enriching",
            RunState::Done => "done",
        };
        f.write_str(label)
    }
}

/// Shared run state of an engine. Only one run may be active at a time.
#[derive(Debug, Clone, Default)]
pub struct RunStateCell {
    inner: Arc<Mutex<RunState>>,
}

impl RunStateCell {
    pub fn current(&self) -> RunState {
        *self.lock()
    }

    /// Starts a run, or rejects it while another one is active.
    pub fn begin(&self) -> Result<RunGuard> {
        let mut state = self.lock();
        if state.is_active() {
            return Err(ScanError::RunInProgress {
                state: state.to_string(),
            });
        }
        *state = RunState::Submitting;

        Ok(RunGuard {
            cell: self.clone(),
            finished: false,
        })
    }

    fn set(&self, next: RunState) {
        *self.lock() = next;
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        // 狀態只是單一 enum，中毒後的值仍然可用
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held for the duration of a run. Dropping it before [`RunGuard::finish`]
/// (for example when the run future is cancelled) returns the state to `Idle`.
#[derive(Debug)]
pub struct RunGuard {
    cell: RunStateCell,
    finished: bool,
}

impl RunGuard {
    pub fn advance(&self, next: RunState) {
        tracing::debug!("Run state: {} → {}", self.cell.current(), next);
        self.cell.set(next);
    }

    pub fn finish(mut self) {
        self.cell.set(RunState::Done);
        self.finished = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.cell.set(RunState::Idle);
        }
    }
}

//! Bounded waits for workflow stages.
//!
//! Each stage runs on its own worker thread while the caller waits on a
//! channel with `recv_timeout`. A stage that overruns is abandoned: its
//! result is discarded when it eventually finishes.

use crate::error::{GameError, Result};
use crate::events::{Event, EventSender, Stage, WorkflowEvent};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

/// Wall-clock budget shared by all stages of one workflow
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// Time left before the budget runs out
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }

    fn timed_out(&self, stage: Stage, events: &EventSender) -> GameError {
        warn!(stage = %stage, budget_ms = self.budget.as_millis() as u64, "Workflow budget exhausted");
        events.send(Event::Workflow(WorkflowEvent::TimedOut {
            stage,
            budget_ms: self.budget.as_millis() as u64,
        }));
        GameError::Timeout {
            stage: stage.activity().to_string(),
            budget: self.budget,
        }
    }

    /// Run `work` on a worker thread, waiting at most the remaining budget
    pub fn run<T, F>(&self, stage: Stage, events: &EventSender, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let remaining = self.remaining();
        if remaining.is_zero() {
            return Err(self.timed_out(stage, events));
        }

        events.send(Event::Workflow(WorkflowEvent::StageChanged { stage }));

        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name(format!("picture-match-{}", stage.to_string().to_lowercase()))
            .spawn(move || {
                let _ = tx.send(work());
            })
            .map_err(|e| GameError::Internal(format!("failed to start {} worker: {}", stage, e)))?;

        let outcome = match rx.recv_timeout(remaining) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => return Err(self.timed_out(stage, events)),
            Err(RecvTimeoutError::Disconnected) => Err(GameError::Internal(format!(
                "{} worker stopped without a result",
                stage
            ))),
        };

        if let Err(ref error) = outcome {
            events.send(Event::Workflow(WorkflowEvent::Failed {
                stage,
                message: error.to_string(),
            }));
        }
        outcome
    }
}

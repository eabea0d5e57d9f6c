//! Simulated generation progress
//!
//! The generation service gives no progress signal, so the UI is fed a fixed
//! cadence of stage indices instead. The simulator is purely cosmetic: it
//! never decides success or failure and can be stopped at any point.

use crate::state_machine::Event;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// One named step of the progress checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressStage {
    pub text: &'static str,
    pub icon: &'static str,
}

pub const PROGRESS_STAGES: [ProgressStage; 5] = [
    ProgressStage {
        text: "Understanding your requirements...",
        icon: "🔍",
    },
    ProgressStage {
        text: "Crafting intelligent questions...",
        icon: "🧠",
    },
    ProgressStage {
        text: "Optimizing user experience...",
        icon: "✨",
    },
    ProgressStage {
        text: "Applying industry best practices...",
        icon: "🎯",
    },
    ProgressStage {
        text: "Finalizing your perfect form...",
        icon: "🚀",
    },
];

/// Cadence and ceiling of the simulated progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressConfig {
    pub interval: Duration,
    pub max_stage: usize,
}

impl ProgressConfig {
    /// Labels for every stage this configuration can reach
    pub fn stages(&self) -> Vec<ProgressStage> {
        PROGRESS_STAGES
            .iter()
            .take(self.max_stage + 1)
            .copied()
            .collect()
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_stage: PROGRESS_STAGES.len() - 1,
        }
    }
}

/// Emits `ProgressTick` events for one epoch at a time
pub struct ProgressSimulator {
    config: ProgressConfig,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl ProgressSimulator {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            cancel: None,
            task: None,
        }
    }

    /// Emit stage 0 now, then one more stage per interval up to the maximum.
    ///
    /// A timer still running from an earlier start is stopped first.
    pub fn start(&mut self, epoch: u64, event_tx: mpsc::Sender<Event>) {
        self.stop();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_ticks(epoch, self.config, event_tx, cancel.clone()));
        self.cancel = Some(cancel);
        self.task = Some(task);
    }

    /// Halt emission immediately. Idempotent.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.task = None;
    }

    /// Check if the timer task is still emitting
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticks(
    epoch: u64,
    config: ProgressConfig,
    event_tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for stage in 0..=config.max_stage {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            sent = event_tx.send(Event::ProgressTick { epoch, stage }) => {
                if sent.is_err() {
                    // Runtime is gone
                    return;
                }
            }
        }
    }

    tracing::debug!(epoch, "Progress reached final stage");
}

//! One watched pipeline, from first poll to terminal status.
//!
//! The loop is self-paced: the next tick is scheduled only after the current
//! query has settled, so a slow backend stretches the cycle instead of
//! stacking requests. Stopping is cooperative — a query already in flight is
//! allowed to finish, but its result is dropped once the session is inactive.

use crate::api::StatusSource;
use crate::app::UNKNOWN_STAGE_LABEL;
use crate::backoff::{Backoff, PollConfig};
use crate::events::AppEvent;
use crate::machine::{self, PipelineMachine};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tokio::time;

/// Handle to a spawned polling loop. Dropping the handle stops the loop.
pub struct PollingSession {
    active: Arc<AtomicBool>,
    cancel_tx: watch::Sender<bool>,
    kick: Arc<Notify>,
}

impl PollingSession {
    pub fn spawn(
        source: Arc<dyn StatusSource>,
        project_id: u64,
        pipeline_id: u64,
        config: PollConfig,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let kick = Arc::new(Notify::new());

        let session_loop = SessionLoop {
            source,
            project_id,
            pipeline_id,
            tx,
            active: active.clone(),
            cancel_rx,
            kick: kick.clone(),
            backoff: Backoff::new(config),
            machine: PipelineMachine::new(),
        };
        tokio::spawn(session_loop.run());

        Self {
            active,
            cancel_tx,
            kick,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Skip the remaining wait and poll on the next loop iteration.
    pub fn poll_now(&self) {
        self.kick.notify_one();
    }

    /// Idempotent. An in-flight query finishes but its result is discarded.
    pub fn stop(&self) {
        self.active.store(false, Ordering::Relaxed);
        let _ = self.cancel_tx.send(true);
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

struct SessionLoop {
    source: Arc<dyn StatusSource>,
    project_id: u64,
    pipeline_id: u64,
    tx: mpsc::UnboundedSender<AppEvent>,
    active: Arc<AtomicBool>,
    cancel_rx: watch::Receiver<bool>,
    kick: Arc<Notify>,
    backoff: Backoff,
    machine: PipelineMachine,
}

impl SessionLoop {
    async fn run(mut self) {
        loop {
            if !self.active.load(Ordering::Relaxed) {
                return;
            }

            let result = self
                .source
                .fetch_status(self.project_id, self.pipeline_id)
                .await;

            // Stopped while the query was in flight: the late result is inert.
            if !self.active.load(Ordering::Relaxed) {
                return;
            }

            let delay = match result {
                Ok(snapshot) => {
                    if let Some(outcome) = self.machine.observe(snapshot.status) {
                        self.active.store(false, Ordering::Relaxed);
                        let summary = machine::closing_stage(&snapshot.stages).map(|(_, s)| {
                            let name = s.name.as_deref().unwrap_or(UNKNOWN_STAGE_LABEL);
                            format!("{name} ({})", s.status.label())
                        });
                        tracing::info!(
                            pipeline_id = self.pipeline_id,
                            status = snapshot.status.label(),
                            "pipeline reached terminal status"
                        );
                        let _ = self.tx.send(AppEvent::Snapshot {
                            snapshot,
                            next_delay_ms: 0,
                        });
                        let _ = self.tx.send(AppEvent::Finished { outcome, summary });
                        return;
                    }
                    let next = self.backoff.on_success();
                    let sent = self.tx.send(AppEvent::Snapshot {
                        snapshot,
                        next_delay_ms: next.as_millis() as u64,
                    });
                    if sent.is_err() {
                        return;
                    }
                    next
                }
                Err(err) => {
                    tracing::warn!(
                        pipeline_id = self.pipeline_id,
                        errors = self.backoff.consecutive_errors() + 1,
                        "status query failed: {err}"
                    );
                    if self.backoff.on_failure() {
                        self.active.store(false, Ordering::Relaxed);
                        let _ = self.tx.send(AppEvent::StatusUnavailable {
                            message: format!("status unavailable: {err}"),
                        });
                        return;
                    }
                    // Retry at the unchanged delay.
                    self.backoff.current_delay()
                }
            };

            tokio::select! {
                () = time::sleep(delay) => {}
                _ = self.cancel_rx.changed() => return,
                () = self.kick.notified() => {}
            }
        }
    }
}

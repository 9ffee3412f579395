//! Background removal of expired sessions.

use crate::store::SessionStore;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Outcome of one sweep cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    /// Sessions that were expired but could not be removed.
    pub failed: Vec<String>,
}

/// Runs one cycle: removes every session expired at the store clock's
/// current time.
///
/// Each session is locked before it is checked, so a request already running
/// against it finishes first. The session is marked retired under that same
/// lock, which makes any request still queued on it fail with
/// `SessionNotFound` instead of mutating a detached session. A failure on one
/// session is logged and the cycle moves on.
pub async fn sweep_expired(store: &SessionStore) -> SweepReport {
    let now = store.clock().now();
    let mut report = SweepReport::default();

    for (id, handle) in store.snapshot().await {
        let mut session = handle.lock().await;
        if session.retired || !session.is_expired_at(now) {
            continue;
        }
        match store.detach(&id, &handle).await {
            Ok(()) => {
                session.retired = true;
                report.removed += 1;
                info!(session_id = %id, "Cleaning up expired session");
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to remove expired session");
                report.failed.push(id);
            }
        }
    }

    report
}

/// Starts sweep loops. See [`SweeperHandle`] for shutdown.
pub struct Sweeper;

impl Sweeper {
    /// Spawns the sweep loop: sleep `interval`, sweep, repeat until stopped.
    pub fn start(store: SessionStore, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Session sweeper started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let report = sweep_expired(&store).await;
                if report.failed.is_empty() && report.removed == 0 {
                    debug!("Sweep cycle found no expired sessions");
                } else if report.failed.is_empty() {
                    info!(removed = report.removed, "Sweep cycle finished");
                } else {
                    warn!(
                        removed = report.removed,
                        failed = report.failed.len(),
                        "Sweep cycle finished with failures"
                    );
                }
            }
            info!("Session sweeper stopped");
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Owner of a running sweep loop. Dropping it also ends the loop.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the loop to exit and waits for it. Does not wait out a pending
    /// sleep.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Session sweeper task failed");
        }
    }
}

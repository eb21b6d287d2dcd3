use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::reconciler::{ReconcileOutcome, Reconciler};

/// Triggers non-forced reconciliation; the reconciler's TTL gate decides
/// whether a tick does any filesystem work.
#[derive(Clone)]
pub struct ProtectionScheduler {
    reconciler: Arc<Reconciler>,
    interval: Duration,
}

impl ProtectionScheduler {
    pub fn new(reconciler: Arc<Reconciler>, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
        }
    }

    /// Run one gated pass.
    pub async fn tick(&self) -> ReconcileOutcome {
        let outcome = self.reconciler.reconcile(false).await;
        if let ReconcileOutcome::Failed { failures, .. } = &outcome {
            for failure in failures {
                warn!(
                    directory = %self.reconciler.directory().path().display(),
                    file = %failure.file,
                    error = %failure.error,
                    "Protection files are not in place, will retry"
                );
            }
        }
        outcome
    }

    /// Tick forever at the configured interval.
    pub async fn run(self) {
        info!(
            interval_secs = self.interval.as_secs(),
            directory = %self.reconciler.directory().path().display(),
            "Starting protection scheduler"
        );

        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

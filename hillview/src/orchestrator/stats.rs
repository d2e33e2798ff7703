//! Job outcome counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobOutcome {
    /// Results were published.
    Published,
    /// The job observed its abort flag and discarded its work.
    Aborted,
    /// A stage failed; an error (and possibly a fallback result) was published.
    Failed,
}

/// Lock-free counters updated as jobs finish.
#[derive(Debug, Default)]
pub(crate) struct OrchestratorCounters {
    submitted: AtomicU64,
    published: AtomicU64,
    aborted: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

impl OrchestratorCounters {
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: JobOutcome) {
        let counter = match outcome {
            JobOutcome::Published => &self.published,
            JobOutcome::Aborted => &self.aborted,
            JobOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> OrchestratorStats {
        OrchestratorStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Reports one job's outcome exactly once.
///
/// Owned by the job's task. If the task is dropped before it reports, the
/// job counts as aborted when its token was cancelled and as failed
/// otherwise.
#[derive(Debug)]
pub(crate) struct OutcomeSlot {
    counters: Arc<OrchestratorCounters>,
    cancellation: CancellationToken,
    recorded: bool,
}

impl OutcomeSlot {
    pub fn new(counters: Arc<OrchestratorCounters>, cancellation: CancellationToken) -> Self {
        Self {
            counters,
            cancellation,
            recorded: false,
        }
    }

    pub fn record(mut self, outcome: JobOutcome) {
        self.counters.record_outcome(outcome);
        self.recorded = true;
    }
}

impl Drop for OutcomeSlot {
    fn drop(&mut self) {
        if self.recorded {
            return;
        }
        let outcome = if self.cancellation.is_cancelled() {
            JobOutcome::Aborted
        } else {
            JobOutcome::Failed
        };
        self.counters.record_outcome(outcome);
    }
}

/// Job totals since the orchestrator was created.
///
/// Every submitted job ends up in exactly one of `published`, `aborted` or
/// `failed` once its task is gone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorStats {
    pub submitted: u64,
    pub published: u64,
    pub aborted: u64,
    pub failed: u64,
    pub rejected: u64,
}

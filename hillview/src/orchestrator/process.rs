//! Tracking of in-flight jobs.
//!
//! Every accepted CONFIG or AREA request becomes a [`ProcessDescriptor`] in
//! the [`ProcessTable`]. The descriptor is removed by a [`ProcessGuard`]
//! owned by the job's task, so removal happens on every exit path: normal
//! completion, failure, and the task being dropped by an abort.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

// =============================================================================
// Process Kind
// =============================================================================

/// The kind of request a job serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessKind {
    Config,
    Area,
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessKind::Config => write!(f, "CONFIG"),
            ProcessKind::Area => write!(f, "AREA"),
        }
    }
}

// =============================================================================
// Process Descriptor
// =============================================================================

/// A tracked job.
#[derive(Debug)]
pub(crate) struct ProcessDescriptor {
    /// Caller-supplied identifier.
    pub process_id: String,

    /// Lower value means higher priority.
    pub priority: i32,

    pub kind: ProcessKind,

    pub started_at: Instant,

    /// Cooperative abort flag, checked at the job's checkpoints.
    pub cancellation: CancellationToken,

    /// Forceful cancellation of the job's task. Set right after spawning.
    pub abort_handle: Option<AbortHandle>,

    /// Distinguishes successive jobs that reuse one process id.
    pub seq: u64,
}

impl ProcessDescriptor {
    fn abort(&self) {
        self.cancellation.cancel();
        if let Some(handle) = &self.abort_handle {
            handle.abort();
        }
    }
}

/// Point-in-time view of a tracked job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSnapshot {
    pub process_id: String,
    pub kind: ProcessKind,
    pub priority: i32,
    pub age: Duration,
    pub aborted: bool,
}

/// What an abort needs: the flag and the task handle.
///
/// Collected under the table's shard locks and fired after they are
/// released.
#[derive(Debug, Clone)]
pub(crate) struct AbortTarget {
    pub process_id: String,
    pub priority: i32,
    cancellation: CancellationToken,
    abort_handle: Option<AbortHandle>,
}

impl AbortTarget {
    /// Sets the abort flag.
    pub fn flag(&self) {
        self.cancellation.cancel();
    }

    /// Tears the task down.
    pub fn cancel_task(&self) {
        if let Some(handle) = &self.abort_handle {
            handle.abort();
        }
    }
}

// =============================================================================
// Process Table
// =============================================================================

/// Concurrent map of tracked jobs, keyed by process id.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProcessTable {
    processes: Arc<DashMap<String, ProcessDescriptor>>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job and returns the guard that will remove it.
    ///
    /// A previous job with the same id is replaced; the caller is expected
    /// to have aborted it first.
    pub fn register(&self, descriptor: ProcessDescriptor) -> ProcessGuard {
        let guard = ProcessGuard {
            table: self.clone(),
            process_id: descriptor.process_id.clone(),
            seq: descriptor.seq,
        };
        if let Some(previous) = self
            .processes
            .insert(descriptor.process_id.clone(), descriptor)
        {
            previous.abort();
        }
        guard
    }

    /// Attaches the task handle once the job has been spawned.
    pub fn set_abort_handle(&self, process_id: &str, seq: u64, handle: AbortHandle) {
        let already_cancelled = match self.processes.get_mut(process_id) {
            Some(mut entry) if entry.seq == seq => {
                entry.abort_handle = Some(handle.clone());
                entry.cancellation.is_cancelled()
            }
            // Already finished and removed
            _ => false,
        };
        if already_cancelled {
            handle.abort();
        }
    }

    /// Jobs whose priority is numerically greater than `priority`, plus any
    /// job already registered under `process_id`.
    pub fn preemption_targets(&self, priority: i32, process_id: &str) -> Vec<AbortTarget> {
        self.processes
            .iter()
            .filter(|entry| entry.priority > priority || entry.process_id == process_id)
            .filter(|entry| !entry.cancellation.is_cancelled())
            .map(|entry| target_of(&entry))
            .collect()
    }

    /// The job registered under `process_id`, if any.
    pub fn target(&self, process_id: &str) -> Option<AbortTarget> {
        self.processes.get(process_id).map(|entry| target_of(&entry))
    }

    /// Every tracked job.
    pub fn all_targets(&self) -> Vec<AbortTarget> {
        self.processes.iter().map(|entry| target_of(&entry)).collect()
    }

    pub fn snapshots(&self) -> Vec<ProcessSnapshot> {
        let mut snapshots: Vec<ProcessSnapshot> = self
            .processes
            .iter()
            .map(|entry| ProcessSnapshot {
                process_id: entry.process_id.clone(),
                kind: entry.kind,
                priority: entry.priority,
                age: entry.started_at.elapsed(),
                aborted: entry.cancellation.is_cancelled(),
            })
            .collect();
        snapshots.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.process_id.cmp(&b.process_id))
        });
        snapshots
    }

    pub fn contains(&self, process_id: &str) -> bool {
        self.processes.contains_key(process_id)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    fn remove(&self, process_id: &str, seq: u64) {
        if self
            .processes
            .remove_if(process_id, |_, d| d.seq == seq)
            .is_some()
        {
            trace!(process_id, seq, "Process removed");
        }
    }
}

fn target_of(descriptor: &ProcessDescriptor) -> AbortTarget {
    AbortTarget {
        process_id: descriptor.process_id.clone(),
        priority: descriptor.priority,
        cancellation: descriptor.cancellation.clone(),
        abort_handle: descriptor.abort_handle.clone(),
    }
}

// =============================================================================
// Process Guard
// =============================================================================

/// Removes a job from the table when dropped.
///
/// Only the entry it registered is removed: a newer job that reused the
/// process id is left alone.
#[derive(Debug)]
pub(crate) struct ProcessGuard {
    table: ProcessTable,
    process_id: String,
    seq: u64,
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        self.table.remove(&self.process_id, self.seq);
    }
}

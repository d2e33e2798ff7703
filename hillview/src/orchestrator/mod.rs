//! Priority-ordered job orchestration.
//!
//! The orchestrator turns inbound requests into independently cancellable
//! tokio tasks and makes sure only the most relevant job's results reach the
//! consumer.
//!
//! # Architecture
//!
//! ```text
//!  InboundMessage ──► Orchestrator ──► preempt lower priority (gate)
//!                          │
//!                          ├── CONFIG ─► drop disabled sources ─► republish
//!                          │                                   └► follow-up AREA
//!                          │
//!                          └── AREA ───► load sources (concurrently)
//!                                          │  merge into SourceStore
//!                                          ▼
//!                                       AreaCuller ─► RangeCuller
//!                                          │
//!                                          ▼
//!                                    UpdatePublisher ──► consumer
//! ```
//!
//! # Priority preemption
//!
//! Lower number means higher priority. Submitting a job with priority `P`
//! aborts every tracked job with priority strictly greater than `P` before
//! the new job is spawned. Jobs with priority `<= P` keep running. The
//! preemption loop runs under a submission gate so two submissions cannot
//! interleave their preemptions.
//!
//! # Abort
//!
//! An abort sets the job's [`CancellationToken`] under the publisher's gate
//! and then aborts the job's task. The token is checked before each source
//! load, before each culling stage and, under the publisher's gate, before
//! publishing; the task abort tears down anything blocked in between.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod error;
mod job;
mod process;
mod stats;


pub use error::OrchestratorError;
pub use process::{ProcessKind, ProcessSnapshot};
pub use stats::OrchestratorStats;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::defaults::{
    DEFAULT_FOLLOWUP_PRIORITY, DEFAULT_LOADER_TIMEOUT_SECS, DEFAULT_MAX_AREA_PHOTOS,
    DEFAULT_MAX_RANGE_PHOTOS,
};
use crate::geo::{Bounds, LatLng};
use crate::message::{
    AreaRequest, ConfigRequest, InboundMessage, MessageError, OutboundMessage,
};
use crate::publisher::UpdatePublisher;
use crate::source::{AuthTokenProvider, NoAuth, SourceLoader};
use crate::store::SourceStore;

use process::{AbortTarget, ProcessDescriptor, ProcessGuard, ProcessTable};
use stats::{JobOutcome, OrchestratorCounters, OutcomeSlot};

// =============================================================================
// Settings
// =============================================================================

/// Tunables for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    /// Area cap used when a request sends `0`.
    pub max_area_photos: usize,

    /// Range cap used when a request omits one.
    pub max_range_photos: usize,

    /// Priority of the AREA job synthesized after a CONFIG.
    pub followup_priority: i32,

    /// Deadline handed to source loaders, measured from the start of each
    /// load. The orchestrator itself never times a job out.
    pub load_timeout: Option<Duration>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_area_photos: DEFAULT_MAX_AREA_PHOTOS,
            max_range_photos: DEFAULT_MAX_RANGE_PHOTOS,
            followup_priority: DEFAULT_FOLLOWUP_PRIORITY,
            load_timeout: Some(Duration::from_secs(DEFAULT_LOADER_TIMEOUT_SECS)),
        }
    }
}

/// The last viewport an AREA job was accepted for, with caps resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Viewport {
    pub bounds: Bounds,
    pub range: f64,
    pub center: Option<LatLng>,
    pub area_cap: usize,
    pub range_cap: usize,
}

impl Viewport {
    fn resolve(request: &AreaRequest, settings: &OrchestratorSettings) -> Self {
        Self {
            bounds: request.bounds,
            range: request.range,
            center: request.center,
            area_cap: if request.max_photos > 0 {
                request.max_photos
            } else {
                settings.max_area_photos
            },
            range_cap: request
                .max_range_photos
                .unwrap_or(settings.max_range_photos),
        }
    }

    pub fn focal_point(&self) -> LatLng {
        self.center.unwrap_or_else(|| self.bounds.center())
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Dispatches CONFIG, AREA, ABORT and CLEANUP requests.
///
/// Cheap to clone; clones share all state. Must be used from within a tokio
/// runtime since jobs are spawned as tasks.
pub struct Orchestrator<L> {
    inner: Arc<Inner<L>>,
}

impl<L> Clone for Orchestrator<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<L> {
    loader: L,
    auth: Arc<dyn AuthTokenProvider>,
    store: SourceStore,
    publisher: UpdatePublisher,
    settings: OrchestratorSettings,
    processes: ProcessTable,
    /// Serializes preemption and registration.
    submit_gate: Mutex<()>,
    viewport: RwLock<Option<Viewport>>,
    next_seq: AtomicU64,
    counters: Arc<OrchestratorCounters>,
}

impl<L: SourceLoader> Orchestrator<L> {
    /// Creates an orchestrator for anonymous sessions.
    pub fn new(loader: L, publisher: UpdatePublisher, settings: OrchestratorSettings) -> Self {
        Self::with_auth(loader, publisher, settings, Arc::new(NoAuth))
    }

    /// Creates an orchestrator whose loads carry tokens from `auth`.
    pub fn with_auth(
        loader: L,
        publisher: UpdatePublisher,
        settings: OrchestratorSettings,
        auth: Arc<dyn AuthTokenProvider>,
    ) -> Self {
        debug!(?settings, "Creating orchestrator");
        Self {
            inner: Arc::new(Inner {
                loader,
                auth,
                store: SourceStore::new(),
                publisher,
                settings,
                processes: ProcessTable::new(),
                submit_gate: Mutex::new(()),
                viewport: RwLock::new(None),
                next_seq: AtomicU64::new(0),
                counters: Arc::new(OrchestratorCounters::default()),
            }),
        }
    }

    /// Parses one raw JSON message and dispatches it.
    ///
    /// A malformed message is reported to the consumer as an `error` and
    /// returned as [`OrchestratorError::Rejected`].
    pub async fn handle_message(
        &self,
        raw: &str,
    ) -> Result<Option<JoinHandle<()>>, OrchestratorError> {
        match InboundMessage::parse(raw) {
            Ok(message) => self.dispatch(message).await,
            Err(e) => Err(self.reject(e).await),
        }
    }

    /// Dispatches an already parsed message.
    ///
    /// Returns the job's task handle for CONFIG and AREA.
    pub async fn dispatch(
        &self,
        message: InboundMessage,
    ) -> Result<Option<JoinHandle<()>>, OrchestratorError> {
        debug!(
            kind = message.kind(),
            process_id = message.process_id(),
            priority = message.priority(),
            "Dispatching message"
        );
        match message {
            InboundMessage::Config(request) => self.submit_config(request).await.map(Some),
            InboundMessage::Area(request) => self.submit_area(request).await.map(Some),
            InboundMessage::Abort(request) => {
                self.abort(&request.process_id).await;
                Ok(None)
            }
            InboundMessage::Cleanup(_) => {
                self.cleanup().await;
                Ok(None)
            }
        }
    }

    /// Applies a source configuration change.
    ///
    /// Drops stored photos of sources that are no longer enabled and
    /// republishes what remains. If a viewport is known, an AREA job for it
    /// follows at the configured follow-up priority so the enabled sources
    /// reload.
    pub async fn submit_config(
        &self,
        request: ConfigRequest,
    ) -> Result<JoinHandle<()>, OrchestratorError> {
        if let Err(e) = request.validate() {
            return Err(self.reject(e).await);
        }

        let _gate = self.inner.submit_gate.lock().await;
        self.preempt(request.priority, &request.process_id).await;

        let process_id = request.process_id.clone();
        let (guard, slot, cancellation, seq) =
            self.register(&process_id, request.priority, ProcessKind::Config);

        let this = self.clone();
        let handle = tokio::spawn(async move {
            let (outcome, followup) = this.run_config(&request, &cancellation).await;
            this.finish(slot, &request.process_id, ProcessKind::Config, outcome);
            // Leave the table before the follow-up preempts, so a CONFIG
            // with a lower priority than the follow-up cannot abort itself.
            drop(guard);
            if let Some(area) = followup {
                if let Err(e) = this.submit_area(area).await {
                    warn!(error = %e, "Follow-up area request rejected");
                }
            }
        });
        self.inner
            .processes
            .set_abort_handle(&process_id, seq, handle.abort_handle());

        Ok(handle)
    }

    /// Loads, culls and publishes photos for a viewport.
    pub async fn submit_area(
        &self,
        request: AreaRequest,
    ) -> Result<JoinHandle<()>, OrchestratorError> {
        if let Err(e) = request.validate() {
            return Err(self.reject(e).await);
        }
        let viewport = Viewport::resolve(&request, &self.inner.settings);

        let _gate = self.inner.submit_gate.lock().await;
        self.preempt(request.priority, &request.process_id).await;
        self.set_viewport(Some(viewport));

        let process_id = request.process_id.clone();
        let (guard, slot, cancellation, seq) =
            self.register(&process_id, request.priority, ProcessKind::Area);

        let this = self.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            let outcome = this.run_area(&request, &viewport, &cancellation).await;
            this.finish(slot, &request.process_id, ProcessKind::Area, outcome);
        });
        self.inner
            .processes
            .set_abort_handle(&process_id, seq, handle.abort_handle());

        Ok(handle)
    }

    /// Aborts the named job.
    ///
    /// Returns `false` if no such job is tracked; that is not an error.
    pub async fn abort(&self, process_id: &str) -> bool {
        match self.inner.processes.target(process_id) {
            Some(target) => {
                self.abort_targets(std::slice::from_ref(&target)).await;
                info!(process_id, "Process aborted");
                true
            }
            None => {
                debug!(process_id, "Abort for unknown process ignored");
                false
            }
        }
    }

    /// Aborts every tracked job and drops all accumulated state.
    ///
    /// The orchestrator remains usable afterwards.
    pub async fn cleanup(&self) {
        let _gate = self.inner.submit_gate.lock().await;
        let targets = self.inner.processes.all_targets();
        self.abort_targets(&targets).await;
        self.inner.store.clear().await;
        self.set_viewport(None);
        info!(aborted = targets.len(), "Orchestrator cleaned up");
    }

    /// Snapshots of the jobs currently tracked, highest priority first.
    pub fn active_processes(&self) -> Vec<ProcessSnapshot> {
        self.inner.processes.snapshots()
    }

    /// Returns true while a job with this id is tracked.
    pub fn is_active(&self, process_id: &str) -> bool {
        self.inner.processes.contains(process_id)
    }

    /// Number of jobs currently tracked.
    pub fn active_count(&self) -> usize {
        self.inner.processes.len()
    }

    /// Job totals since creation.
    pub fn stats(&self) -> OrchestratorStats {
        self.inner.counters.snapshot()
    }

    pub fn store(&self) -> &SourceStore {
        &self.inner.store
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.inner.settings
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Aborts every job that must yield to a new job at `priority`.
    async fn preempt(&self, priority: i32, process_id: &str) {
        let targets = self.inner.processes.preemption_targets(priority, process_id);
        if targets.is_empty() {
            return;
        }
        self.abort_targets(&targets).await;
        for target in &targets {
            info!(
                victim = %target.process_id,
                victim_priority = target.priority,
                process_id,
                priority,
                "Preempted process"
            );
        }
    }

    async fn abort_targets(&self, targets: &[AbortTarget]) {
        self.inner
            .publisher
            .fence(|| targets.iter().for_each(AbortTarget::flag))
            .await;
        targets.iter().for_each(AbortTarget::cancel_task);
    }

    fn register(
        &self,
        process_id: &str,
        priority: i32,
        kind: ProcessKind,
    ) -> (ProcessGuard, OutcomeSlot, CancellationToken, u64) {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let cancellation = CancellationToken::new();
        let guard = self.inner.processes.register(ProcessDescriptor {
            process_id: process_id.to_string(),
            priority,
            kind,
            started_at: Instant::now(),
            cancellation: cancellation.clone(),
            abort_handle: None,
            seq,
        });
        self.inner.counters.record_submitted();
        let slot = OutcomeSlot::new(Arc::clone(&self.inner.counters), cancellation.clone());
        debug!(process_id, priority, %kind, "Process started");
        (guard, slot, cancellation, seq)
    }

    fn finish(
        &self,
        slot: OutcomeSlot,
        process_id: &str,
        kind: ProcessKind,
        outcome: JobOutcome,
    ) {
        slot.record(outcome);
        match outcome {
            JobOutcome::Published => debug!(process_id, %kind, "Process completed"),
            JobOutcome::Aborted => debug!(process_id, %kind, "Process discarded after abort"),
            JobOutcome::Failed => warn!(process_id, %kind, "Process failed"),
        }
    }

    async fn reject(&self, error: MessageError) -> OrchestratorError {
        warn!(error = %error, process_id = ?error.process_id(), "Rejected message");
        self.inner.counters.record_rejected();
        self.inner
            .publisher
            .publish_detached(OutboundMessage::error(error.process_id(), &error))
            .await;
        OrchestratorError::Rejected(error)
    }

    pub(crate) fn last_viewport(&self) -> Option<Viewport> {
        self.inner.viewport.read().ok().and_then(|v| *v)
    }

    fn set_viewport(&self, viewport: Option<Viewport>) {
        if let Ok(mut current) = self.inner.viewport.write() {
            *current = viewport;
        }
    }
}

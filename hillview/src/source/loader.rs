//! The source loader contract.
//!
//! The orchestrator never talks to a photo backend directly. It hands each
//! enabled source to a [`SourceLoader`] together with the viewport, a cap,
//! an abort signal and an auth token provider, and gets candidates back.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::geo::Bounds;
use crate::photo::{Candidate, SourceConfig};

/// Errors a loader may report for one source.
///
/// Any of these is isolated to the failing source: the job carries on with
/// the others and reports the failure as a loading status.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The backend could not be reached or refused the request.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with data that could not be understood.
    #[error("Invalid source data: {0}")]
    InvalidData(String),

    /// The loader gave up after its deadline passed.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The request's deadline passed before the load finished.
    #[error("Deadline passed before the load finished")]
    DeadlineExceeded,

    /// Local I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Supplies bearer tokens for authenticated sources.
pub trait AuthTokenProvider: Send + Sync {
    /// Current token, if the user is signed in.
    fn token(&self) -> Option<String>;
}

impl<F> AuthTokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Provider for anonymous sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthTokenProvider for NoAuth {
    fn token(&self) -> Option<String> {
        None
    }
}

/// Everything a loader needs to fetch one source.
#[derive(Clone)]
pub struct LoadRequest {
    /// Source to load.
    pub source: SourceConfig,

    /// Viewport to load for.
    pub bounds: Bounds,

    /// Upper bound on the number of photos wanted; `0` means no limit.
    pub max_photos: usize,

    /// Fires when the owning job is aborted or preempted.
    pub cancellation: CancellationToken,

    /// Point after which the loader should give up, if any.
    pub deadline: Option<Instant>,

    auth: Arc<dyn AuthTokenProvider>,
}

impl LoadRequest {
    /// Creates a request with no deadline.
    pub fn new(
        source: SourceConfig,
        bounds: Bounds,
        max_photos: usize,
        cancellation: CancellationToken,
        auth: Arc<dyn AuthTokenProvider>,
    ) -> Self {
        Self {
            source,
            bounds,
            max_photos,
            cancellation,
            deadline: None,
            auth,
        }
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// True once the owning job was aborted or preempted.
    ///
    /// Loaders poll this between batches and return an empty result when
    /// it turns true.
    pub fn should_abort(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// True once the deadline, if any, has passed.
    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with [`LoadError::DeadlineExceeded`] once the deadline has passed.
    ///
    /// A missed deadline is a failure, not an abort: the source keeps its
    /// previous photos.
    pub fn check_deadline(&self) -> Result<(), LoadError> {
        if self.deadline_passed() {
            Err(LoadError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    /// Current auth token, if any.
    pub fn auth_token(&self) -> Option<String> {
        self.auth.token()
    }
}

impl std::fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadRequest")
            .field("source", &self.source.id)
            .field("bounds", &self.bounds)
            .field("max_photos", &self.max_photos)
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// Fetches candidate photos for one source.
///
/// # Contract
///
/// - Poll [`LoadRequest::should_abort`] at reasonable intervals and return
///   `Ok(vec![])` once it is true; an abort is not an error.
/// - Stop with `Err` once the deadline passes ([`LoadRequest::check_deadline`]);
///   never return an empty success for a load cut short by the deadline.
/// - Return `Err` only for genuine failures. The orchestrator turns it into
///   a per-source loading status and keeps the source's previous photos.
/// - Honour `max_photos` when the backend can; the orchestrator culls
///   anyway.
pub trait SourceLoader: Send + Sync + 'static {
    /// Loads photos for `request.source` inside `request.bounds`.
    fn load(
        &self,
        request: LoadRequest,
    ) -> impl Future<Output = Result<Vec<Candidate>, LoadError>> + Send;
}

impl<L: SourceLoader> SourceLoader for Arc<L> {
    fn load(
        &self,
        request: LoadRequest,
    ) -> impl Future<Output = Result<Vec<Candidate>, LoadError>> + Send {
        L::load(self, request)
    }
}

//! Deadline adapter for loaders.

use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use super::loader::{LoadError, LoadRequest, SourceLoader};
use crate::photo::Candidate;

/// Wraps a loader and fails any load that runs longer than `timeout`.
///
/// The deadline is also written into the request so a cooperative inner
/// loader can stop early through [`LoadRequest::check_deadline`]. An early
/// stop is reported as [`LoadError::Timeout`] like any other overrun.
#[derive(Debug, Clone)]
pub struct TimeoutLoader<L> {
    inner: L,
    timeout: Duration,
}

impl<L: SourceLoader> TimeoutLoader<L> {
    pub fn new(inner: L, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<L: SourceLoader> SourceLoader for TimeoutLoader<L> {
    async fn load(&self, request: LoadRequest) -> Result<Vec<Candidate>, LoadError> {
        let deadline = Instant::now() + self.timeout;
        let deadline = match request.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        let source_id = request.source.id.clone();
        let request = request.with_deadline(Some(deadline));

        match tokio::time::timeout_at(deadline, self.inner.load(request)).await {
            Ok(Err(LoadError::DeadlineExceeded)) => {
                warn!(source_id, timeout = ?self.timeout, "Source load stopped at deadline");
                Err(LoadError::Timeout(self.timeout))
            }
            Ok(result) => result,
            Err(_) => {
                warn!(source_id, timeout = ?self.timeout, "Source load timed out");
                Err(LoadError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Bounds, LatLng};
    use crate::photo::{SourceConfig, SourceKind};
    use crate::source::{CatalogLoader, NoAuth};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct NeverLoader;

    impl SourceLoader for NeverLoader {
        async fn load(&self, _request: LoadRequest) -> Result<Vec<Candidate>, LoadError> {
            std::future::pending().await
        }
    }

    fn request() -> LoadRequest {
        LoadRequest::new(
            SourceConfig::new("s", SourceKind::Stream),
            Bounds::new(LatLng::new(1.0, 0.0), LatLng::new(0.0, 1.0)),
            0,
            CancellationToken::new(),
            Arc::new(NoAuth),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_loader_times_out() {
        let loader = TimeoutLoader::new(NeverLoader, Duration::from_secs(5));
        let result = loader.load(request()).await;
        assert!(matches!(result, Err(LoadError::Timeout(d)) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_cooperative_stop_at_deadline_is_a_timeout() {
        let inner = CatalogLoader::new().with_source(
            "s",
            vec![Candidate::new("1", "s", LatLng::new(0.5, 0.5), 0.0)],
        );
        let loader = TimeoutLoader::new(inner, Duration::ZERO);
        let result = loader.load(request()).await;
        assert!(matches!(result, Err(LoadError::Timeout(d)) if d == Duration::ZERO));
    }

    #[tokio::test]
    async fn test_fast_loader_passes_through() {
        let inner = CatalogLoader::new().with_source(
            "s",
            vec![Candidate::new("1", "s", LatLng::new(0.5, 0.5), 0.0)],
        );
        let loader = TimeoutLoader::new(inner, Duration::from_secs(5));
        let photos = loader.load(request()).await.unwrap();
        assert_eq!(photos.len(), 1);
    }
}

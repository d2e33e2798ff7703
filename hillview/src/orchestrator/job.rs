//! Job bodies for CONFIG and AREA requests.

use std::collections::HashSet;

use futures::future::join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::stats::JobOutcome;
use super::{Orchestrator, Viewport};
use crate::culling::{AreaCuller, CullError, RangeCuller};
use crate::message::{AreaRequest, ConfigRequest, OutboundMessage};
use crate::photo::{Candidate, RangeCandidate, SourceConfig};
use crate::source::{LoadError, LoadRequest, SourceLoader};

/// Suffix of the process id given to the AREA job that follows a CONFIG.
const FOLLOWUP_SUFFIX: &str = "-area";

impl<L: SourceLoader> Orchestrator<L> {
    /// Loads every enabled source, then culls and publishes.
    pub(super) async fn run_area(
        &self,
        request: &AreaRequest,
        viewport: &Viewport,
        cancellation: &CancellationToken,
    ) -> JobOutcome {
        let enabled: Vec<&SourceConfig> = request.sources.iter().filter(|s| s.enabled).collect();
        debug!(
            process_id = %request.process_id,
            sources = enabled.len(),
            bounds = %viewport.bounds,
            range = viewport.range,
            "Area job started"
        );

        let loaded: Vec<(String, Vec<Candidate>)> = join_all(
            enabled
                .iter()
                .map(|source| self.load_source(source, viewport, cancellation)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        if cancellation.is_cancelled() {
            return JobOutcome::Aborted;
        }

        let visible: HashSet<String> = enabled.iter().map(|s| s.id.clone()).collect();
        let Some(merged) = self
            .inner
            .store
            .commit_and_snapshot(loaded, &visible, cancellation)
            .await
        else {
            debug!(process_id = %request.process_id, "Discarded loads of aborted job");
            return JobOutcome::Aborted;
        };
        self.cull_and_publish(&request.process_id, merged, viewport, cancellation)
            .await
    }

    /// Drops disabled sources, republishes and decides on a follow-up.
    pub(super) async fn run_config(
        &self,
        request: &ConfigRequest,
        cancellation: &CancellationToken,
    ) -> (JobOutcome, Option<AreaRequest>) {
        if cancellation.is_cancelled() {
            return (JobOutcome::Aborted, None);
        }

        let enabled: HashSet<String> = request
            .sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.id.clone())
            .collect();
        let removed = self.inner.store.retain_sources(&enabled).await;
        debug!(
            process_id = %request.process_id,
            enabled = enabled.len(),
            removed = removed.len(),
            "Config applied"
        );

        let viewport = self.last_viewport();
        let outcome = match &viewport {
            Some(viewport) => {
                let merged = self.inner.store.snapshot(&enabled).await;
                self.cull_and_publish(&request.process_id, merged, viewport, cancellation)
                    .await
            }
            None => {
                let photos = self.inner.store.snapshot(&enabled).await;
                self.publish_photos(&request.process_id, photos, Vec::new(), cancellation)
                    .await
            }
        };

        if outcome == JobOutcome::Aborted || cancellation.is_cancelled() {
            return (JobOutcome::Aborted, None);
        }

        let followup = viewport.map(|viewport| AreaRequest {
            process_id: format!("{}{}", request.process_id, FOLLOWUP_SUFFIX),
            priority: self.inner.settings.followup_priority,
            sources: request.sources.clone(),
            bounds: viewport.bounds,
            max_photos: viewport.area_cap,
            range: viewport.range,
            center: viewport.center,
            max_range_photos: Some(viewport.range_cap),
        });
        (outcome, followup)
    }

    /// Loads one source.
    ///
    /// Returns the photos to commit for it. Failures are reported as a
    /// loading status and yield `None`, so the source's previous photos stay
    /// in place.
    async fn load_source(
        &self,
        source: &SourceConfig,
        viewport: &Viewport,
        cancellation: &CancellationToken,
    ) -> Option<(String, Vec<Candidate>)> {
        if cancellation.is_cancelled() {
            return None;
        }
        let publisher = &self.inner.publisher;
        publisher
            .publish(OutboundMessage::loading_started(&source.id), cancellation)
            .await;

        let deadline = self
            .inner
            .settings
            .load_timeout
            .map(|timeout| Instant::now() + timeout);
        let request = LoadRequest::new(
            source.clone(),
            viewport.bounds,
            viewport.area_cap,
            cancellation.clone(),
            self.inner.auth.clone(),
        )
        .with_deadline(deadline);

        let result = match self.inner.loader.load(request).await {
            // An empty answer after the deadline is a stalled load, not an
            // empty source.
            Ok(photos)
                if photos.is_empty()
                    && !cancellation.is_cancelled()
                    && deadline.is_some_and(|d| Instant::now() >= d) =>
            {
                Err(LoadError::DeadlineExceeded)
            }
            other => other,
        };

        match result {
            Ok(photos) => {
                if cancellation.is_cancelled() {
                    debug!(source_id = %source.id, "Discarded load of aborted job");
                    return None;
                }
                debug!(source_id = %source.id, loaded = photos.len(), "Source loaded");
                publisher
                    .publish(
                        OutboundMessage::loading_finished(&source.id, photos.len()),
                        cancellation,
                    )
                    .await;
                Some((source.id.clone(), photos))
            }
            Err(e) => {
                warn!(source_id = %source.id, error = %e, "Source load failed");
                publisher
                    .publish(OutboundMessage::loading_failed(&source.id, &e), cancellation)
                    .await;
                None
            }
        }
    }

    /// Culls `merged` for `viewport` and publishes the result.
    ///
    /// A culling failure is reported as an error followed by a plain
    /// truncation of the merged set.
    pub(super) async fn cull_and_publish(
        &self,
        process_id: &str,
        merged: Vec<Candidate>,
        viewport: &Viewport,
        cancellation: &CancellationToken,
    ) -> JobOutcome {
        if cancellation.is_cancelled() {
            return JobOutcome::Aborted;
        }

        match cull(merged.clone(), viewport, cancellation) {
            Ok((area, range)) => {
                debug!(
                    process_id,
                    in_area = area.len(),
                    in_range = range.len(),
                    "Culling complete"
                );
                self.publish_photos(process_id, area, range, cancellation)
                    .await
            }
            Err(CullError::Cancelled) => JobOutcome::Aborted,
            Err(e) => {
                warn!(process_id, error = %e, "Culling failed, publishing truncated set");
                let publisher = &self.inner.publisher;
                if !publisher
                    .publish(OutboundMessage::error(Some(process_id), &e), cancellation)
                    .await
                {
                    return JobOutcome::Aborted;
                }
                let mut fallback = merged;
                fallback.truncate(viewport.area_cap);
                match self
                    .publish_photos(process_id, fallback, Vec::new(), cancellation)
                    .await
                {
                    JobOutcome::Aborted => JobOutcome::Aborted,
                    _ => JobOutcome::Failed,
                }
            }
        }
    }

    async fn publish_photos(
        &self,
        process_id: &str,
        area: Vec<Candidate>,
        range: Vec<RangeCandidate>,
        cancellation: &CancellationToken,
    ) -> JobOutcome {
        let message = OutboundMessage::photos_update(process_id, area, range);
        if self.inner.publisher.publish(message, cancellation).await {
            JobOutcome::Published
        } else {
            JobOutcome::Aborted
        }
    }
}

/// Area stage, then range stage over its output.
fn cull(
    merged: Vec<Candidate>,
    viewport: &Viewport,
    cancellation: &CancellationToken,
) -> Result<(Vec<Candidate>, Vec<RangeCandidate>), CullError> {
    let area = AreaCuller::new(viewport.area_cap).cull(merged, &viewport.bounds, cancellation)?;
    if cancellation.is_cancelled() {
        return Err(CullError::Cancelled);
    }
    let range = RangeCuller::new(viewport.range_cap).cull(
        &area,
        &viewport.focal_point(),
        viewport.range,
        cancellation,
    )?;
    Ok((area, range))
}

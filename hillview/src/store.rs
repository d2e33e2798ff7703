//! Per-source accumulation of photos.
//!
//! The store maps a source id to the photos most recently loaded for that
//! source in the current viewport. It is the only state shared between
//! concurrently running jobs, so every access goes through one async mutex.
//! An AREA job commits all of its loads and reads the union it publishes in
//! one critical section, so another job's merge cannot land between the two.
//!
//! Iteration order is by source id, which keeps snapshots (and therefore
//! culling results) deterministic for an unchanged store.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::photo::Candidate;

/// Shared, cloneable handle to the per-source photo map.
#[derive(Debug, Clone, Default)]
pub struct SourceStore {
    sources: Arc<Mutex<BTreeMap<String, Vec<Candidate>>>>,
}

impl SourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the photos held for `source_id`.
    ///
    /// Photos are brought into canonical form first: bearings normalized,
    /// uids derived, duplicates by id and records with non-finite
    /// coordinates dropped. Returns the number of photos stored.
    pub async fn merge(&self, source_id: &str, photos: Vec<Candidate>) -> usize {
        let photos = canonicalize(source_id, photos);
        let count = photos.len();

        let mut sources = self.sources.lock().await;
        sources.insert(source_id.to_string(), photos);

        debug!(source_id, count, "Merged source photos");
        count
    }

    /// Replaces the photos of every loaded source, then returns the union
    /// of `visible`, all under one lock.
    ///
    /// Nothing is written and `None` is returned if `cancellation` has fired
    /// by the time the lock is held.
    pub async fn commit_and_snapshot(
        &self,
        loaded: Vec<(String, Vec<Candidate>)>,
        visible: &HashSet<String>,
        cancellation: &CancellationToken,
    ) -> Option<Vec<Candidate>> {
        let loaded: Vec<(String, Vec<Candidate>)> = loaded
            .into_iter()
            .map(|(source_id, photos)| {
                let photos = canonicalize(&source_id, photos);
                (source_id, photos)
            })
            .collect();

        let mut sources = self.sources.lock().await;
        if cancellation.is_cancelled() {
            return None;
        }
        for (source_id, photos) in loaded {
            debug!(source_id = %source_id, count = photos.len(), "Merged source photos");
            sources.insert(source_id, photos);
        }
        Some(union_of(&sources, visible))
    }

    /// Removes every source whose id is not in `keep`.
    ///
    /// Returns the ids that were removed.
    pub async fn retain_sources(&self, keep: &HashSet<String>) -> Vec<String> {
        let mut sources = self.sources.lock().await;
        let removed: Vec<String> = sources
            .keys()
            .filter(|id| !keep.contains(*id))
            .cloned()
            .collect();
        for id in &removed {
            sources.remove(id);
        }
        if !removed.is_empty() {
            debug!(?removed, "Dropped photos for disabled sources");
        }
        removed
    }

    /// Union of the photos of the given sources, in source id order.
    pub async fn snapshot(&self, visible: &HashSet<String>) -> Vec<Candidate> {
        union_of(&*self.sources.lock().await, visible)
    }

    /// Photos currently held for one source.
    pub async fn photos_for(&self, source_id: &str) -> Option<Vec<Candidate>> {
        self.sources.lock().await.get(source_id).cloned()
    }

    /// Ids of all sources with stored photos.
    pub async fn source_ids(&self) -> Vec<String> {
        self.sources.lock().await.keys().cloned().collect()
    }

    /// Total number of stored photos across all sources.
    pub async fn photo_count(&self) -> usize {
        self.sources.lock().await.values().map(Vec::len).sum()
    }

    /// Drops everything.
    pub async fn clear(&self) {
        self.sources.lock().await.clear();
    }
}

fn union_of(sources: &BTreeMap<String, Vec<Candidate>>, visible: &HashSet<String>) -> Vec<Candidate> {
    sources
        .iter()
        .filter(|(id, _)| visible.contains(*id))
        .flat_map(|(_, photos)| photos.iter().cloned())
        .collect()
}

fn canonicalize(source_id: &str, photos: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::with_capacity(photos.len());
    let mut out = Vec::with_capacity(photos.len());
    for photo in photos {
        if !photo.has_finite_coord() {
            warn!(source_id, photo_id = %photo.id, "Dropping photo with non-finite coordinates");
            continue;
        }
        if !seen.insert(photo.id.clone()) {
            continue;
        }
        out.push(photo.normalize_for(source_id));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;

    fn photo(id: &str, bearing: f64) -> Candidate {
        Candidate::new(id, "ignored", LatLng::new(1.0, 1.0), bearing)
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_merge_replaces_previous_list() {
        let store = SourceStore::new();
        store.merge("a", vec![photo("1", 0.0), photo("2", 0.0)]).await;
        store.merge("a", vec![photo("3", 0.0)]).await;

        let photos = store.photos_for("a").await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].uid, "a:3");
        assert_eq!(photos[0].source_id, "a");
    }

    #[tokio::test]
    async fn test_merge_drops_duplicates_and_bad_coordinates() {
        let store = SourceStore::new();
        let mut broken = photo("x", 0.0);
        broken.coord.lat = f64::NAN;

        let stored = store
            .merge("a", vec![photo("1", -10.0), photo("1", 20.0), broken])
            .await;

        assert_eq!(stored, 1);
        let photos = store.photos_for("a").await.unwrap();
        assert_eq!(photos[0].bearing, 350.0);
    }

    #[tokio::test]
    async fn test_snapshot_is_ordered_and_filtered() {
        let store = SourceStore::new();
        store.merge("zeta", vec![photo("z1", 0.0)]).await;
        store.merge("alpha", vec![photo("a1", 0.0), photo("a2", 0.0)]).await;
        store.merge("hidden", vec![photo("h1", 0.0)]).await;

        let snapshot = store.snapshot(&set(&["alpha", "zeta"])).await;
        let uids: Vec<&str> = snapshot.iter().map(|c| c.uid.as_str()).collect();
        assert_eq!(uids, vec!["alpha:a1", "alpha:a2", "zeta:z1"]);
    }

    #[tokio::test]
    async fn test_retain_sources_removes_others() {
        let store = SourceStore::new();
        store.merge("a", vec![photo("1", 0.0)]).await;
        store.merge("b", vec![photo("2", 0.0)]).await;

        let removed = store.retain_sources(&set(&["a"])).await;

        assert_eq!(removed, vec!["b".to_string()]);
        assert_eq!(store.source_ids().await, vec!["a".to_string()]);
        assert_eq!(store.photo_count().await, 1);
    }

    #[tokio::test]
    async fn test_cancelled_commit_is_skipped() {
        let store = SourceStore::new();
        store.merge("a", vec![photo("old", 0.0)]).await;

        let token = CancellationToken::new();
        token.cancel();
        let loaded = vec![("a".to_string(), vec![photo("new", 0.0)])];
        let committed = store
            .commit_and_snapshot(loaded.clone(), &set(&["a"]), &token)
            .await;

        assert_eq!(committed, None);
        assert_eq!(store.photos_for("a").await.unwrap()[0].id, "old");

        let live = CancellationToken::new();
        let committed = store
            .commit_and_snapshot(loaded, &set(&["a"]), &live)
            .await
            .unwrap();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].uid, "a:new");
    }

    #[tokio::test]
    async fn test_commit_reads_back_its_own_writes() {
        let store = SourceStore::new();
        store.merge("b", vec![photo("b1", 0.0)]).await;
        let token = CancellationToken::new();
        let enabled_first = set(&["a", "b"]);
        let enabled_second = set(&["a", "b"]);

        let first = store.commit_and_snapshot(
            vec![("a".to_string(), vec![photo("a1", 0.0)])],
            &enabled_first,
            &token,
        );
        let second = store.commit_and_snapshot(
            vec![("b".to_string(), vec![photo("b2", 0.0), photo("b3", 0.0)])],
            &enabled_second,
            &token,
        );
        let (first, second) = tokio::join!(first, second);

        // Whichever commit ran first must not see the other's write.
        let first: Vec<String> = first.unwrap().into_iter().map(|c| c.uid).collect();
        let second: Vec<String> = second.unwrap().into_iter().map(|c| c.uid).collect();
        let a_first = vec!["a:a1".to_string(), "b:b1".to_string()];
        let b_first = vec!["b:b2".to_string(), "b:b3".to_string()];
        let both = vec!["a:a1".to_string(), "b:b2".to_string(), "b:b3".to_string()];
        assert!(
            (first == a_first && second == both) || (second == b_first && first == both),
            "first = {:?}, second = {:?}",
            first,
            second
        );
        assert_eq!(store.photo_count().await, 3);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = SourceStore::new();
        let other = store.clone();
        other.merge("a", vec![photo("1", 0.0)]).await;
        assert_eq!(store.photo_count().await, 1);

        store.clear().await;
        assert_eq!(other.photo_count().await, 0);
    }
}

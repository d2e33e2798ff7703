//! In-memory photo catalog loader.
//!
//! Serves photos from a fixed catalog keyed by source id. Used by the CLI
//! to drive the orchestrator from a JSON fixture and by tests.
//!
//! # Catalog file format
//!
//! ```json
//! {
//!   "device": [ { "id": "1", "sourceId": "device", "coord": { "lat": 50.0, "lng": 14.0 }, "bearing": 90 } ],
//!   "mapillary": [ ... ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, trace};

use super::loader::{LoadError, LoadRequest, SourceLoader};
use crate::photo::Candidate;

/// How many photos are scanned between abort checks.
const ABORT_CHECK_INTERVAL: usize = 256;

/// Loader backed by a fixed set of photos per source.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoader {
    catalog: HashMap<String, Vec<Candidate>>,
}

impl CatalogLoader {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the photos served for a source.
    pub fn with_source(mut self, source_id: impl Into<String>, photos: Vec<Candidate>) -> Self {
        self.catalog.insert(source_id.into(), photos);
        self
    }

    /// Parses a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let catalog: HashMap<String, Vec<Candidate>> = serde_json::from_str(json)?;
        Ok(Self { catalog })
    }

    /// Reads a catalog from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path)?;
        let loader = Self::from_json(&contents)?;
        debug!(
            path = %path.display(),
            sources = loader.catalog.len(),
            photos = loader.photo_count(),
            "Loaded photo catalog"
        );
        Ok(loader)
    }

    /// Total photos across all sources.
    pub fn photo_count(&self) -> usize {
        self.catalog.values().map(Vec::len).sum()
    }

    /// Ids of the sources present in the catalog.
    pub fn source_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.catalog.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl SourceLoader for CatalogLoader {
    async fn load(&self, request: LoadRequest) -> Result<Vec<Candidate>, LoadError> {
        let Some(photos) = self.catalog.get(&request.source.id) else {
            trace!(source_id = %request.source.id, "Source not in catalog");
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        for (scanned, photo) in photos.iter().enumerate() {
            if scanned % ABORT_CHECK_INTERVAL == 0 {
                if request.should_abort() {
                    return Ok(Vec::new());
                }
                request.check_deadline()?;
                tokio::task::yield_now().await;
            }
            if !request.bounds.contains(&photo.coord) {
                continue;
            }
            found.push(photo.clone());
            if request.max_photos > 0 && found.len() >= request.max_photos {
                break;
            }
        }

        trace!(
            source_id = %request.source.id,
            found = found.len(),
            "Catalog lookup complete"
        );
        Ok(found)
    }
}

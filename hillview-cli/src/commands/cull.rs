//! Cull command - run both culling stages once over a catalog.
//!
//! Useful for tuning caps against real data without a UI attached. Prints a
//! single `photosUpdate` JSON message for the given viewport.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use hillview::culling::{AreaCuller, RangeCuller};
use hillview::geo::{Bounds, LatLng};
use hillview::message::OutboundMessage;
use hillview::photo::{Candidate, SourceConfig, SourceKind};
use hillview::source::{CatalogLoader, LoadRequest, NoAuth, SourceLoader};
use hillview::store::SourceStore;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Process id stamped on the printed update.
const CULL_PROCESS_ID: &str = "cull";

/// Arguments for the cull command.
pub struct CullArgs {
    pub catalog: Option<PathBuf>,
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub range: f64,
    pub max_photos: usize,
    pub max_range_photos: Option<usize>,
    pub center_lat: Option<f64>,
    pub center_lng: Option<f64>,
    pub debug: bool,
}

impl CullArgs {
    fn bounds(&self) -> Result<Bounds, CliError> {
        let bounds = Bounds::new(
            LatLng::new(self.north, self.west),
            LatLng::new(self.south, self.east),
        );
        bounds
            .validate()
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        Ok(bounds)
    }

    fn focal_point(&self, bounds: &Bounds) -> Result<LatLng, CliError> {
        match (self.center_lat, self.center_lng) {
            (Some(lat), Some(lng)) => {
                let center = LatLng::new(lat, lng);
                center
                    .validate()
                    .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
                Ok(center)
            }
            (None, None) => Ok(bounds.center()),
            _ => Err(CliError::InvalidArgument(
                "--center-lat and --center-lng must be given together".to_string(),
            )),
        }
    }
}

/// Run the cull command.
pub fn run(args: CullArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("cull");

    let bounds = args.bounds()?;
    let focal = args.focal_point(&bounds)?;
    if args.range.is_nan() || args.range < 0.0 {
        return Err(CliError::InvalidArgument(format!(
            "range must be a non-negative number of meters, got {}",
            args.range
        )));
    }

    let settings = runner.config().orchestrator_settings();
    let area_cap = if args.max_photos > 0 {
        args.max_photos
    } else {
        settings.max_area_photos
    };
    let range_cap = args.max_range_photos.unwrap_or(settings.max_range_photos);

    let loader = runner.load_catalog(args.catalog.as_deref())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let photos = runtime.block_on(collect(&loader, bounds))?;
    let loaded = photos.len();

    let cancel = CancellationToken::new();
    let area = AreaCuller::new(area_cap)
        .cull(photos, &bounds, &cancel)
        .map_err(|e| CliError::Cull(e.to_string()))?;
    let range = RangeCuller::new(range_cap)
        .cull(&area, &focal, args.range, &cancel)
        .map_err(|e| CliError::Cull(e.to_string()))?;

    info!(
        %bounds,
        loaded,
        in_area = area.len(),
        in_range = range.len(),
        "Cull complete"
    );

    let message = OutboundMessage::photos_update(CULL_PROCESS_ID, area, range);
    let json = message
        .to_json()
        .map_err(|e| CliError::Cull(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Loads every catalog source inside `bounds` through a store, so photos
/// get the same canonical form the orchestrator gives them.
async fn collect(loader: &CatalogLoader, bounds: Bounds) -> Result<Vec<Candidate>, CliError> {
    let store = SourceStore::new();
    let cancel = CancellationToken::new();

    for source_id in loader.source_ids() {
        let request = LoadRequest::new(
            SourceConfig::new(source_id.clone(), SourceKind::Stream),
            bounds,
            0,
            cancel.clone(),
            Arc::new(NoAuth),
        );
        let photos = loader
            .load(request)
            .await
            .map_err(|e| CliError::Cull(format!("source {}: {}", source_id, e)))?;
        store.merge(&source_id, photos).await;
    }

    let visible: HashSet<String> = store.source_ids().await.into_iter().collect();
    Ok(store.snapshot(&visible).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CullArgs {
        CullArgs {
            catalog: None,
            north: 50.1,
            west: 14.3,
            south: 50.0,
            east: 14.5,
            range: 500.0,
            max_photos: 0,
            max_range_photos: None,
            center_lat: None,
            center_lng: None,
            debug: false,
        }
    }

    #[test]
    fn test_focal_point_defaults_to_centre() {
        let args = args();
        let bounds = args.bounds().unwrap();
        let focal = args.focal_point(&bounds).unwrap();
        assert!((focal.lat - 50.05).abs() < 1e-9);
        assert!((focal.lng - 14.4).abs() < 1e-9);
    }

    #[test]
    fn test_half_a_centre_is_rejected() {
        let mut args = args();
        args.center_lat = Some(50.02);
        let bounds = args.bounds().unwrap();
        assert!(matches!(
            args.focal_point(&bounds),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_inverted_bounds_are_rejected() {
        let mut args = args();
        args.north = 49.0;
        assert!(matches!(args.bounds(), Err(CliError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_collect_merges_every_source() {
        let json = serde_json::json!({
            "device": [
                { "id": "1", "sourceId": "device", "coord": { "lat": 50.05, "lng": 14.4 }, "bearing": -90 },
                { "id": "2", "sourceId": "device", "coord": { "lat": 10.0, "lng": 10.0 } }
            ],
            "stream": [
                { "id": "1", "sourceId": "stream", "coord": { "lat": 50.06, "lng": 14.41 } }
            ]
        })
        .to_string();
        let loader = CatalogLoader::from_json(&json).unwrap();

        let photos = collect(&loader, args().bounds().unwrap()).await.unwrap();

        let uids: Vec<&str> = photos.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["device:1", "stream:1"]);
        assert_eq!(photos[0].bearing, 270.0);
    }
}

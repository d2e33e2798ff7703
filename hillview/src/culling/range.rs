//! Angular range culling.
//!
//! Picks a bounded set of photos around a focal point so that every compass
//! direction is represented: whichever way the viewer turns, there is
//! something to look at.
//!
//! # Algorithm
//!
//! 1. Keep candidates within `range` meters (haversine) and remember the
//!    distance.
//! 2. Drop survivors into 36 sectors of 10° by normalized bearing.
//! 3. Order each sector nearest first.
//! 4. Round-robin across non-empty sectors until the cap is reached.
//! 5. Sort the selection by bearing, uid breaking ties.

use std::cmp::Ordering;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::error::CullError;
use super::round_robin::round_robin;
use crate::geo::{distance_meters, LatLng};
use crate::photo::{Candidate, RangeCandidate};

/// Number of angular sectors.
pub const BUCKET_COUNT: usize = 36;

/// Width of each angular sector in degrees.
pub const BUCKET_WIDTH_DEG: f64 = 360.0 / BUCKET_COUNT as f64;

/// Sector index for a bearing, clamped to `0..BUCKET_COUNT`.
#[inline]
pub fn bucket_index(normalized_bearing: f64) -> usize {
    let index = (normalized_bearing / BUCKET_WIDTH_DEG).floor();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(BUCKET_COUNT - 1)
    }
}

/// Selects photos around a focal point with even angular coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCuller {
    max_photos: usize,
}

impl RangeCuller {
    /// Creates a culler that keeps at most `max_photos` candidates.
    pub fn new(max_photos: usize) -> Self {
        Self { max_photos }
    }

    /// Returns the configured cap.
    pub fn max_photos(&self) -> usize {
        self.max_photos
    }

    /// Culls `candidates` to those within `range_meters` of `focal`.
    ///
    /// # Errors
    ///
    /// Returns [`CullError::InvalidFocalPoint`] or [`CullError::InvalidRange`]
    /// for bad input and [`CullError::Cancelled`] if `cancel` fires.
    pub fn cull(
        &self,
        candidates: &[Candidate],
        focal: &LatLng,
        range_meters: f64,
        cancel: &CancellationToken,
    ) -> Result<Vec<RangeCandidate>, CullError> {
        focal.validate().map_err(CullError::InvalidFocalPoint)?;
        if !range_meters.is_finite() || range_meters < 0.0 {
            return Err(CullError::InvalidRange(range_meters));
        }
        if cancel.is_cancelled() {
            return Err(CullError::Cancelled);
        }

        let mut buckets: Vec<Vec<RangeCandidate>> = vec![Vec::new(); BUCKET_COUNT];
        let mut in_range = 0usize;

        for candidate in candidates {
            let distance = distance_meters(focal, &candidate.coord);
            if distance.is_nan() || distance > range_meters {
                continue;
            }
            let index = bucket_index(candidate.normalized_bearing());
            buckets[index].push(RangeCandidate {
                candidate: candidate.clone(),
                distance,
            });
            in_range += 1;
        }

        for bucket in buckets.iter_mut() {
            bucket.sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then_with(|| a.candidate.uid.cmp(&b.candidate.uid))
            });
        }

        let mut selected = round_robin(buckets, self.max_photos, cancel)?;
        sort_by_bearing(&mut selected);

        trace!(
            input = candidates.len(),
            in_range,
            selected = selected.len(),
            range_meters,
            "Range cull complete"
        );

        Ok(selected)
    }
}

/// Orders by ascending normalized bearing, uid breaking exact ties.
pub fn compare_by_bearing(a: &Candidate, b: &Candidate) -> Ordering {
    a.normalized_bearing()
        .total_cmp(&b.normalized_bearing())
        .then_with(|| a.uid.cmp(&b.uid))
}

/// Sorts a range set for presentation.
pub fn sort_by_bearing(photos: &mut [RangeCandidate]) {
    photos.sort_by(|a, b| compare_by_bearing(&a.candidate, &b.candidate));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, lat: f64, lng: f64, bearing: f64) -> Candidate {
        Candidate::new(id, "test", LatLng::new(lat, lng), bearing)
    }

    fn uids(photos: &[RangeCandidate]) -> Vec<&str> {
        photos.iter().map(|p| p.candidate.uid.as_str()).collect()
    }

    #[test]
    fn test_bucket_index_boundaries() {
        assert_eq!(bucket_index(0.0), 0);
        assert_eq!(bucket_index(9.999), 0);
        assert_eq!(bucket_index(10.0), 1);
        assert_eq!(bucket_index(359.999), 35);
        assert_eq!(bucket_index(360.0), 35);
        assert_eq!(bucket_index(-0.0), 0);
    }

    #[test]
    fn test_distance_filter_excludes_beyond_range() {
        let origin = LatLng::new(0.0, 0.0);
        let photos = vec![photo("near", 0.0, 0.0, 0.0), photo("far", 0.0, 0.01, 90.0)];
        let culler = RangeCuller::new(10);
        let cancel = CancellationToken::new();

        let within_1000 = culler.cull(&photos, &origin, 1000.0, &cancel).unwrap();
        assert_eq!(uids(&within_1000), vec!["test:near"]);

        let within_1200 = culler.cull(&photos, &origin, 1200.0, &cancel).unwrap();
        assert_eq!(uids(&within_1200), vec!["test:near", "test:far"]);

        let far = within_1200
            .iter()
            .find(|p| p.candidate.id == "far")
            .unwrap();
        assert!((far.distance - 1111.95).abs() < 0.5);
    }

    #[test]
    fn test_every_direction_before_seconds() {
        // Ten photos facing north, one east, one south, one west
        let mut photos: Vec<Candidate> = (0..10)
            .map(|i| photo(&format!("n{}", i), 0.0, 0.0001 * i as f64, 5.0))
            .collect();
        photos.push(photo("e", 0.0, 0.0, 95.0));
        photos.push(photo("s", 0.0, 0.0, 185.0));
        photos.push(photo("w", 0.0, 0.0, 275.0));

        let culler = RangeCuller::new(5);
        let picked = culler
            .cull(&photos, &LatLng::new(0.0, 0.0), 5_000.0, &CancellationToken::new())
            .unwrap();

        assert_eq!(picked.len(), 5);
        let ids: Vec<&str> = picked.iter().map(|p| p.candidate.id.as_str()).collect();
        assert!(ids.contains(&"e"));
        assert!(ids.contains(&"s"));
        assert!(ids.contains(&"w"));
        // Nearest northern photos go first
        assert!(ids.contains(&"n0"));
        assert!(ids.contains(&"n1"));
    }

    #[test]
    fn test_five_three_one_sectors_cap_six() {
        let mut photos = Vec::new();
        for i in 0..5 {
            photos.push(photo(&format!("a{}", i), 0.0, 0.00001 * i as f64, 1.0));
        }
        for i in 0..3 {
            photos.push(photo(&format!("b{}", i), 0.0, 0.00001 * i as f64, 101.0));
        }
        photos.push(photo("c0", 0.0, 0.0, 201.0));

        let picked = RangeCuller::new(6)
            .cull(&photos, &LatLng::new(0.0, 0.0), 1_000.0, &CancellationToken::new())
            .unwrap();

        let ids: Vec<&str> = picked.iter().map(|p| p.candidate.id.as_str()).collect();
        // Sorted by bearing for presentation; within a sector by uid
        assert_eq!(ids, vec!["a0", "a1", "a2", "b0", "b1", "c0"]);
    }

    #[test]
    fn test_cap_above_population_returns_all() {
        let photos: Vec<Candidate> = (0..7)
            .map(|i| photo(&format!("p{}", i), 0.0, 0.0, 50.0 * i as f64))
            .collect();
        let picked = RangeCuller::new(1000)
            .cull(&photos, &LatLng::new(0.0, 0.0), 10.0, &CancellationToken::new())
            .unwrap();
        assert_eq!(picked.len(), 7);
    }

    #[test]
    fn test_nothing_in_range_returns_empty() {
        let photos = vec![photo("far", 10.0, 10.0, 0.0)];
        let picked = RangeCuller::new(10)
            .cull(&photos, &LatLng::new(0.0, 0.0), 100.0, &CancellationToken::new())
            .unwrap();
        assert!(picked.is_empty());
    }

    #[test]
    fn test_equal_bearing_ties_break_on_uid() {
        let mut photos = vec![
            RangeCandidate {
                candidate: photo("x", 0.0, 0.0, 90.0).with_uid("b"),
                distance: 0.0,
            },
            RangeCandidate {
                candidate: photo("y", 0.0, 0.0, 90.0).with_uid("a"),
                distance: 0.0,
            },
        ];
        sort_by_bearing(&mut photos);
        assert_eq!(uids(&photos), vec!["a", "b"]);
    }

    #[test]
    fn test_negative_bearing_is_bucketed_after_normalization() {
        let photos = vec![photo("west", 0.0, 0.0, -90.0), photo("east", 0.0, 0.0, 90.0)];
        let picked = RangeCuller::new(2)
            .cull(&photos, &LatLng::new(0.0, 0.0), 1.0, &CancellationToken::new())
            .unwrap();
        let ids: Vec<&str> = picked.iter().map(|p| p.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["east", "west"]);
    }

    #[test]
    fn test_invalid_range_and_focal_point() {
        let culler = RangeCuller::new(1);
        let cancel = CancellationToken::new();
        assert_eq!(
            culler.cull(&[], &LatLng::new(0.0, 0.0), -1.0, &cancel),
            Err(CullError::InvalidRange(-1.0))
        );
        assert!(matches!(
            culler.cull(&[], &LatLng::new(0.0, 0.0), f64::NAN, &cancel),
            Err(CullError::InvalidRange(_))
        ));
        assert!(matches!(
            culler.cull(&[], &LatLng::new(100.0, 0.0), 1.0, &cancel),
            Err(CullError::InvalidFocalPoint(_))
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = RangeCuller::new(1).cull(
            &[photo("a", 0.0, 0.0, 0.0)],
            &LatLng::new(0.0, 0.0),
            1.0,
            &cancel,
        );
        assert_eq!(result, Err(CullError::Cancelled));
    }
}

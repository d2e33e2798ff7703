//! Spatial grid culling.
//!
//! When a viewport holds more photos than the area cap, the viewport is cut
//! into a square grid and photos are drawn one cell at a time so that the
//! result covers the map instead of piling up in the densest spot.
//!
//! The grid side is `ceil(sqrt(max_photos))`, giving roughly one cell per
//! photo slot. Photos outside the viewport are clamped into the nearest edge
//! cell rather than dropped.

use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::error::CullError;
use super::round_robin::round_robin;
use crate::geo::{Bounds, LatLng};
use crate::photo::Candidate;

/// Selects photos spread across a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaCuller {
    max_photos: usize,
}

impl AreaCuller {
    /// Creates a culler that keeps at most `max_photos` candidates.
    pub fn new(max_photos: usize) -> Self {
        Self { max_photos }
    }

    /// Returns the configured cap.
    pub fn max_photos(&self) -> usize {
        self.max_photos
    }

    /// Number of cells along each side of the grid.
    pub fn grid_side(&self) -> usize {
        ((self.max_photos as f64).sqrt().ceil() as usize).max(1)
    }

    /// Culls `candidates` to at most `max_photos`, spread across `bounds`.
    ///
    /// If the input already fits under the cap it is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CullError::InvalidBounds`] if `bounds` is not a valid
    /// rectangle and [`CullError::Cancelled`] if `cancel` fires.
    pub fn cull(
        &self,
        candidates: Vec<Candidate>,
        bounds: &Bounds,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>, CullError> {
        if cancel.is_cancelled() {
            return Err(CullError::Cancelled);
        }
        if candidates.len() <= self.max_photos {
            return Ok(candidates);
        }
        bounds.validate().map_err(CullError::InvalidBounds)?;

        let side = self.grid_side();
        let input = candidates.len();
        let mut cells: Vec<Vec<Candidate>> = vec![Vec::new(); side * side];
        for candidate in candidates {
            let (row, col) = cell_of(bounds, side, &candidate.coord);
            cells[row * side + col].push(candidate);
        }
        let occupied = cells.iter().filter(|c| !c.is_empty()).count();

        let selected = round_robin(cells, self.max_photos, cancel)?;

        trace!(
            input,
            side,
            occupied,
            selected = selected.len(),
            "Area cull complete"
        );

        Ok(selected)
    }
}

/// Grid cell `(row, col)` for a coordinate; row 0 is the northern edge.
fn cell_of(bounds: &Bounds, side: usize, point: &LatLng) -> (usize, usize) {
    let last = side - 1;

    let lat_span = bounds.lat_span();
    let row = if lat_span > 0.0 && point.lat.is_finite() {
        let fraction = (bounds.top_left.lat - point.lat) / lat_span;
        scale(fraction, side)
    } else {
        0
    };

    let lng_span = bounds.lng_span();
    let col = if !point.lng.is_finite() {
        0
    } else {
        let offset = (point.lng - bounds.top_left.lng).rem_euclid(360.0);
        if offset <= lng_span {
            if lng_span > 0.0 {
                scale(offset / lng_span, side)
            } else {
                0
            }
        } else {
            // Outside the viewport: clamp to whichever edge is closer
            let east_gap = offset - lng_span;
            let west_gap = 360.0 - offset;
            if east_gap <= west_gap {
                last
            } else {
                0
            }
        }
    };

    (row, col)
}

/// Maps a fraction of the span onto a cell index in `0..side`.
#[inline]
fn scale(fraction: f64, side: usize) -> usize {
    let index = (fraction * side as f64).floor();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(side - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds::new(LatLng::new(10.0, 0.0), LatLng::new(0.0, 10.0))
    }

    fn photo(id: &str, lat: f64, lng: f64) -> Candidate {
        Candidate::new(id, "test", LatLng::new(lat, lng), 0.0)
    }

    #[test]
    fn test_grid_side() {
        assert_eq!(AreaCuller::new(0).grid_side(), 1);
        assert_eq!(AreaCuller::new(1).grid_side(), 1);
        assert_eq!(AreaCuller::new(4).grid_side(), 2);
        assert_eq!(AreaCuller::new(5).grid_side(), 3);
        assert_eq!(AreaCuller::new(400).grid_side(), 20);
    }

    #[test]
    fn test_pass_through_when_under_cap() {
        let photos = vec![photo("a", 1.0, 1.0), photo("b", 1.0, 1.0), photo("c", 9.0, 9.0)];
        let result = AreaCuller::new(3)
            .cull(photos.clone(), &bounds(), &CancellationToken::new())
            .unwrap();
        assert_eq!(result, photos);
    }

    #[test]
    fn test_pass_through_skips_bounds_validation() {
        let inverted = Bounds::new(LatLng::new(0.0, 0.0), LatLng::new(10.0, 10.0));
        let photos = vec![photo("a", 1.0, 1.0)];
        let result = AreaCuller::new(5).cull(photos.clone(), &inverted, &CancellationToken::new());
        assert_eq!(result, Ok(photos));
    }

    #[test]
    fn test_cluster_does_not_starve_other_cells() {
        // 50 photos in the north-west corner, one in each other quadrant
        let mut photos: Vec<Candidate> = (0..50)
            .map(|i| photo(&format!("nw{}", i), 9.9, 0.1 + i as f64 * 0.001))
            .collect();
        photos.push(photo("ne", 9.0, 9.0));
        photos.push(photo("sw", 1.0, 1.0));
        photos.push(photo("se", 1.0, 9.0));

        let result = AreaCuller::new(4)
            .cull(photos, &bounds(), &CancellationToken::new())
            .unwrap();

        assert_eq!(result.len(), 4);
        let ids: Vec<&str> = result.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["nw0", "ne", "sw", "se"]);
    }

    #[test]
    fn test_result_never_exceeds_cap() {
        let photos: Vec<Candidate> = (0..1000)
            .map(|i| photo(&format!("p{}", i), (i % 10) as f64, (i / 100) as f64))
            .collect();
        let result = AreaCuller::new(37)
            .cull(photos, &bounds(), &CancellationToken::new())
            .unwrap();
        assert_eq!(result.len(), 37);
    }

    #[test]
    fn test_out_of_bounds_clamped_to_nearest_edge() {
        let b = bounds();
        assert_eq!(cell_of(&b, 2, &LatLng::new(20.0, 5.0)), (0, 1));
        assert_eq!(cell_of(&b, 2, &LatLng::new(-20.0, 5.0)), (1, 1));
        assert_eq!(cell_of(&b, 2, &LatLng::new(5.0, -1.0)), (1, 0));
        assert_eq!(cell_of(&b, 2, &LatLng::new(5.0, 11.0)), (1, 1));
    }

    #[test]
    fn test_cells_across_antimeridian() {
        let b = Bounds::new(LatLng::new(10.0, 170.0), LatLng::new(0.0, -170.0));
        assert_eq!(cell_of(&b, 2, &LatLng::new(9.0, 175.0)), (0, 0));
        assert_eq!(cell_of(&b, 2, &LatLng::new(9.0, -175.0)), (0, 1));
    }

    #[test]
    fn test_degenerate_bounds_use_single_cell() {
        let point = Bounds::new(LatLng::new(5.0, 5.0), LatLng::new(5.0, 5.0));
        let photos: Vec<Candidate> = (0..5).map(|i| photo(&format!("p{}", i), 5.0, 5.0)).collect();
        let result = AreaCuller::new(2)
            .cull(photos, &point, &CancellationToken::new())
            .unwrap();
        let ids: Vec<&str> = result.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1"]);
    }

    #[test]
    fn test_invalid_bounds_rejected_when_culling() {
        let inverted = Bounds::new(LatLng::new(0.0, 0.0), LatLng::new(10.0, 10.0));
        let photos = vec![photo("a", 1.0, 1.0), photo("b", 2.0, 2.0)];
        let result = AreaCuller::new(1).cull(photos, &inverted, &CancellationToken::new());
        assert!(matches!(result, Err(CullError::InvalidBounds(_))));
    }
}

//! Culling stages that bound the number of photos sent to the map.
//!
//! Two independent fairness criteria are applied one after the other:
//!
//! ```text
//!   merged candidates
//!          │
//!          ▼
//!   ┌──────────────┐   more than the area cap?
//!   │  AreaCuller  │   grid over the viewport, one photo per cell per round
//!   └──────┬───────┘
//!          │  photos in area
//!          ▼
//!   ┌──────────────┐   within range of the focal point,
//!   │ RangeCuller  │   one photo per 10° sector per round
//!   └──────┬───────┘
//!          │  photos in range
//!          ▼
//! ```
//!
//! Both stages share [`round_robin`] and take a [`CancellationToken`] so an
//! aborted job stops mid-selection.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod area;
mod error;
mod range;
mod round_robin;

pub use area::AreaCuller;
pub use error::CullError;
pub use range::{
    bucket_index, compare_by_bearing, sort_by_bearing, RangeCuller, BUCKET_COUNT,
    BUCKET_WIDTH_DEG,
};
pub use round_robin::round_robin;

//! Photo source loading.
//!
//! [`SourceLoader`] is the seam between the orchestrator and whatever
//! backend actually holds the photos. [`CatalogLoader`] serves a fixed
//! catalog and [`TimeoutLoader`] bounds any loader with a deadline.

mod catalog;
mod loader;
mod timeout;

pub use catalog::CatalogLoader;
pub use loader::{AuthTokenProvider, LoadError, LoadRequest, NoAuth, SourceLoader};
pub use timeout::TimeoutLoader;

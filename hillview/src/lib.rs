//! Hillview - photo culling and job orchestration for a map photo browser
//!
//! This library decides which photos a map view shows. It loads candidate
//! photos from any number of sources, keeps a fair and bounded subset for
//! the visible area, picks the photos nearest to the view's focal point,
//! and publishes the result as JSON messages.
//!
//! # High-Level API
//!
//! The [`orchestrator`] module is the entry point:
//!
//! ```ignore
//! use hillview::orchestrator::{Orchestrator, OrchestratorSettings};
//! use hillview::publisher::UpdatePublisher;
//! use hillview::source::CatalogLoader;
//!
//! let (publisher, mut updates) = UpdatePublisher::channel();
//! let loader = CatalogLoader::from_file(&catalog_path)?;
//! let orchestrator = Orchestrator::new(loader, publisher, OrchestratorSettings::default());
//!
//! orchestrator.handle_message(&line).await?;
//! while let Some(update) = updates.recv().await {
//!     println!("{}", update.to_json()?);
//! }
//! ```

pub mod config;
pub mod culling;
pub mod geo;
pub mod logging;
pub mod message;
pub mod orchestrator;
pub mod photo;
pub mod publisher;
pub mod source;
pub mod store;

pub use orchestrator::{Orchestrator, OrchestratorSettings};

/// Version of the hillview library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

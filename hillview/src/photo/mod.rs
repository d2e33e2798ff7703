//! Photo records and source configuration.
//!
//! [`Candidate`] is the unit every other module moves around: loaders
//! produce them, the store accumulates them per source, the culling stages
//! select among them and the publisher ships them to the UI.

mod types;

pub use types::{derive_uid, Candidate, ImageSize, RangeCandidate, SourceConfig, SourceKind};

//! faceprint-core — Face profile measurement, comparison and matching.
//!
//! Builds profiles from an image plus externally detected 68-point landmarks
//! and an identity embedding, measures image artifacts, and compares profiles
//! by embedding distance and per-region shape distance (Procrustes, DTW,
//! Hausdorff).

pub mod adapter;
pub mod annotate;
pub mod artifacts;
pub mod description;
pub mod distance;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod regions;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use adapter::{AdapterError, FaceEmbedder, LandmarkDetector};
pub use distance::{DistanceError, ShapeMetric};
pub use engine::ProfileEngine;
pub use error::{Lookup, ProfileError};
pub use regions::Region;
pub use store::{ProfileStore, StoreError};
pub use types::{
    ArtifactDistance, Artifacts, Embedding, LandmarkError, Landmarks, Point, Profile,
    ProfileComparison, ProfileDistance, ProfileMatch,
};

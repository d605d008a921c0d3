//! Seams for the external landmark detector and embedding model.
//!
//! Both models are black boxes to this crate. Production code plugs in a real
//! backend; tests plug in fakes returning fixed landmarks and embeddings.

use crate::types::{Embedding, Landmarks};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("landmark detection failed: {0}")]
    DetectionFailed(String),
    #[error("embedding extraction failed: {0}")]
    EmbeddingFailed(String),
}

/// 68-point landmark detector.
pub trait LandmarkDetector {
    /// Landmarks of the first detected face, or `None` when no face is found.
    fn detect(&mut self, image: &DynamicImage) -> Result<Option<Landmarks>, AdapterError>;
}

/// Face embedding model.
pub trait FaceEmbedder {
    /// One embedding per detected face, possibly none.
    fn embed(&mut self, image: &DynamicImage) -> Result<Vec<Embedding>, AdapterError>;
}

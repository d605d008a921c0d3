use crate::adapter::AdapterError;
use crate::distance::DistanceError;
use crate::store::StoreError;
use crate::types::LandmarkError;
use std::fmt;
use thiserror::Error;

/// What a failed profile lookup was searching by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Id(u64),
    Embedding,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Id(id) => write!(f, "no profile with id {id}"),
            Lookup::Embedding => f.write_str("no profile with an identical embedding"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("no face detected")]
    NoFaceDetected,
    #[error("profile not found: {0}")]
    ProfileNotFound(Lookup),
    #[error("no matching profile found")]
    NoMatchFound,
    #[error(
        "invalid feature {0:?}: expected one of left_eyebrow, right_eyebrow, left_eye, right_eye, nose, mouth, jaw"
    )]
    InvalidFeature(String),
    #[error("landmarks: {0}")]
    Landmarks(#[from] LandmarkError),
    #[error("distance: {0}")]
    Distance(#[from] DistanceError),
    #[error("adapter: {0}")]
    Adapter(#[from] AdapterError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

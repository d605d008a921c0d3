//! Nearest-profile search and profile-to-profile comparison.
//!
//! Everything here is a pure function of its inputs; the gallery is a
//! borrowed slice, normally a read-locked view of the profile store.

use crate::distance::{dtw_distance, procrustes_disparity, DistanceError};
use crate::error::{Lookup, ProfileError};
use crate::regions::Region;
use crate::types::{
    ArtifactDistance, Embedding, Point, Profile, ProfileComparison, ProfileDistance,
};

/// Strategy for scoring a stored profile against a query. Lower is closer.
pub trait Matcher {
    fn distance(&self, candidate: &Profile) -> Result<f64, ProfileError>;
}

/// Euclidean distance between embeddings.
pub struct EmbeddingMatcher<'a> {
    pub query: &'a Embedding,
}

impl Matcher for EmbeddingMatcher<'_> {
    fn distance(&self, candidate: &Profile) -> Result<f64, ProfileError> {
        embedding_distance(self.query, &candidate.embedding)
    }
}

/// Shape distance of a single landmark region, using the region's metric.
pub struct FeatureMatcher<'a> {
    pub region: Region,
    pub shape: &'a [Point],
}

impl Matcher for FeatureMatcher<'_> {
    fn distance(&self, candidate: &Profile) -> Result<f64, ProfileError> {
        let stored = candidate.landmarks.region(self.region);
        Ok(self.region.metric().distance(self.shape, stored)?)
    }
}

fn embedding_distance(a: &Embedding, b: &Embedding) -> Result<f64, ProfileError> {
    if a.dim() != b.dim() {
        return Err(DistanceError::DimensionMismatch {
            left: a.dim(),
            right: b.dim(),
        }
        .into());
    }
    Ok(a.euclidean_distance(b) as f64)
}

/// Scan the gallery for the minimum-distance profile.
///
/// Ties keep the earliest profile in gallery order. An empty gallery yields
/// [`ProfileError::NoMatchFound`]; any scoring error aborts the scan.
pub fn nearest<'g, M: Matcher + ?Sized>(
    matcher: &M,
    gallery: &'g [Profile],
) -> Result<(&'g Profile, f64), ProfileError> {
    let mut best: Option<(&Profile, f64)> = None;

    for profile in gallery {
        let distance = matcher.distance(profile)?;
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((profile, distance));
        }
    }

    let (profile, distance) = best.ok_or(ProfileError::NoMatchFound)?;
    tracing::debug!(
        candidates = gallery.len(),
        id = ?profile.id,
        distance,
        "nearest profile"
    );
    Ok((profile, distance))
}

/// Closest stored profile by embedding distance.
pub fn match_embedding<'g>(
    query: &Embedding,
    gallery: &'g [Profile],
) -> Result<(&'g Profile, f64), ProfileError> {
    nearest(&EmbeddingMatcher { query }, gallery)
}

/// Closest stored profile by the shape of one region.
pub fn match_feature<'g>(
    region: Region,
    shape: &[Point],
    gallery: &'g [Profile],
) -> Result<(&'g Profile, f64), ProfileError> {
    nearest(&FeatureMatcher { region, shape }, gallery)
}

/// First stored profile whose embedding is elementwise equal to `query`.
pub fn find_exact<'g>(
    query: &Embedding,
    gallery: &'g [Profile],
) -> Result<&'g Profile, ProfileError> {
    gallery
        .iter()
        .find(|profile| profile.embedding.is_identical(query))
        .ok_or(ProfileError::ProfileNotFound(Lookup::Embedding))
}

/// Sum a region's shape distance over both sides of the face.
fn paired(
    a: &Profile,
    b: &Profile,
    left: Region,
    right: Region,
) -> Result<f64, DistanceError> {
    let side = |region: Region| {
        region
            .metric()
            .distance(a.landmarks.region(region), b.landmarks.region(region))
    };
    Ok(side(left)? + side(right)?)
}

/// Per-channel distance record between two profiles.
pub fn profile_distance(a: &Profile, b: &Profile) -> Result<ProfileDistance, ProfileError> {
    Ok(ProfileDistance {
        embedding: embedding_distance(&a.embedding, &b.embedding)?,
        artifacts: ArtifactDistance::between(&a.artifacts, &b.artifacts),
        eyebrows: paired(a, b, Region::LeftEyebrow, Region::RightEyebrow)?,
        eyes: paired(a, b, Region::LeftEye, Region::RightEye)?,
        nose: procrustes_disparity(
            a.landmarks.region(Region::Nose),
            b.landmarks.region(Region::Nose),
        )?,
        mouth: procrustes_disparity(
            a.landmarks.region(Region::Mouth),
            b.landmarks.region(Region::Mouth),
        )?,
        jaw: dtw_distance(
            a.landmarks.region(Region::Jaw),
            b.landmarks.region(Region::Jaw),
        )?,
    })
}

/// Full distance record against every stored profile, in gallery order.
pub fn scan_distances(
    query: &Profile,
    gallery: &[Profile],
) -> Result<Vec<ProfileComparison>, ProfileError> {
    if gallery.is_empty() {
        return Err(ProfileError::NoMatchFound);
    }
    gallery
        .iter()
        .map(|stored| {
            Ok(ProfileComparison {
                profile_id: stored.id,
                description: stored.description.clone(),
                distance: profile_distance(query, stored)?,
            })
        })
        .collect()
}
